use console::{strip_ansi_codes, Term};
use fdportal_protocol::api::{CustomerSummary, FdCalculation, Investment};
use owo_colors::OwoColorize;
use std::time::Duration;
use unicode_width::UnicodeWidthStr;

use crate::route::SessionState;

/// Colour of a one-line message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Success,
    Failure,
    Warning,
    Info,
}

/// Terminal rendering
pub struct UI {
    term: Term,
    color: bool,
}

impl UI {
    pub fn new() -> Self {
        let term = Term::stdout();
        let color = term.features().colors_supported();
        Self { term, color }
    }

    fn paint(&self, tone: Tone, text: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        match tone {
            Tone::Success => text.green().bold().to_string(),
            Tone::Failure => text.red().bold().to_string(),
            Tone::Warning => text.yellow().bold().to_string(),
            Tone::Info => text.blue().to_string(),
        }
    }

    pub fn success(&self, message: &str) {
        println!("{}", self.paint(Tone::Success, message));
    }

    /// Errors go to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{}", self.paint(Tone::Failure, message));
    }

    pub fn warning(&self, message: &str) {
        println!("{}", self.paint(Tone::Warning, message));
    }

    pub fn info(&self, message: &str) {
        println!("{}", self.paint(Tone::Info, message));
    }

    /// "Logged in as ..." or "Not logged in"
    pub fn format_session_state(&self, state: SessionState) -> String {
        let text = match state {
            SessionState::Active(role) => format!("Logged in as {}", role.label()),
            SessionState::Anonymous => "Not logged in".to_string(),
        };
        match (self.color, state) {
            (false, _) => text,
            (true, SessionState::Active(_)) => text.green().to_string(),
            (true, SessionState::Anonymous) => text.red().to_string(),
        }
    }

    pub fn format_user_field(&self, value: Option<String>) -> String {
        value.unwrap_or_else(|| "-".to_string())
    }

    /// Page title between blank lines
    pub fn header(&self, title: &str) {
        let banner = format!("=== {} ===", title);
        println!();
        if self.color {
            println!("{}", banner.cyan().bold());
        } else {
            println!("{}", banner);
        }
        println!();
    }

    /// Boxed list of label/value rows
    pub fn card(&self, title: &str, rows: Vec<(&str, String)>) {
        let inner = self.width().saturating_sub(6).clamp(CARD_MIN, CARD_MAX);
        let title = if self.color {
            title.cyan().bold().to_string()
        } else {
            title.to_string()
        };
        for line in card_lines(&title, &rows, inner) {
            println!("{}", line);
        }
        println!();
    }

    /// Result card for a maturity projection
    pub fn calculation(&self, calculation: &FdCalculation) {
        self.card(
            "FD Calculation",
            vec![
                ("Maturity amount", format_amount(calculation.maturity_amount)),
                ("Interest earned", format_amount(calculation.interest_earned)),
            ],
        );
    }

    /// Confirmation card for a booked deposit
    pub fn investment(&self, investment: &Investment) {
        let mut content = vec![
            ("Principal", format_amount(investment.principal)),
            ("Rate", format!("{}%", investment.rate)),
            ("Tenure", format!("{} months", investment.tenure_in_months)),
            ("Maturity amount", format_amount(investment.maturity_amount)),
        ];
        if let Some(created_at) = &investment.created_at {
            content.push(("Created", created_at.clone()));
        }
        self.card("FD Investment", content);
    }

    /// Every customer with their deposits underneath
    pub fn customer_table(&self, customers: &[CustomerSummary]) {
        if customers.is_empty() {
            self.info("No customers found.");
            return;
        }

        let rule = "-".repeat(self.width().clamp(CARD_MIN, CARD_MAX));
        if self.color {
            println!("{}", rule.dimmed());
        } else {
            println!("{}", rule);
        }

        for line in customer_table_lines(customers) {
            match line {
                TableLine::Customer(text) if self.color => println!("{}", text.bold()),
                TableLine::Heading(text) if self.color => println!("{}", text.dimmed()),
                TableLine::Customer(text)
                | TableLine::Heading(text)
                | TableLine::Row(text) => println!("{}", text),
            }
        }
        println!();
    }

    fn width(&self) -> usize {
        self.term.size().1 as usize
    }
}

impl Default for UI {
    fn default() -> Self {
        Self::new()
    }
}

/// Rupee amount with two decimals
pub fn format_amount(amount: f64) -> String {
    format!("₹{:.2}", amount)
}

/// `1m 05s` style countdown
pub fn format_remaining(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    format!("{}m {:02}s", secs / 60, secs % 60)
}

const CARD_MIN: usize = 44;
const CARD_MAX: usize = 72;

// `inner` is the width between the two side borders. Widths ignore ANSI codes.
fn card_lines(title: &str, rows: &[(&str, String)], inner: usize) -> Vec<String> {
    let label_width = rows.iter().map(|(label, _)| label.width()).max().unwrap_or(0);
    let title_width = strip_ansi_codes(title).width();

    let mut lines = vec![format!(
        "+- {} {}+",
        title,
        "-".repeat(inner.saturating_sub(title_width + 3))
    )];
    for (label, value) in rows {
        let used = label_width + 2 + strip_ansi_codes(value).width();
        lines.push(format!(
            "| {}  {}{} |",
            pad(label, label_width),
            value,
            " ".repeat(inner.saturating_sub(used + 2))
        ));
    }
    lines.push(format!("+{}+", "-".repeat(inner)));
    lines
}

#[derive(Debug, PartialEq)]
enum TableLine {
    Customer(String),
    Heading(String),
    Row(String),
}

const COLUMNS: [&str; 5] = ["Principal", "Rate", "Tenure", "Maturity", "Created"];

fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{}{}", text, " ".repeat(fill))
}

fn customer_table_lines(customers: &[CustomerSummary]) -> Vec<TableLine> {
    let mut lines = Vec::new();

    for customer in customers {
        lines.push(TableLine::Customer(format!(
            "{} <{}>  total {}",
            customer.username,
            customer.email,
            format_amount(customer.total_investment)
        )));

        if customer.investments.is_empty() {
            lines.push(TableLine::Row("  (no investments)".to_string()));
            continue;
        }

        let rows: Vec<[String; 5]> = customer
            .investments
            .iter()
            .map(|inv| {
                [
                    format_amount(inv.principal),
                    format!("{}%", inv.rate),
                    format!("{}m", inv.tenure_in_months),
                    format_amount(inv.maturity_amount),
                    inv.created_at.clone().unwrap_or_else(|| "-".to_string()),
                ]
            })
            .collect();

        let widths: Vec<usize> = (0..COLUMNS.len())
            .map(|i| {
                rows.iter()
                    .map(|row| row[i].width())
                    .chain(std::iter::once(COLUMNS[i].width()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let render = |cells: Vec<&str>| {
            let padded: Vec<String> = cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| pad(cell, *width))
                .collect();
            format!("  {}", padded.join("  ").trim_end())
        };

        lines.push(TableLine::Heading(render(COLUMNS.to_vec())));
        for row in &rows {
            lines.push(TableLine::Row(render(row.iter().map(String::as_str).collect())));
        }
    }

    lines
}
