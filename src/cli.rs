use crate::client::{FdApi, HttpClient};
use crate::clock::{Clock, SystemClock};
use crate::config::{default_config_path, ClientConfig};
use crate::error::{FdError, Result};
use crate::inactivity::ActivityKind;
use crate::portal::{Outcome, Page, Portal, View, INVALID_FD_INPUT};
use crate::route::{Route, SessionState};
use crate::session::SessionStore;
use crate::store::{CredentialStorage, FileStorage, TokenStoreConfig};
use crate::supervisor::SessionSupervisor;
use crate::ui::{format_amount, format_remaining, UI};
use crate::version::format_version_info;
use crate::{Commands, ConfigCommand, FdArgs};
use fdportal_protocol::api::FdRequest;
use fdportal_protocol::Role;
use std::future::Future;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

/// Redirect chains are short; `/` to a dashboard to `/login` is the longest.
const MAX_REDIRECTS: usize = 4;

type AppPortal = Portal<HttpClient, FileStorage, SystemClock>;

/// CLI handler for processing commands
pub struct CliHandler {
    config: ClientConfig,
    config_path: Option<PathBuf>,
    portal: AppPortal,
    ui: UI,
}

impl CliHandler {
    /// Build the portal and pick up a persisted session
    pub fn new(config: ClientConfig, config_path: Option<PathBuf>) -> Result<Self> {
        let client = HttpClient::new(config.clone())?;
        let storage = FileStorage::new(config.token_storage.clone().into())?;
        let store = SessionStore::new(storage, SystemClock);
        let mut portal = Portal::new(client, SessionSupervisor::new(store));

        let state = portal.start();
        debug!(?state, "portal started");

        Ok(Self {
            config,
            config_path,
            portal,
            ui: UI::new(),
        })
    }

    /// Execute a CLI command
    pub async fn execute(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::Login(args) => {
                self.handle_login(&args.username, args.password, args.role.into())
                    .await
            }
            Commands::Register(args) => {
                self.handle_register(&args.username, &args.email, args.password, args.role.into())
                    .await
            }
            Commands::Logout => self.handle_logout(),
            Commands::Status => self.handle_status(),
            Commands::Open(args) => self.show(&args.path).await,
            Commands::Dashboard => self.show(Route::Root.path()).await,
            Commands::Calculate(args) => self.handle_calculate(fd_request(&args)).await,
            Commands::Invest(args) => self.handle_invest(fd_request(&args)).await,
            Commands::Shell => self.run_shell().await,
            Commands::Config(args) => match args.command {
                ConfigCommand::Show => self.handle_config_show(),
            },
        }
    }

    /// Handle login command
    async fn handle_login(
        &mut self,
        username: &str,
        password: Option<String>,
        role: Role,
    ) -> Result<()> {
        let password = match password {
            Some(password) => password,
            None => dialoguer::Password::new()
                .with_prompt("Password")
                .interact()?,
        };

        let landing = self.portal.login(username, &password, role).await?;
        self.ui.success(&format!("Logged in as {}", username));
        self.show(landing.path()).await
    }

    /// Handle register command
    async fn handle_register(
        &mut self,
        username: &str,
        email: &str,
        password: Option<String>,
        role: Role,
    ) -> Result<()> {
        let password = match password {
            Some(password) => password,
            None => dialoguer::Password::new()
                .with_prompt("Password")
                .with_confirmation("Confirm password", "Passwords do not match")
                .interact()?,
        };

        let next = self.portal.register(username, email, &password, role).await?;
        self.ui.success("Registration successful. Please log in.");
        self.show(next.path()).await
    }

    /// Handle logout command
    fn handle_logout(&mut self) -> Result<()> {
        self.portal.logout();
        self.ui.success("Logged out");
        Ok(())
    }

    /// Handle status command
    fn handle_status(&self) -> Result<()> {
        let status = self.portal.status();

        let mut content = vec![
            ("Version", format_version_info()),
            ("Session", self.ui.format_session_state(status.state)),
        ];

        if let SessionState::Active(_) = status.state {
            content.push(("User", self.ui.format_user_field(status.subject)));
            content.push((
                "Expires",
                self.ui
                    .format_user_field(status.expires_at.and_then(format_timestamp)),
            ));
            if let Some(remaining) = status.idle_remaining {
                content.push(("Idle timeout in", format_remaining(remaining)));
            }
        }

        content.push(("Server", self.config.base_url.clone()));
        self.ui.card("Status", content);
        Ok(())
    }

    /// Handle calculate command
    async fn handle_calculate(&mut self, request: FdRequest) -> Result<()> {
        let calculation = self.portal.calculate(request).await?;
        self.ui.calculation(&calculation);
        Ok(())
    }

    /// Handle invest command
    async fn handle_invest(&mut self, request: FdRequest) -> Result<()> {
        match self.portal.invest(request).await? {
            Outcome::Ready(investment) => {
                self.ui.success("FD investment successful");
                self.ui.investment(&investment);
                Ok(())
            }
            Outcome::Redirect(route) => {
                self.ui.warning("Please log in as a customer to invest.");
                self.show(route.path()).await
            }
        }
    }

    /// Handle config show command
    fn handle_config_show(&self) -> Result<()> {
        let storage: TokenStoreConfig = self.config.token_storage.clone().into();
        let config_path = self
            .config_path
            .clone()
            .unwrap_or_else(default_config_path);

        self.ui.card(
            "Configuration",
            vec![
                ("Config file", config_path.display().to_string()),
                ("Server", self.config.base_url.clone()),
                ("Timeout", format!("{}s", self.config.timeout)),
                ("Use proxy", self.config.effective_use_proxy().to_string()),
                (
                    "Session storage",
                    match (storage.enabled, storage.storage_path) {
                        (true, Some(path)) => path.display().to_string(),
                        _ => "disabled".to_string(),
                    },
                ),
                ("Verbose", self.config.verbose.to_string()),
            ],
        );
        Ok(())
    }

    /// Open `path`, following redirects, and render what is there
    async fn show(&mut self, path: &str) -> Result<()> {
        let mut path = path.to_string();

        for _ in 0..MAX_REDIRECTS {
            match self.portal.open(&path).await? {
                Outcome::Ready(page) => {
                    self.render(&page);
                    return Ok(());
                }
                Outcome::Redirect(route) => {
                    debug!(from = %path, to = %route, "redirected");
                    path = route.path().to_string();
                }
            }
        }

        Err(FdError::internal(format!("Too many redirects from {}", path)))
    }

    fn render(&self, page: &Page) {
        match &page.view {
            View::Login => {
                self.ui.warning("Please log in to continue.");
                self.ui.info("  login <username> [--role customer|manager]");
            }
            View::Register => self.ui.info("  register <username> <email> [--role customer|manager]"),
            View::FdCalculator => self.ui.info("  calculate <principal> <rate> <months>"),
            View::FdInvest => self.ui.info("  invest <principal> <rate> <months>"),
            View::CustomerDashboard(dashboard) => {
                self.ui.header("Customer Dashboard");
                self.ui.card(
                    "Welcome",
                    vec![
                        ("Username", dashboard.username.clone()),
                        ("Email", dashboard.email.clone()),
                        ("Message", dashboard.welcome_message.clone()),
                    ],
                );
            }
            View::ManagerDashboard(customers) => {
                self.ui.header("Manager Dashboard");
                let total: f64 = customers.iter().map(|c| c.total_investment).sum();
                self.ui.info(&format!(
                    "{} customers, {} invested",
                    customers.len(),
                    format_amount(total)
                ));
                self.ui.customer_table(customers);
            }
        }
    }

    /// Interactive session
    ///
    /// Every line typed counts as activity. When the idle window elapses
    /// while waiting for input, the session is gone and the login view is
    /// shown.
    async fn run_shell(&mut self) -> Result<()> {
        self.ui.header("FD Portal");
        self.ui.info("Type `help` for commands, `exit` to quit.");
        if self.portal.state() != SessionState::Anonymous {
            self.show(Route::Root.path()).await?;
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            print!("{} ", self.prompt());
            std::io::stdout().flush()?;

            let line = match next_event(&mut self.portal, lines.next_line()).await {
                ShellEvent::Input(line) => line?,
                ShellEvent::TimedOut(route) => {
                    println!();
                    self.ui.warning("Session ended after 2 minutes of inactivity.");
                    self.show(route.path()).await?;
                    continue;
                }
            };

            let Some(line) = line else {
                break;
            };
            self.portal.activity(ActivityKind::KeyPress);

            let command = match parse_shell_line(&line) {
                Ok(command) => command,
                Err(e) => {
                    self.ui.error(&e.message());
                    continue;
                }
            };

            if command == ShellCommand::Exit {
                break;
            }
            if let Err(e) = self.run_shell_command(command).await {
                self.report(&e);
            }
        }

        Ok(())
    }

    async fn run_shell_command(&mut self, command: ShellCommand) -> Result<()> {
        match command {
            ShellCommand::Empty | ShellCommand::Exit => Ok(()),
            ShellCommand::Help => {
                print_shell_help(&self.ui);
                Ok(())
            }
            ShellCommand::Login {
                username,
                password,
                role,
            } => self.handle_login(&username, Some(password), role).await,
            ShellCommand::Register {
                username,
                email,
                password,
                role,
            } => {
                self.handle_register(&username, &email, Some(password), role)
                    .await
            }
            ShellCommand::Logout => self.handle_logout(),
            ShellCommand::Status => self.handle_status(),
            ShellCommand::Open(path) => self.show(&path).await,
            ShellCommand::Calculate(request) => self.handle_calculate(request).await,
            ShellCommand::Invest(request) => self.handle_invest(request).await,
        }
    }

    fn report(&self, error: &FdError) {
        self.ui.error(&error.message());
        if error.is_retryable() {
            self.ui.info("The server is unavailable right now, try again.");
        }
    }

    fn prompt(&self) -> String {
        match self.portal.current_role() {
            Some(Role::Customer) => "fd[customer]>".to_string(),
            Some(Role::BankManager) => "fd[manager]>".to_string(),
            None => "fd>".to_string(),
        }
    }
}

enum ShellEvent {
    Input(std::io::Result<Option<String>>),
    TimedOut(Route),
}

/// Wait for a line of input or the end of the idle window
///
/// An elapsed window wins over a line that became ready at the same time.
async fn next_event<A, S, C>(
    portal: &mut Portal<A, S, C>,
    input: impl Future<Output = std::io::Result<Option<String>>>,
) -> ShellEvent
where
    A: FdApi,
    S: CredentialStorage,
    C: Clock,
{
    tokio::select! {
        biased;
        route = portal.wait_for_timeout() => ShellEvent::TimedOut(route),
        line = input => ShellEvent::Input(line),
    }
}

fn fd_request(args: &FdArgs) -> FdRequest {
    FdRequest::new(args.principal, args.rate, args.months)
}

fn format_timestamp(seconds: i64) -> Option<String> {
    chrono::DateTime::from_timestamp(seconds, 0).map(|t| {
        t.with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    })
}

fn print_shell_help(ui: &UI) {
    ui.info("Commands:");
    for line in [
        "  login <username> <password> [customer|manager]",
        "  register <username> <email> <password> [customer|manager]",
        "  logout",
        "  status",
        "  open <path>          e.g. /customer-dashboard, /manager-dashboard",
        "  dashboard",
        "  calculate <principal> <rate> <months>",
        "  invest <principal> <rate> <months>",
        "  exit",
    ] {
        println!("{}", line);
    }
}

/// One line of shell input
#[derive(Debug, Clone, PartialEq)]
enum ShellCommand {
    Empty,
    Help,
    Exit,
    Login {
        username: String,
        password: String,
        role: Role,
    },
    Register {
        username: String,
        email: String,
        password: String,
        role: Role,
    },
    Logout,
    Status,
    Open(String),
    Calculate(FdRequest),
    Invest(FdRequest),
}

fn parse_shell_line(line: &str) -> Result<ShellCommand> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&name, args)) = words.split_first() else {
        return Ok(ShellCommand::Empty);
    };

    let command = match (name, args) {
        ("help" | "?", []) => ShellCommand::Help,
        ("exit" | "quit", []) => ShellCommand::Exit,
        ("logout", []) => ShellCommand::Logout,
        ("status", []) => ShellCommand::Status,
        ("dashboard", []) => ShellCommand::Open(Route::Root.path().to_string()),
        ("open", [path]) => ShellCommand::Open(path.to_string()),
        ("login", [username, password, rest @ ..]) if rest.len() <= 1 => ShellCommand::Login {
            username: username.to_string(),
            password: password.to_string(),
            role: parse_role(rest.first().copied())?,
        },
        ("register", [username, email, password, rest @ ..]) if rest.len() <= 1 => {
            ShellCommand::Register {
                username: username.to_string(),
                email: email.to_string(),
                password: password.to_string(),
                role: parse_role(rest.first().copied())?,
            }
        }
        ("calculate" | "calc", [principal, rate, months]) => {
            ShellCommand::Calculate(parse_fd(principal, rate, months)?)
        }
        ("invest", [principal, rate, months]) => {
            ShellCommand::Invest(parse_fd(principal, rate, months)?)
        }
        _ => {
            return Err(FdError::invalid_input(format!(
                "Unknown command or wrong arguments: `{}` (try `help`)",
                line.trim()
            )))
        }
    };

    Ok(command)
}

fn parse_role(word: Option<&str>) -> Result<Role> {
    match word {
        None => Ok(Role::Customer),
        Some(word) => match word.to_ascii_lowercase().as_str() {
            "customer" => Ok(Role::Customer),
            "manager" | "bank_manager" => Ok(Role::BankManager),
            _ => Err(FdError::invalid_input(format!("Unknown role: {}", word))),
        },
    }
}

fn parse_fd(principal: &str, rate: &str, months: &str) -> Result<FdRequest> {
    let invalid = || FdError::validation(INVALID_FD_INPUT);
    Ok(FdRequest::new(
        principal.parse().map_err(|_| invalid())?,
        rate.parse().map_err(|_| invalid())?,
        months.parse().map_err(|_| invalid())?,
    ))
}
