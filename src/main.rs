use clap::{Args, Parser, Subcommand, ValueEnum};
use fdportal_protocol::Role;
use std::path::PathBuf;

mod cli;
mod client;
mod clock;
mod config;
mod error;
mod inactivity;
mod portal;
mod route;
mod session;
mod store;
mod supervisor;
mod token;
mod ui;
mod version;

#[cfg(test)]
mod tests;

use cli::CliHandler;
use config::ClientConfig;
use version::CURRENT_VERSION;

#[derive(Parser)]
#[command(
    name = "fdportal",
    about = "Fixed-deposit portal client for customers and bank managers",
    long_about = "FD Portal - Fixed-deposit banking from the terminal

OVERVIEW:
  Customers register, log in, project maturity amounts and book fixed
  deposits. Bank managers review every customer's deposits.

SESSIONS:
  A login is remembered until the credential expires. Inside `fdportal shell`
  the session also ends after 2 minutes without input.

QUICK START:
  fdportal register <USERNAME> <EMAIL>        # Create a customer account
  fdportal login <USERNAME>                   # Log in and open your dashboard
  fdportal calculate 10000 6.5 12             # Project a deposit
  fdportal invest 10000 6.5 12                # Book it (customers only)
  fdportal shell                              # Interactive session
  fdportal status                             # Show session status",
    version = CURRENT_VERSION,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// API base URL, overrides configuration
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Request timeout in seconds, overrides configuration
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and open the dashboard for your role
    Login(LoginArgs),

    /// Create an account
    Register(RegisterArgs),

    /// Logout
    Logout,

    /// Show session status
    #[command(aliases = &["st"])]
    Status,

    /// Open a portal path such as /customer-dashboard
    Open(OpenArgs),

    /// Open the dashboard for the current role
    Dashboard,

    /// Project the maturity amount of a deposit
    #[command(aliases = &["calc"])]
    Calculate(FdArgs),

    /// Book a fixed deposit
    Invest(FdArgs),

    /// Interactive session with inactivity timeout
    Shell,

    /// Configuration
    #[command(aliases = &["cfg"])]
    Config(ConfigArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    Customer,
    Manager,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Customer => Role::Customer,
            RoleArg::Manager => Role::BankManager,
        }
    }
}

#[derive(Args)]
pub struct LoginArgs {
    pub username: String,

    #[arg(short, long, value_enum, default_value_t = RoleArg::Customer)]
    pub role: RoleArg,

    /// Prompted for when absent
    #[arg(long, env = "FDPORTAL_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Args)]
pub struct RegisterArgs {
    pub username: String,

    pub email: String,

    #[arg(short, long, value_enum, default_value_t = RoleArg::Customer)]
    pub role: RoleArg,

    #[arg(long, env = "FDPORTAL_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Args)]
pub struct OpenArgs {
    pub path: String,
}

#[derive(Args)]
pub struct FdArgs {
    pub principal: f64,

    /// Annual interest rate in percent
    pub rate: f64,

    /// Tenure in months
    pub months: u32,
}

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,
}

fn load_config(cli: &Cli) -> error::Result<ClientConfig> {
    let mut builder = ClientConfig::builder();
    if let Some(path) = &cli.config {
        builder = builder.config_file(path);
    }
    if let Some(endpoint) = &cli.endpoint {
        builder = builder.base_url(endpoint.clone());
    }
    if let Some(timeout) = cli.timeout {
        builder = builder.timeout(timeout);
    }
    if cli.verbose {
        builder = builder.verbose(true);
    }
    builder.build()
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let log_level = if config.verbose { "debug" } else { "info" };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(format!("fdportal={}", log_level))
        .with_writer(std::io::stderr);
    subscriber.init();

    let mut handler = match CliHandler::new(config, cli.config.clone()) {
        Ok(handler) => handler,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = handler.execute(cli.command).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
