mod commands;
mod error;
mod utils;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use k9tx_bank_sdk::{BankConfig, SessionContext};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::commands::{
    auth::{LoginCommand, PasswordCommands, RegisterCommand},
    blogs::BlogCommands,
    loans::LoanCommands,
    money::{BalanceCommand, DepositCommand, ResolveCommand, TransferCommand},
    profile::ProfileCommands,
};
use crate::error::CliError;
use crate::utils::{open_session, print_error};

#[derive(Parser)]
#[command(name = "k9tx")]
#[command(about = "K9TX bank command line client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// API base URL, overrides the config file and K9TX_API_URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Clone)]
enum Commands {
    /// Log in and keep the session for later commands
    Login(LoginCommand),

    /// Forget the stored session
    Logout,

    /// Open a new account
    Register(RegisterCommand),

    /// Show the logged-in user
    Whoami,

    /// Reset or change the password
    #[command(subcommand)]
    Password(PasswordCommands),

    /// Deposit money into your account
    Deposit(DepositCommand),

    /// Send money to another account
    Transfer(TransferCommand),

    /// Look up the owner of an account number
    Resolve(ResolveCommand),

    /// Show your balance
    Balance(BalanceCommand),

    /// List your transactions
    Transactions,

    /// List the other users of the bank
    Users,

    /// Show or edit your profile
    #[command(subcommand)]
    Profile(ProfileCommands),

    /// Community blog
    #[command(subcommand)]
    Blogs(BlogCommands),

    /// Loan applications
    #[command(subcommand)]
    Loans(LoanCommands),
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(cli).await {
        tracing::debug!("{}", e);
        print_error(&e.user_message());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = BankConfig::load(cli.config.as_deref())?;
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }

    let session = open_session(config)?;
    dispatch(cli.command, &session).await
}

async fn dispatch(command: Commands, session: &SessionContext) -> Result<(), CliError> {
    match command {
        Commands::Login(cmd) => cmd.execute(session).await,
        Commands::Logout => commands::auth::logout(session),
        Commands::Register(cmd) => cmd.execute(session).await,
        Commands::Whoami => commands::auth::whoami(session),
        Commands::Password(cmd) => cmd.execute(session).await,
        Commands::Deposit(cmd) => cmd.execute(session).await,
        Commands::Transfer(cmd) => cmd.execute(session).await,
        Commands::Resolve(cmd) => cmd.execute(session).await,
        Commands::Balance(cmd) => cmd.execute(session).await,
        Commands::Transactions => commands::money::transactions(session).await,
        Commands::Users => commands::money::users(session).await,
        Commands::Profile(cmd) => cmd.execute(session).await,
        Commands::Blogs(cmd) => cmd.execute(session).await,
        Commands::Loans(cmd) => cmd.execute(session).await,
    }
}
