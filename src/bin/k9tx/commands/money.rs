use std::sync::Arc;

use clap::Args;
use colored::Colorize;
use k9tx_bank_sdk::models::{Transaction, TransactionKind, UserProfile};
use k9tx_bank_sdk::validation::parse_amount;
use k9tx_bank_sdk::{BalanceWatcher, SessionContext, SyncEvent};
use tokio::sync::mpsc;

use crate::error::CliError;
use crate::utils::{
    confirm, format_amount, format_timestamp, print_error, print_success, print_table,
    require_user,
};

#[derive(Args, Clone)]
pub struct DepositCommand {
    /// Amount to deposit, e.g. 100.50
    amount: String,
}

impl DepositCommand {
    pub async fn execute(self, session: &SessionContext) -> Result<(), CliError> {
        require_user(session)?;
        let amount = parse_amount(&self.amount)?;

        let response = session.client().deposit(amount).await?;
        print_success(&format!(
            "Deposited {}. New balance: {}",
            format_amount(amount),
            format_amount(response.balance).bold()
        ));
        Ok(())
    }
}

#[derive(Args, Clone)]
pub struct TransferCommand {
    /// Recipient account number
    #[arg(short, long)]
    to: String,

    /// Amount to send
    #[arg(short, long)]
    amount: String,

    /// Skip confirmation prompt
    #[arg(short, long)]
    yes: bool,
}

impl TransferCommand {
    pub async fn execute(self, session: &SessionContext) -> Result<(), CliError> {
        require_user(session)?;
        let amount = parse_amount(&self.amount)?;
        let client = session.client();

        let recipient = client.resolve_account(&self.to).await?;
        println!(
            "Sending {} to {} ({}), account {}",
            format_amount(amount).bold(),
            recipient.username.bold(),
            recipient.email,
            recipient.account_number
        );

        if !self.yes && !confirm("Proceed with the transfer?")? {
            println!("Transfer cancelled");
            return Ok(());
        }

        let response = client.transfer(&recipient.account_number, amount).await?;
        print_success(&response.text_or("Transfer successful"));

        if let Ok(balance) = client.sync_balance().await {
            println!("New balance: {}", format_amount(balance.balance));
        }
        Ok(())
    }
}

#[derive(Args, Clone)]
pub struct ResolveCommand {
    /// Account number to look up
    account_number: String,
}

impl ResolveCommand {
    pub async fn execute(self, session: &SessionContext) -> Result<(), CliError> {
        require_user(session)?;
        let account = session.client().resolve_account(&self.account_number).await?;
        print_table(
            vec!["Account", "Username", "Email"],
            vec![vec![account.account_number, account.username, account.email]],
        );
        Ok(())
    }
}

#[derive(Args, Clone)]
pub struct BalanceCommand {
    /// Keep polling and print every update until Ctrl+C
    #[arg(short, long)]
    watch: bool,
}

impl BalanceCommand {
    pub async fn execute(self, session: &SessionContext) -> Result<(), CliError> {
        require_user(session)?;
        let client = Arc::clone(session.client());

        if !self.watch {
            let balance = client.sync_balance().await?;
            println!("Balance: {}", format_amount(balance.balance).bold());
            return Ok(());
        }

        let (sender, mut receiver) = mpsc::unbounded_channel();
        let mut watcher = BalanceWatcher::start(client, sender);
        println!("Watching balance (Ctrl+C to stop)");

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                event = receiver.recv() => match event {
                    Some(SyncEvent::Balance(balance)) => {
                        println!("{}  {}", chrono::Local::now().format("%H:%M:%S"), format_amount(balance.balance));
                    }
                    Some(SyncEvent::Error(message)) => print_error(&message),
                    Some(SyncEvent::Blogs(_)) => {}
                    None => break,
                },
            }

            if session.current_user().is_none() {
                print_error("Session ended. Log in again.");
                break;
            }
        }

        watcher.stop();
        Ok(())
    }
}

pub async fn transactions(session: &SessionContext) -> Result<(), CliError> {
    let user = require_user(session)?;
    let transactions = session.client().transactions().await?;

    if transactions.is_empty() {
        println!("No transactions found.");
        return Ok(());
    }

    let rows = transactions
        .iter()
        .map(|tx| {
            vec![
                format_timestamp(&tx.created_at),
                tx.kind.to_string(),
                describe(tx, &user),
                signed_amount(tx, &user),
            ]
        })
        .collect();

    print_table(vec!["Date", "Type", "Details", "Amount"], rows);
    Ok(())
}

fn is_outgoing(tx: &Transaction, user: &UserProfile) -> bool {
    tx.kind == TransactionKind::Transfer && tx.from_user == Some(user.id)
}

fn describe(tx: &Transaction, user: &UserProfile) -> String {
    match tx.kind {
        TransactionKind::Deposit => "Deposit".to_string(),
        TransactionKind::Loan => "Loan disbursement".to_string(),
        TransactionKind::Transfer if is_outgoing(tx, user) => {
            format!("To {}", tx.to_username.as_deref().unwrap_or("unknown"))
        }
        TransactionKind::Transfer => {
            format!("From {}", tx.from_username.as_deref().unwrap_or("unknown"))
        }
    }
}

fn signed_amount(tx: &Transaction, user: &UserProfile) -> String {
    if is_outgoing(tx, user) {
        format!("-{}", format_amount(tx.amount)).red().to_string()
    } else {
        format!("+{}", format_amount(tx.amount)).green().to_string()
    }
}

pub async fn users(session: &SessionContext) -> Result<(), CliError> {
    require_user(session)?;
    let users = session.client().users().await?;

    if users.is_empty() {
        println!("No other users found.");
        return Ok(());
    }

    let rows = users
        .into_iter()
        .map(|u| vec![u.username, u.email, u.account_number])
        .collect();
    print_table(vec!["Username", "Email", "Account"], rows);
    Ok(())
}
