use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use colored::Colorize;
use k9tx_bank_sdk::models::UserProfile;
use k9tx_bank_sdk::{BankClient, BankConfig, Decimal, SessionContext};
use prettytable::{Cell, Row, Table};

use crate::error::CliError;

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message to stderr
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print a table with data
pub fn print_table(headers: Vec<&str>, rows: Vec<Vec<String>>) {
    let mut table = Table::new();

    table.set_titles(Row::new(headers.iter().map(|h| Cell::new(h)).collect()));

    for row_data in rows {
        table.add_row(Row::new(row_data.iter().map(|c| Cell::new(c)).collect()));
    }

    table.printstd();
}

/// Build the client and restore the persisted session for the configured API
pub fn open_session(config: BankConfig) -> Result<SessionContext, CliError> {
    let client = BankClient::new(config)?;
    Ok(SessionContext::new(Arc::new(client)))
}

/// The logged-in user, or an error telling how to log in
pub fn require_user(session: &SessionContext) -> Result<UserProfile, CliError> {
    session
        .current_user()
        .ok_or_else(|| CliError::Command("Not logged in. Run `k9tx login` first.".to_string()))
}

pub fn prompt_password(prompt: &str) -> Result<String, CliError> {
    dialoguer::Password::new()
        .with_prompt(prompt)
        .interact()
        .map_err(|e| CliError::Command(format!("Password input error: {}", e)))
}

pub fn confirm(prompt: &str) -> Result<bool, CliError> {
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| CliError::Command(format!("Input error: {}", e)))
}

/// Two decimal places, the way balances are shown everywhere
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", amount)
}

pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

pub fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}
