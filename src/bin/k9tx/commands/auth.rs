use clap::{Args, Subcommand};
use colored::Colorize;
use k9tx_bank_sdk::models::RegisterRequest;
use k9tx_bank_sdk::SessionContext;

use crate::error::CliError;
use crate::utils::{format_amount, or_dash, print_success, print_table, prompt_password, require_user};

#[derive(Args, Clone)]
pub struct LoginCommand {
    /// Account email
    #[arg(short, long)]
    email: String,

    /// Password (prompted when omitted)
    #[arg(short, long)]
    password: Option<String>,
}

impl LoginCommand {
    pub async fn execute(self, session: &SessionContext) -> Result<(), CliError> {
        let password = match self.password {
            Some(password) => password,
            None => prompt_password("Password")?,
        };

        let user = session.login(&self.email, &password).await?;
        print_success(&format!("Logged in as {}", user.username.bold()));
        Ok(())
    }
}

pub fn logout(session: &SessionContext) -> Result<(), CliError> {
    session.logout()?;
    print_success("Logged out");
    Ok(())
}

#[derive(Args, Clone)]
pub struct RegisterCommand {
    #[arg(short, long)]
    username: String,

    #[arg(short, long)]
    email: String,

    /// Phone number (optional)
    #[arg(long)]
    phone: Option<String>,
}

impl RegisterCommand {
    pub async fn execute(self, session: &SessionContext) -> Result<(), CliError> {
        let password = prompt_password("Password")?;
        let password2 = prompt_password("Confirm password")?;

        let details = RegisterRequest {
            username: self.username,
            email: self.email,
            password,
            password2,
            phone_number: self.phone.filter(|p| !p.trim().is_empty()),
        };

        let user = session.register(&details).await?;
        print_success(&format!(
            "Account {} created for {}. Log in to continue.",
            user.account_number, user.username
        ));
        Ok(())
    }
}

pub fn whoami(session: &SessionContext) -> Result<(), CliError> {
    let user = require_user(session)?;
    let role = if user.is_staff { "staff" } else { "customer" };

    print_table(
        vec!["Field", "Value"],
        vec![
            vec!["Username".to_string(), user.username.clone()],
            vec!["Email".to_string(), user.email.clone()],
            vec!["Phone".to_string(), or_dash(user.phone_number.as_deref())],
            vec!["Account".to_string(), user.account_number.clone()],
            vec!["Balance".to_string(), format_amount(user.balance)],
            vec!["Role".to_string(), role.to_string()],
        ],
    );
    Ok(())
}

#[derive(Subcommand, Clone)]
pub enum PasswordCommands {
    /// Email a one-time password for resetting a forgotten password
    Reset {
        #[arg(short, long)]
        email: String,
    },

    /// Set a new password using the emailed one-time password
    Verify {
        #[arg(short, long)]
        email: String,

        /// 6-digit code from the email
        #[arg(short, long)]
        otp: String,
    },

    /// Change the password of the logged-in account
    Change,
}

impl PasswordCommands {
    pub async fn execute(self, session: &SessionContext) -> Result<(), CliError> {
        match self {
            PasswordCommands::Reset { email } => {
                let response = session.reset_password(&email).await?;
                print_success(&response.text_or("OTP sent to your email"));
            }
            PasswordCommands::Verify { email, otp } => {
                let new_password = prompt_password("New password")?;
                let response = session.verify_otp(&email, &otp, &new_password).await?;
                print_success(&response.text_or("Password reset successful"));
                println!("Log in with your new password.");
            }
            PasswordCommands::Change => {
                require_user(session)?;
                let old_password = prompt_password("Current password")?;
                let new_password = prompt_password("New password")?;
                let response = session.change_password(&old_password, &new_password).await?;
                print_success(&response.text_or("Password changed successfully"));
            }
        }
        Ok(())
    }
}
