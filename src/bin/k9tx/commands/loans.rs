use clap::{Args, Subcommand};
use colored::Colorize;
use k9tx_bank_sdk::models::{LoanAction, LoanApplication, LoanStatus};
use k9tx_bank_sdk::validation::parse_amount;
use k9tx_bank_sdk::{Decimal, SessionContext};

use crate::error::CliError;
use crate::utils::{format_amount, format_timestamp, or_dash, print_success, print_table, require_user};

#[derive(Subcommand, Clone)]
pub enum LoanCommands {
    /// Your loans (every application when logged in as staff)
    List,

    /// Apply for a loan
    Apply(ApplyLoanCommand),

    /// Approve a pending loan and credit the applicant (staff only)
    Approve { id: i64 },

    /// Reject a pending loan (staff only)
    Reject { id: i64 },
}

#[derive(Args, Clone)]
pub struct ApplyLoanCommand {
    #[arg(short, long)]
    amount: String,

    /// Repayment term in months
    #[arg(short, long)]
    term: u32,

    #[arg(short, long)]
    purpose: String,

    /// Annual interest rate in percent
    #[arg(short, long)]
    rate: Option<String>,
}

impl LoanCommands {
    pub async fn execute(self, session: &SessionContext) -> Result<(), CliError> {
        let user = require_user(session)?;
        let client = session.client();

        match self {
            LoanCommands::List => {
                let loans = client.loans().await?;
                if loans.is_empty() {
                    println!("No loans found.");
                    return Ok(());
                }

                let mut headers = vec!["ID", "Amount", "Term", "Rate", "Purpose", "Status", "Applied"];
                if user.is_staff {
                    headers.insert(1, "Applicant");
                }

                let rows = loans
                    .into_iter()
                    .map(|loan| {
                        let mut row = vec![
                            loan.id.to_string(),
                            format_amount(loan.amount),
                            format!("{} mo", loan.term_months),
                            format!("{}%", loan.interest_rate),
                            loan.purpose,
                            status_label(loan.status),
                            format_timestamp(&loan.created_at),
                        ];
                        if user.is_staff {
                            row.insert(1, or_dash(loan.applicant_username.as_deref()));
                        }
                        row
                    })
                    .collect();
                print_table(headers, rows);
            }
            LoanCommands::Apply(command) => {
                let interest_rate = match command.rate {
                    Some(rate) => rate
                        .trim()
                        .parse::<Decimal>()
                        .map_err(|_| CliError::Parse(format!("Invalid interest rate: {}", rate)))?,
                    None => LoanApplication::default_interest_rate(),
                };
                let application = LoanApplication {
                    amount: parse_amount(&command.amount)?,
                    term_months: command.term,
                    purpose: command.purpose,
                    interest_rate,
                };

                let loan = client.apply_loan(&application).await?;
                print_success(&format!(
                    "Loan #{} for {} submitted ({})",
                    loan.id,
                    format_amount(loan.amount),
                    loan.status
                ));
            }
            LoanCommands::Approve { id } => {
                let loan = client.act_on_loan(id, LoanAction::Approve).await?;
                print_success(&format!("Loan #{} {}", loan.id, status_label(loan.status)));
            }
            LoanCommands::Reject { id } => {
                let loan = client.act_on_loan(id, LoanAction::Reject).await?;
                print_success(&format!("Loan #{} {}", loan.id, status_label(loan.status)));
            }
        }
        Ok(())
    }
}

fn status_label(status: LoanStatus) -> String {
    match status {
        LoanStatus::Pending => status.to_string().yellow().to_string(),
        LoanStatus::Approved => status.to_string().green().to_string(),
        LoanStatus::Rejected => status.to_string().red().to_string(),
    }
}
