//! Client-side input checks
//!
//! Everything here runs before a request is built; a failure never reaches the
//! network and comes back as [`Error::Validation`].

use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;

use crate::api::models::LoanApplication;
use crate::error::Error;

fn invalid(message: impl Into<String>) -> Error {
    Error::Validation(message.into())
}

/// Amount of money: strictly positive, at most two decimal places
pub fn validate_amount(amount: Decimal) -> Result<Decimal, Error> {
    if amount <= Decimal::ZERO {
        return Err(invalid("Amount must be greater than zero"));
    }
    if amount.normalize().scale() > 2 {
        return Err(invalid("Amount can have at most two decimal places"));
    }
    Ok(amount)
}

/// Parse and validate a user-typed amount such as `"150.50"`
pub fn parse_amount(input: &str) -> Result<Decimal, Error> {
    let amount = Decimal::from_str(input.trim())
        .map_err(|_| invalid(format!("Invalid amount: '{}'", input.trim())))?;
    validate_amount(amount)
}

pub fn validate_account_number(input: &str) -> Result<String, Error> {
    let account = input.trim();
    if account.is_empty() {
        return Err(invalid("Account number is required"));
    }
    Ok(account.to_string())
}

pub fn validate_email(input: &str) -> Result<String, Error> {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    let pattern = EMAIL.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
    });

    let email = input.trim();
    if pattern.is_match(email) {
        Ok(email.to_string())
    } else {
        Err(invalid("Enter a valid email address"))
    }
}

/// One-time passwords are six digits
pub fn validate_otp(input: &str) -> Result<String, Error> {
    let otp = input.trim();
    if otp.len() == 6 && otp.chars().all(|c| c.is_ascii_digit()) {
        Ok(otp.to_string())
    } else {
        Err(invalid("OTP must be 6 digits"))
    }
}

pub fn validate_password(password: &str) -> Result<(), Error> {
    if password.is_empty() {
        return Err(invalid("Password is required"));
    }
    Ok(())
}

/// New password plus its confirmation, as on the registration form
pub fn validate_password_pair(password: &str, confirmation: &str) -> Result<(), Error> {
    validate_password(password)?;
    if password != confirmation {
        return Err(invalid("Password fields didn't match."));
    }
    Ok(())
}

/// Trimmed, non-empty text for `field`
pub fn require_text(field: &str, value: &str) -> Result<String, Error> {
    let text = value.trim();
    if text.is_empty() {
        return Err(invalid(format!("{} is required", field)));
    }
    Ok(text.to_string())
}

pub fn validate_loan(application: &LoanApplication) -> Result<(), Error> {
    if application.amount <= Decimal::ZERO {
        return Err(invalid("Loan amount must be greater than zero"));
    }
    if application.term_months == 0 {
        return Err(invalid("Loan term must be at least one month"));
    }
    if application.interest_rate <= Decimal::ZERO {
        return Err(invalid("Interest rate must be greater than zero"));
    }
    Ok(())
}
