use rust_decimal::Decimal;
use serde_json::json;
use tracing::warn;

use super::models::{
    Balance, DepositResponse, MessageResponse, ResolvedAccount, Transaction, UserSummary,
};
use super::paths;
use crate::client::BankClient;
use crate::error::Error;
use crate::transport::ApiRequest;
use crate::validation;

impl BankClient {
    /// Credit the caller's account. The returned balance is written into the cached
    /// profile.
    pub async fn deposit(&self, amount: Decimal) -> Result<DepositResponse, Error> {
        let amount = validation::validate_amount(amount)?;
        let request = ApiRequest::post(paths::DEPOSIT).json(json!({ "amount": amount }));
        let response: DepositResponse = self.call(request).await?;
        self.cache_balance(response.balance);
        Ok(response)
    }

    /// Move money to another account by account number
    pub async fn transfer(
        &self,
        to_account_number: &str,
        amount: Decimal,
    ) -> Result<MessageResponse, Error> {
        let to_account_number = validation::validate_account_number(to_account_number)?;
        let amount = validation::validate_amount(amount)?;
        let request = ApiRequest::post(paths::TRANSFER).json(json!({
            "to_account_number": to_account_number,
            "amount": amount,
        }));
        self.call(request).await
    }

    /// Look up who owns an account number
    pub async fn resolve_account(&self, account_number: &str) -> Result<ResolvedAccount, Error> {
        let account_number = validation::validate_account_number(account_number)?;
        let request = ApiRequest::get(paths::RESOLVE_ACCOUNT).query("account_number", account_number);
        self.call(request).await
    }

    pub async fn balance(&self) -> Result<Balance, Error> {
        self.call(ApiRequest::get(paths::BALANCE)).await
    }

    /// Fetch the balance and write it into the cached profile
    pub async fn sync_balance(&self) -> Result<Balance, Error> {
        let balance = self.balance().await?;
        self.cache_balance(balance.balance);
        Ok(balance)
    }

    /// Deposits, transfers and loan payouts involving the caller, newest first
    pub async fn transactions(&self) -> Result<Vec<Transaction>, Error> {
        self.call(ApiRequest::get(paths::TRANSACTIONS)).await
    }

    /// Every other user of the bank
    pub async fn users(&self) -> Result<Vec<UserSummary>, Error> {
        self.call(ApiRequest::get(paths::USERS)).await
    }

    // cache write failures are logged, never returned
    fn cache_balance(&self, balance: Decimal) {
        if let Err(e) = self.token_store().update_user(|user| user.balance = balance) {
            warn!("Failed to cache balance: {}", e);
        }
    }
}
