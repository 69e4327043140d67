use super::models::{Loan, LoanAction, LoanApplication};
use super::paths;
use crate::client::BankClient;
use crate::error::Error;
use crate::transport::ApiRequest;
use crate::validation;
use serde_json::json;

impl BankClient {
    /// The caller's loans; staff see every application
    pub async fn loans(&self) -> Result<Vec<Loan>, Error> {
        self.call(ApiRequest::get(paths::LOANS)).await
    }

    /// Apply for a loan; new applications start out `PENDING`
    pub async fn apply_loan(&self, application: &LoanApplication) -> Result<Loan, Error> {
        validation::validate_loan(application)?;
        let request = ApiRequest::post(paths::LOANS).json(serde_json::to_value(application)?);
        self.call(request).await
    }

    /// Approve or reject a pending loan (staff only). Approval credits the applicant.
    pub async fn act_on_loan(&self, loan_id: i64, action: LoanAction) -> Result<Loan, Error> {
        let request = ApiRequest::post(paths::loan_action(loan_id)).json(json!({ "action": action }));
        self.call(request).await
    }
}
