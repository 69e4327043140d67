use serde_json::json;

use super::models::{LoginResponse, MessageResponse, RegisterRequest, UserProfile, VerifyOtpRequest};
use super::paths;
use crate::client::BankClient;
use crate::error::Error;
use crate::transport::ApiRequest;

/// Account lifecycle endpoints. These only talk to the server; storing the
/// resulting session is up to [`SessionContext`](crate::session::SessionContext).
impl BankClient {
    /// Exchange credentials for a token pair and the user's profile
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, Error> {
        let request = ApiRequest::post(paths::LOGIN).json(json!({
            "email": email,
            "password": password,
        }));
        self.call(request).await
    }

    /// Create an account; the server answers with the new user
    pub async fn register(&self, details: &RegisterRequest) -> Result<UserProfile, Error> {
        let request = ApiRequest::post(paths::REGISTER).json(serde_json::to_value(details)?);
        self.call(request).await
    }

    /// Ask the server to email a one-time password
    pub async fn request_password_reset(&self, email: &str) -> Result<MessageResponse, Error> {
        let request = ApiRequest::post(paths::PASSWORD_RESET_REQUEST).json(json!({ "email": email }));
        self.call(request).await
    }

    /// Set a new password with the emailed one-time password
    pub async fn verify_otp(&self, details: &VerifyOtpRequest) -> Result<MessageResponse, Error> {
        let request =
            ApiRequest::post(paths::PASSWORD_RESET_VERIFY).json(serde_json::to_value(details)?);
        self.call(request).await
    }

    pub async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> Result<MessageResponse, Error> {
        let request = ApiRequest::post(paths::PASSWORD_CHANGE).json(json!({
            "old_password": old_password,
            "new_password": new_password,
        }));
        self.call(request).await
    }
}
