use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{info, warn};

use super::store::Session;
use crate::api::models::{MessageResponse, RegisterRequest, UserProfile, VerifyOtpRequest};
use crate::client::BankClient;
use crate::error::Error;
use crate::validation;

#[derive(Debug, Clone)]
struct SessionState {
    user: Option<UserProfile>,
    loading: bool,
}

/// Who is logged in, for everything that renders or acts on behalf of the user.
///
/// Owned explicitly and shared by `Arc`; tests build one over an in-memory store.
pub struct SessionContext {
    client: Arc<BankClient>,
    state: RwLock<SessionState>,
}

impl SessionContext {
    /// Build the context and restore any persisted session
    pub fn new(client: Arc<BankClient>) -> Self {
        let context = Self {
            client,
            state: RwLock::new(SessionState {
                user: None,
                loading: true,
            }),
        };
        context.restore();
        context
    }

    fn restore(&self) {
        let user = match self.client.token_store().get() {
            Ok(session) => session.and_then(|s| s.user),
            Err(e) => {
                warn!("Could not read stored session: {}", e);
                None
            }
        };

        let mut state = self.write_state();
        if let Some(user) = &user {
            info!("Restored session for {}", user.email);
        }
        state.user = user;
        state.loading = false;
    }

    pub fn client(&self) -> &Arc<BankClient> {
        &self.client
    }

    pub fn is_loading(&self) -> bool {
        self.read_state().loading
    }

    /// Whether an access token is stored
    pub fn is_authenticated(&self) -> bool {
        matches!(self.client.token_store().access_token(), Ok(Some(_)))
    }

    /// The logged-in user. The token store is authoritative: once its access token
    /// is gone (logout, failed refresh) this is `None`, and cache updates written
    /// by other components are picked up.
    pub fn current_user(&self) -> Option<UserProfile> {
        let stored = match self.client.token_store().get() {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Could not read stored session: {}", e);
                None
            }
        };

        let mut state = self.write_state();
        match stored {
            Some(session) => {
                if let Some(user) = session.user {
                    state.user = Some(user);
                }
                state.user.clone()
            }
            None => {
                state.user = None;
                None
            }
        }
    }

    /// Authenticate and persist the returned tokens and profile
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, Error> {
        let email = validation::validate_email(email)?;
        validation::validate_password(password)?;

        let response = self.client.login(&email, password).await?;
        let session = Session::new(response.access, response.refresh).with_user(response.user.clone());
        self.client.token_store().set(&session)?;

        self.write_state().user = Some(response.user.clone());
        info!("Logged in as {}", response.user.email);
        Ok(response.user)
    }

    /// Forget the session locally. The server keeps no session to invalidate.
    pub fn logout(&self) -> Result<(), Error> {
        self.write_state().user = None;
        self.client.token_store().clear()?;
        info!("Logged out");
        Ok(())
    }

    pub async fn register(&self, details: &RegisterRequest) -> Result<UserProfile, Error> {
        validation::require_text("Username", &details.username)?;
        validation::validate_email(&details.email)?;
        validation::validate_password_pair(&details.password, &details.password2)?;
        self.client.register(details).await
    }

    /// Start a password reset; the server emails a one-time password
    pub async fn reset_password(&self, email: &str) -> Result<MessageResponse, Error> {
        let email = validation::validate_email(email)?;
        self.client.request_password_reset(&email).await
    }

    /// Finish a password reset. The caller logs in again afterwards.
    pub async fn verify_otp(
        &self,
        email: &str,
        otp: &str,
        new_password: &str,
    ) -> Result<MessageResponse, Error> {
        let details = VerifyOtpRequest {
            email: validation::validate_email(email)?,
            otp: validation::validate_otp(otp)?,
            new_password: new_password.to_string(),
        };
        validation::validate_password(new_password)?;
        self.client.verify_otp(&details).await
    }

    pub async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> Result<MessageResponse, Error> {
        validation::validate_password(old_password)?;
        validation::validate_password(new_password)?;
        self.client.change_password(old_password, new_password).await
    }

    /// Replace the cached profile with the server's current copy
    pub async fn refresh_profile(&self) -> Result<UserProfile, Error> {
        let user = self.client.me().await?;
        let store = self.client.token_store();
        if store.access_token()?.is_some() {
            store.set_user(&user)?;
            self.write_state().user = Some(user.clone());
        }
        Ok(user)
    }

    fn read_state(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
