use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::api::models::RefreshResponse;
use crate::api::paths;
use crate::config::BankConfig;
use crate::error::Error;
use crate::session::storage::FileStorage;
use crate::session::store::TokenStore;
use crate::transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport};

/// Where the client is in the 401 recovery protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Normal,
    Refreshing,
}

/// Client for the K9TX bank API.
///
/// Every request carries the stored access token. A 401 on a request that has not
/// been retried yet triggers one refresh through `/auth/token/refresh/` and a single
/// re-issue of the request with the new token; if the refresh fails the stored
/// session is wiped and the original error is returned.
pub struct BankClient {
    /// Wire layer
    transport: Arc<dyn Transport>,
    /// Persisted tokens and cached profile
    store: Arc<TokenStore>,
    /// Client configuration
    config: BankConfig,
    /// Held for the duration of a refresh so concurrent 401s share one refresh call
    refresh_gate: Mutex<()>,
    refreshing: AtomicBool,
}

impl BankClient {
    /// Create a client talking HTTP to `config.api_url`, with the session persisted
    /// on disk for that origin
    pub fn new(config: BankConfig) -> Result<Self, Error> {
        config.validate()?;
        let storage = FileStorage::new(&config.session_dir(), &config.origin()?)?;
        let transport = ReqwestTransport::new(config.base_url()?, config.request_timeout())?;

        Ok(Self::with_parts(
            config,
            Arc::new(transport),
            Arc::new(TokenStore::new(Arc::new(storage))),
        ))
    }

    /// Assemble a client from explicit parts (custom transport or storage)
    pub fn with_parts(
        config: BankConfig,
        transport: Arc<dyn Transport>,
        store: Arc<TokenStore>,
    ) -> Self {
        Self {
            transport,
            store,
            config,
            refresh_gate: Mutex::new(()),
            refreshing: AtomicBool::new(false),
        }
    }

    /// Get the client configuration
    pub fn config(&self) -> &BankConfig {
        &self.config
    }

    /// The token store this client reads and updates
    pub fn token_store(&self) -> &Arc<TokenStore> {
        &self.store
    }

    /// `Refreshing` while a token refresh call is in flight
    pub fn refresh_state(&self) -> RefreshState {
        if self.refreshing.load(Ordering::SeqCst) {
            RefreshState::Refreshing
        } else {
            RefreshState::Normal
        }
    }

    /// Send a request and decode a successful JSON body
    pub async fn call<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, Error> {
        self.execute(request).await?.json()
    }

    /// Send a request through the refresh-and-retry protocol. Non-success statuses
    /// come back as errors.
    pub async fn execute(&self, mut request: ApiRequest) -> Result<ApiResponse, Error> {
        request.bearer = self.store.access_token()?;
        let response = self.transport.send(&request).await?;

        if response.status != 401 || request.retried {
            return response.error_for_status();
        }

        let original = Error::from_response(response.status, &response.body);
        match self.refresh_access_token(request.bearer.as_deref()).await {
            Ok(token) => {
                debug!("Retrying {} {} with refreshed token", request.method, request.path);
                request.bearer = Some(token);
                request.retried = true;
                self.transport.send(&request).await?.error_for_status()
            }
            Err(refresh_error) => {
                warn!("Token refresh failed, ending session: {}", refresh_error);
                if let Err(e) = self.store.clear() {
                    warn!("Failed to clear session after refresh failure: {}", e);
                }
                Err(original)
            }
        }
    }

    /// Obtain a usable access token after `rejected` was refused by the server.
    ///
    /// Callers queue on the refresh gate. Whoever gets it first performs the refresh;
    /// later callers see that the stored token moved on and reuse it.
    async fn refresh_access_token(&self, rejected: Option<&str>) -> Result<String, Error> {
        let _gate = self.refresh_gate.lock().await;

        if let Some(current) = self.store.access_token()? {
            if rejected != Some(current.as_str()) {
                debug!("Access token already refreshed by a concurrent request");
                return Ok(current);
            }
        }

        let _refreshing = RefreshingFlag::raise(&self.refreshing);

        let refresh = self.store.refresh_token()?.ok_or_else(|| Error::Unauthorized {
            message: "No refresh token".to_string(),
        })?;

        let request = ApiRequest::post(paths::TOKEN_REFRESH).json(json!({ "refresh": refresh }));
        let tokens: RefreshResponse = self
            .transport
            .send(&request)
            .await?
            .error_for_status()?
            .json()?;

        if tokens.access.is_empty() {
            return Err(Error::Unauthorized {
                message: "Refresh returned an empty access token".to_string(),
            });
        }

        self.store.set_access_token(&tokens.access)?;
        if let Some(rotated) = tokens.refresh.as_deref().filter(|r| !r.is_empty()) {
            self.store.set_refresh_token(rotated)?;
        }
        info!("Access token refreshed");
        Ok(tokens.access)
    }
}

/// Marks the client as `Refreshing` until dropped
struct RefreshingFlag<'a>(&'a AtomicBool);

impl<'a> RefreshingFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for RefreshingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
