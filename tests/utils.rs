use k9tx_bank_sdk::{
    models::UserProfile, ApiRequest, ApiResponse, BankClient, BankConfig, Error, MemoryStorage,
    Session, TokenStore, Transport,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[cfg(test)]
pub mod test_utils {
    use super::*;
    use async_trait::async_trait;
    use k9tx_bank_sdk::transport::Method;
    use std::collections::{HashMap, VecDeque};

    pub const TEST_API_URL: &str = "http://bank.test/api";

    type Handler = Arc<dyn Fn(&ApiRequest) -> Result<ApiResponse, Error> + Send + Sync>;

    /// In-process stand-in for the bank API.
    ///
    /// Queued replies for a route are consumed first, then its handler answers.
    /// Unknown routes get a 404. Every request is recorded as sent.
    #[derive(Default)]
    pub struct ScriptedTransport {
        queued: Mutex<HashMap<String, VecDeque<ApiResponse>>>,
        handlers: Mutex<HashMap<String, Handler>>,
        requests: Mutex<Vec<ApiRequest>>,
        delay: Option<Duration>,
    }

    fn route_key(method: Method, path: &str) -> String {
        format!("{} {}", method, path)
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Hold every response for `delay` so concurrent requests overlap
        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        /// Queue one reply for `method path`
        pub fn reply(&self, method: Method, path: &str, status: u16, body: Value) -> &Self {
            self.queued
                .lock()
                .unwrap()
                .entry(route_key(method, path))
                .or_default()
                .push_back(json_response(status, body));
            self
        }

        /// Answer `method path` with `handler` once its queue is empty
        pub fn on<F>(&self, method: Method, path: &str, handler: F) -> &Self
        where
            F: Fn(&ApiRequest) -> Result<ApiResponse, Error> + Send + Sync + 'static,
        {
            let handler: Handler = Arc::new(handler);
            self.handlers
                .lock()
                .unwrap()
                .insert(route_key(method, path), handler);
            self
        }

        pub fn requests(&self) -> Vec<ApiRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub fn requests_to(&self, path: &str) -> Vec<ApiRequest> {
            self.requests()
                .into_iter()
                .filter(|r| r.path == path)
                .collect()
        }

        fn answer(&self, request: &ApiRequest) -> Result<ApiResponse, Error> {
            let key = route_key(request.method, &request.path);

            if let Some(response) = self
                .queued
                .lock()
                .unwrap()
                .get_mut(&key)
                .and_then(VecDeque::pop_front)
            {
                return Ok(response);
            }

            let handler = self.handlers.lock().unwrap().get(&key).cloned();
            match handler {
                Some(handler) => handler(request),
                None => Ok(json_response(404, json!({ "detail": "Not found." }))),
            }
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, Error> {
            self.requests.lock().unwrap().push(request.clone());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.answer(request)
        }
    }

    pub fn json_response(status: u16, body: Value) -> ApiResponse {
        ApiResponse::new(status, serde_json::to_vec(&body).unwrap())
    }

    pub fn test_config() -> BankConfig {
        BankConfig::new(TEST_API_URL)
    }

    pub fn user_json() -> Value {
        json!({
            "id": 7,
            "email": "alice@example.com",
            "username": "alice",
            "phone_number": "+15550100",
            "account_number": "100200300400",
            "balance": "250.00",
            "profile_image": null,
            "profile_image_url": null,
            "is_staff": false
        })
    }

    pub fn test_user() -> UserProfile {
        serde_json::from_value(user_json()).unwrap()
    }

    pub fn login_json(access: &str, refresh: &str) -> Value {
        json!({ "access": access, "refresh": refresh, "user": user_json() })
    }

    pub fn token_invalid_json() -> Value {
        json!({
            "detail": "Given token not valid for any token type",
            "code": "token_not_valid"
        })
    }

    pub fn create_test_client(transport: Arc<ScriptedTransport>) -> (Arc<BankClient>, Arc<TokenStore>) {
        create_test_client_with_config(transport, test_config())
    }

    pub fn create_test_client_with_config(
        transport: Arc<ScriptedTransport>,
        config: BankConfig,
    ) -> (Arc<BankClient>, Arc<TokenStore>) {
        let store = Arc::new(TokenStore::new(Arc::new(MemoryStorage::new())));
        let client = BankClient::with_parts(config, transport, Arc::clone(&store));
        (Arc::new(client), store)
    }

    /// Client whose store already holds `old-access`/`refresh-1` and the test user
    pub fn logged_in_client(transport: Arc<ScriptedTransport>) -> (Arc<BankClient>, Arc<TokenStore>) {
        let (client, store) = create_test_client(transport);
        store
            .set(&Session::new("old-access", "refresh-1").with_user(test_user()))
            .unwrap();
        (client, store)
    }
}
