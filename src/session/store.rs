use std::sync::Arc;

use tracing::{debug, warn};

use super::storage::KeyValueStorage;
use crate::api::models::UserProfile;
use crate::error::Error;

/// Storage key of the access token
pub const ACCESS_TOKEN_KEY: &str = "token";
/// Storage key of the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
/// Storage key of the serialized user profile
pub const USER_KEY: &str = "user";

/// Tokens plus the cached profile of whoever is logged in
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub user: Option<UserProfile>,
}

impl Session {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: Some(refresh_token.into()),
            user: None,
        }
    }

    pub fn with_user(mut self, user: UserProfile) -> Self {
        self.user = Some(user);
        self
    }
}

/// Persisted session state under three fixed keys.
///
/// The store never tracks expiry; a token is only known to be bad once the
/// server rejects it.
pub struct TokenStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Current session. Without an access token there is no session, whatever
    /// else is cached.
    pub fn get(&self) -> Result<Option<Session>, Error> {
        let access_token = match self.access_token()? {
            Some(token) => token,
            None => return Ok(None),
        };

        Ok(Some(Session {
            access_token,
            refresh_token: self.refresh_token()?,
            user: self.cached_user()?,
        }))
    }

    /// Replace the whole session
    pub fn set(&self, session: &Session) -> Result<(), Error> {
        self.storage.set_item(ACCESS_TOKEN_KEY, &session.access_token)?;
        match &session.refresh_token {
            Some(refresh) => self.storage.set_item(REFRESH_TOKEN_KEY, refresh)?,
            None => self.storage.remove_item(REFRESH_TOKEN_KEY)?,
        }
        match &session.user {
            Some(user) => self.set_user(user)?,
            None => self.storage.remove_item(USER_KEY)?,
        }
        debug!("Session stored");
        Ok(())
    }

    /// Drop every key of the session
    pub fn clear(&self) -> Result<(), Error> {
        self.storage.remove_item(ACCESS_TOKEN_KEY)?;
        self.storage.remove_item(REFRESH_TOKEN_KEY)?;
        self.storage.remove_item(USER_KEY)?;
        debug!("Session cleared");
        Ok(())
    }

    pub fn access_token(&self) -> Result<Option<String>, Error> {
        Ok(self
            .storage
            .get_item(ACCESS_TOKEN_KEY)?
            .filter(|token| !token.is_empty()))
    }

    pub fn refresh_token(&self) -> Result<Option<String>, Error> {
        Ok(self
            .storage
            .get_item(REFRESH_TOKEN_KEY)?
            .filter(|token| !token.is_empty()))
    }

    pub fn set_access_token(&self, token: &str) -> Result<(), Error> {
        self.storage.set_item(ACCESS_TOKEN_KEY, token)
    }

    pub fn set_refresh_token(&self, token: &str) -> Result<(), Error> {
        self.storage.set_item(REFRESH_TOKEN_KEY, token)
    }

    /// The cached profile; an unreadable document counts as absent
    pub fn cached_user(&self) -> Result<Option<UserProfile>, Error> {
        let raw = match self.storage.get_item(USER_KEY)? {
            Some(raw) => raw,
            None => return Ok(None),
        };

        match serde_json::from_str(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                warn!("Ignoring unreadable cached user: {}", e);
                Ok(None)
            }
        }
    }

    pub fn set_user(&self, user: &UserProfile) -> Result<(), Error> {
        let json = serde_json::to_string(user)?;
        self.storage.set_item(USER_KEY, &json)
    }

    /// Apply `change` to the cached profile and write it back. Returns the updated
    /// profile, or `None` when nothing is cached.
    pub fn update_user<F>(&self, change: F) -> Result<Option<UserProfile>, Error>
    where
        F: FnOnce(&mut UserProfile),
    {
        let mut user = match self.cached_user()? {
            Some(user) => user,
            None => return Ok(None),
        };
        change(&mut user);
        self.set_user(&user)?;
        Ok(Some(user))
    }
}
