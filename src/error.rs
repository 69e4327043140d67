use serde_json::Value;
use thiserror::Error;

/// Message shown when neither the server nor the transport gave anything better.
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// SDK Error type
#[derive(Error, Debug)]
pub enum Error {
    /// Input rejected before any request was sent
    #[error("Validation error: {0}")]
    Validation(String),

    /// The server rejected the credentials (HTTP 401)
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Any other non-success HTTP status with the message the server supplied
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Transport level failure (connection refused, timeout, TLS, ...)
    #[error("Network error: {0}")]
    Network(String),

    /// Persisted session storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build the error for a non-success response from its status and raw body.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<Value>(body)
            .ok()
            .and_then(|value| server_message(&value))
            .unwrap_or_else(|| default_status_message(status).to_string());

        if status == 401 {
            Error::Unauthorized { message }
        } else {
            Error::Api { status, message }
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Unauthorized { .. })
    }

    /// HTTP status carried by the error, if it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Unauthorized { .. } => Some(401),
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The text to put in front of a user: validation and server messages verbatim,
    /// a generic fallback for everything else.
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation(message)
            | Error::Unauthorized { message }
            | Error::Api { message, .. } => message.clone(),
            Error::Network(_) => "Unable to reach the bank. Check your connection.".to_string(),
            _ => GENERIC_FAILURE.to_string(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Network(err.to_string())
    }
}

/// Pull a human readable message out of an error body.
///
/// The API answers with `{"error": ".."}`, `{"detail": ".."}` or field errors such as
/// `{"amount": ["Ensure this value is greater than or equal to 0.01."]}`. Field errors
/// are searched in key order.
pub fn server_message(body: &Value) -> Option<String> {
    let object = body.as_object()?;

    for key in ["error", "detail", "message"] {
        if let Some(text) = object.get(key).and_then(first_text) {
            return Some(text);
        }
    }

    object
        .iter()
        .find_map(|(field, value)| first_text(value).map(|text| format!("{}: {}", field, text)))
}

fn first_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Array(items) => items.iter().find_map(first_text),
        Value::Object(_) => server_message(value),
        _ => None,
    }
}

fn default_status_message(status: u16) -> &'static str {
    match status {
        400 => "The request was rejected",
        401 => "Authentication required",
        403 => "Forbidden",
        404 => "Not found",
        500..=599 => "The bank is unavailable right now",
        _ => GENERIC_FAILURE,
    }
}
