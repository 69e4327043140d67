//! Wire types of the bank API.
//!
//! Field names follow the JSON the server emits. Amounts are exact decimals; the
//! server renders them as strings and the client accepts strings or numbers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Cached snapshot of the logged-in user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub account_number: String,
    #[serde(default)]
    pub balance: Decimal,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    #[serde(default)]
    pub is_staff: bool,
}

/// Response of `POST /auth/login/`
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub user: UserProfile,
}

/// Response of `POST /auth/token/refresh/`; `refresh` is present when the server rotates it
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Body of `POST /auth/register/`
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password2: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

/// Body of `POST /auth/password-reset/verify/`
#[derive(Debug, Clone, Serialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
    pub new_password: String,
}

/// Plain acknowledgement. Endpoints use `message` or `success` for the happy path.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub success: Option<String>,
}

impl MessageResponse {
    /// The acknowledgement text, or `fallback` when the server sent none
    pub fn text_or(&self, fallback: &str) -> String {
        self.success
            .clone()
            .or_else(|| self.message.clone())
            .unwrap_or_else(|| fallback.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DepositResponse {
    #[serde(default)]
    pub success: Option<String>,
    pub balance: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Balance {
    pub balance: Decimal,
}

/// Owner of an account number, as returned by `GET /auth/resolve-account/`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResolvedAccount {
    pub account_number: String,
    pub username: String,
    pub email: String,
}

/// Entry of `GET /auth/users/` (every user except the caller)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserSummary {
    pub username: String,
    pub email: String,
    pub account_number: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    Deposit,
    Transfer,
    Loan,
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            TransactionKind::Deposit => "Deposit",
            TransactionKind::Transfer => "Transfer",
            TransactionKind::Loan => "Loan",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Transaction {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(default)]
    pub from_user: Option<i64>,
    #[serde(default)]
    pub to_user: Option<i64>,
    #[serde(default)]
    pub from_username: Option<String>,
    #[serde(default)]
    pub to_username: Option<String>,
    pub amount: Decimal,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Blog {
    pub id: i64,
    pub author: i64,
    pub author_username: String,
    #[serde(default)]
    pub author_profile_image_url: Option<String>,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// A comment with its replies; the server nests one level deep
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub author: i64,
    pub author_username: String,
    #[serde(default)]
    pub author_profile_image_url: Option<String>,
    pub content: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub parent: Option<i64>,
    #[serde(default)]
    pub replies: Vec<Comment>,
}

/// File uploaded in a multipart form (blog image, profile picture)
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Read a file from disk, keeping only its final path component as the upload name
    pub async fn from_path(path: &std::path::Path) -> Result<Self, crate::Error> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self { file_name, bytes })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBlog {
    pub title: String,
    pub content: String,
    pub image: Option<Attachment>,
}

/// Partial update of the caller's profile; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub phone_number: Option<String>,
    pub profile_image: Option<Attachment>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.phone_number.is_none() && self.profile_image.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LoanStatus {
    Pending,
    Approved,
    Rejected,
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            LoanStatus::Pending => "PENDING",
            LoanStatus::Approved => "APPROVED",
            LoanStatus::Rejected => "REJECTED",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Loan {
    pub id: i64,
    pub applicant: i64,
    #[serde(default)]
    pub applicant_username: Option<String>,
    pub amount: Decimal,
    pub term_months: u32,
    #[serde(default)]
    pub purpose: String,
    pub interest_rate: Decimal,
    pub status: LoanStatus,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub approved_by: Option<i64>,
}

/// Body of `POST /auth/loans/`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoanApplication {
    pub amount: Decimal,
    pub term_months: u32,
    pub purpose: String,
    pub interest_rate: Decimal,
}

impl LoanApplication {
    /// Interest rate offered when the applicant does not pick one
    pub fn default_interest_rate() -> Decimal {
        Decimal::new(1000, 2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanAction {
    Approve,
    Reject,
}

/// Timestamps arrive as RFC 3339, or without an offset when the server runs with
/// naive datetimes; the latter are taken as UTC.
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{de, Deserialize, Deserializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            })
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp '{}'", raw)))
    }

    pub mod option {
        use super::*;

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => parse(&raw)
                    .map(Some)
                    .ok_or_else(|| de::Error::custom(format!("invalid timestamp '{}'", raw))),
                None => Ok(None),
            }
        }
    }
}
