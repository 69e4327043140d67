pub mod api;
pub mod client;
pub mod comments;
pub mod config;
pub mod error;
pub mod session;
pub mod sync;
pub mod transport;
pub mod validation;

pub use api::blogs::FeedEntry;
pub use api::models;
pub use client::{BankClient, RefreshState};
pub use comments::CommentThread;
pub use config::BankConfig;
pub use error::Error;
pub use session::{FileStorage, KeyValueStorage, MemoryStorage, Session, SessionContext, TokenStore};
pub use sync::{
    AccountResolver, BalanceWatcher, BlogFeedWatcher, LookupOutcome, LookupResult, SyncEvent,
};
pub use transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport};

// Amounts throughout the API are exact decimals
pub use rust_decimal::Decimal;
