//! Client-held session: persisted tokens, cached profile and the context that
//! exposes them.

pub mod context;
pub mod storage;
pub mod store;

pub use context::SessionContext;
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use store::{Session, TokenStore};
