pub mod auth;
pub mod blogs;
pub mod loans;
pub mod money;
pub mod profile;
