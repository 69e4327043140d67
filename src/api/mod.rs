//! Typed calls for every endpoint of the bank API, implemented on
//! [`BankClient`](crate::client::BankClient).

pub mod accounts;
pub mod auth;
pub mod blogs;
pub mod loans;
pub mod models;
pub mod profile;

/// Endpoint paths, relative to the API base URL
pub mod paths {
    pub const REGISTER: &str = "/auth/register/";
    pub const LOGIN: &str = "/auth/login/";
    pub const PASSWORD_RESET_REQUEST: &str = "/auth/password-reset/request/";
    pub const PASSWORD_RESET_VERIFY: &str = "/auth/password-reset/verify/";
    pub const PASSWORD_CHANGE: &str = "/auth/password/change/";
    pub const TOKEN_REFRESH: &str = "/auth/token/refresh/";
    pub const DEPOSIT: &str = "/auth/deposit/";
    pub const TRANSFER: &str = "/auth/transfer/";
    pub const RESOLVE_ACCOUNT: &str = "/auth/resolve-account/";
    pub const BALANCE: &str = "/auth/balance/";
    pub const TRANSACTIONS: &str = "/auth/transactions/";
    pub const USERS: &str = "/auth/users/";
    pub const ME: &str = "/auth/me/";
    pub const BLOGS: &str = "/auth/blogs/";
    pub const LOANS: &str = "/auth/loans/";

    pub fn blog_comments(blog_id: i64) -> String {
        format!("/auth/blogs/{}/comments/", blog_id)
    }

    pub fn loan_action(loan_id: i64) -> String {
        format!("/auth/loans/{}/action/", loan_id)
    }
}
