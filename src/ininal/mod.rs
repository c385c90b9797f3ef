//! Ininal module - client cho Ininal wallet API.
//!
//! Module này chứa:
//! - Kiểu dữ liệu serde cho các request/response của api.ininal.com
//! - HTTP client (login, verify, card account, transaction history)
//! - AuthSession state machine cho flow login hai bước (OTP có điều kiện)

pub mod auth;
pub mod client;
pub mod types;

pub use auth::{AuthExchange, AuthSession, AuthState, LoginOutcome};
pub use client::IninalClient;
pub use types::{AccountInfo, CardAccount, LoginResult, Transaction, UserDetails};
