//! PocketSmith module - client cho PocketSmith REST API v2.
//!
//! PocketSmith là đích sync: mỗi account trong ví được mirror thành một
//! transaction account nằm dưới institution "Ininal", tạo lazy khi chưa có.

pub mod client;
pub mod types;

pub use client::PocketsmithClient;
pub use types::{Account, CreateTransaction, Institution, LedgerTransaction, TransactionAccount, User};
