//! Error types cho ininal-pocketsmith.
//!
//! Phân loại theo mức độ phục hồi:
//! - `Auth`: login/verify thất bại - fatal, dừng cả run
//! - `Transport`/`Decode`: một HTTP call đơn lẻ thất bại - bỏ qua ở mức
//!   transaction hoặc account rồi đi tiếp
//! - `NotFound`: lookup miss phía PocketSmith - không phải lỗi, trigger
//!   create-on-demand
//! - `Api`: provider trả về HTTP status lỗi (giữ status cho diagnostics)

use thiserror::Error;

/// Error type chính cho các thao tác sync.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Login/verify exchange thất bại (transport hoặc protocol)
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Không gửi được request hoặc không nhận được response
    #[error("transport error: {0}")]
    Transport(String),

    /// Response body không parse được
    #[error("decode error: {0}")]
    Decode(String),

    /// Entity không tồn tại phía PocketSmith
    #[error("{entity} not found: {name}")]
    NotFound { entity: &'static str, name: String },

    /// Provider trả về HTTP status lỗi
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },
}

impl SyncError {
    /// Tạo NotFound error cho PocketSmith account
    pub fn account_not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "account",
            name: name.into(),
        }
    }

    /// Tạo NotFound error cho PocketSmith institution
    pub fn institution_not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "institution",
            name: name.into(),
        }
    }

    /// Check xem đây có phải lookup miss hay không
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Result alias cho các thao tác sync
pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SyncError::Auth("login rejected".into());
        assert_eq!(err.to_string(), "authentication failed: login rejected");

        let err = SyncError::Api {
            status: 500,
            message: "internal error".into(),
        };
        assert_eq!(err.to_string(), "API error 500: internal error");
    }

    #[test]
    fn test_not_found_error() {
        let err = SyncError::account_not_found("Ininal Main");
        assert_eq!(err.to_string(), "account not found: Ininal Main");
        assert!(err.is_not_found());
        assert!(!SyncError::Transport("timeout".into()).is_not_found());
    }
}
