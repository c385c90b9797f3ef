//! CLI definitions và command implementations cho ininal-sync.

pub mod commands;

use clap::{Args, Parser, Subcommand};

use crate::config::{
    DEFAULT_APP_VERSION, DEFAULT_DEVICE_NAME, DEFAULT_HISTORY_MONTHS, DEFAULT_TRANSACTION_LIMIT,
};

/// ininal-sync - Sync Ininal wallet transactions into PocketSmith
#[derive(Parser)]
#[command(name = "ininal-sync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Đồng bộ transactions từ ví Ininal sang PocketSmith
    Sync {
        #[command(flatten)]
        ininal: IninalArgs,

        /// PocketSmith developer API key
        #[arg(long, env = "POCKETSMITH_TOKEN", hide_env_values = true)]
        token: String,

        /// Số transaction tối đa fetch cho mỗi account
        #[arg(long, default_value_t = DEFAULT_TRANSACTION_LIMIT)]
        transaction_limit: u32,

        /// Độ dài lịch sử (tháng) để fetch
        #[arg(long, default_value_t = DEFAULT_HISTORY_MONTHS)]
        history_months: u32,
    },

    /// Liệt kê accounts trong ví (read-only, không ghi gì sang PocketSmith)
    Accounts {
        #[command(flatten)]
        ininal: IninalArgs,
    },
}

/// Credentials và device identity cho Ininal.
///
/// Tất cả đều đọc được từ environment variables để không phải gõ secrets
/// vào shell history.
#[derive(Args)]
pub struct IninalArgs {
    /// Password của tài khoản Ininal (prompt nếu bỏ trống)
    #[arg(long, env = "ININAL_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Device ID đã đăng ký với Ininal
    #[arg(long, env = "ININAL_DEVICE_ID")]
    pub device_id: String,

    /// RSA signature tương ứng với device ID
    #[arg(long, env = "ININAL_DEVICE_SIGNATURE", hide_env_values = true)]
    pub device_signature: String,

    /// Login credential (số điện thoại đăng ký, dạng +90...)
    #[arg(long, env = "ININAL_LOGIN_CREDENTIAL")]
    pub login_credential: String,

    /// Login token cấp sẵn cho device
    #[arg(long, env = "ININAL_LOGIN_TOKEN", hide_env_values = true)]
    pub login_token: String,

    /// Bearer token cho các auth endpoints
    #[arg(long, env = "ININAL_BEARER_TOKEN", hide_env_values = true)]
    pub bearer_token: String,

    /// Device name gửi kèm login request
    #[arg(long, env = "ININAL_DEVICE_NAME", default_value = DEFAULT_DEVICE_NAME)]
    pub device_name: String,

    /// App version gửi kèm login request
    #[arg(long, env = "ININAL_APP_VERSION", default_value = DEFAULT_APP_VERSION)]
    pub app_version: String,
}
