//! Config - cấu hình bất biến cho cả run.
//!
//! Thay cho global constants: toàn bộ device/app identity và fetch policy
//! nằm trong một struct duy nhất, build một lần từ CLI args rồi chỉ đọc.

/// Tên institution phía PocketSmith (mirror của ví Ininal)
pub const INSTITUTION_NAME: &str = "Ininal";

/// Currency code cho institution và accounts (Turkish Lira)
pub const CURRENCY: &str = "try";

/// Device name mặc định gửi kèm login request
pub const DEFAULT_DEVICE_NAME: &str = "iPhone16,1";

/// App version mặc định (phải khớp version mà Ininal còn chấp nhận)
pub const DEFAULT_APP_VERSION: &str = "3.7.6";

/// Số transaction tối đa fetch cho mỗi account
pub const DEFAULT_TRANSACTION_LIMIT: u32 = 200;

/// Độ dài trailing window của lịch sử giao dịch (tháng)
pub const DEFAULT_HISTORY_MONTHS: u32 = 24;

/// Cấu hình cho một run, bất biến sau khi build.
#[derive(Debug, Clone)]
pub struct Config {
    /// Password của tài khoản Ininal
    pub password: String,
    /// Device ID đã đăng ký với Ininal
    pub device_id: String,
    /// RSA signature tương ứng với device ID
    pub device_signature: String,
    /// Login credential (số điện thoại đăng ký, dạng +90...)
    pub login_credential: String,
    /// Login token cấp sẵn cho device
    pub login_token: String,
    /// Bearer token cho các auth endpoints
    pub bearer_token: String,
    /// Device name gửi kèm login request
    pub device_name: String,
    /// App version gửi kèm login request
    pub app_version: String,
    /// Số transaction tối đa fetch cho mỗi account
    pub transaction_limit: u32,
    /// Độ dài lịch sử (tháng) để fetch
    pub history_months: u32,
}

impl Config {
    /// User-Agent string theo đúng format app iOS của Ininal gửi lên.
    pub fn user_agent(&self) -> String {
        format!(
            "ininal/{} (com.ngier.ininalwallet; build:2; iOS 18.2.0) Alamofire/5.4.4",
            self.app_version
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            password: "123456".into(),
            device_id: "4FE92B1D-9D75-47C0-BD65-C650F8921441".into(),
            device_signature: "sig".into(),
            login_credential: "+905551234567".into(),
            login_token: "login-token".into(),
            bearer_token: "bearer-token".into(),
            device_name: DEFAULT_DEVICE_NAME.into(),
            app_version: DEFAULT_APP_VERSION.into(),
            transaction_limit: DEFAULT_TRANSACTION_LIMIT,
            history_months: DEFAULT_HISTORY_MONTHS,
        }
    }

    #[test]
    fn test_user_agent_carries_app_version() {
        let mut config = test_config();
        config.app_version = "3.7.6".into();
        assert!(config.user_agent().starts_with("ininal/3.7.6 "));
    }

    #[test]
    fn test_default_policy_values() {
        assert_eq!(DEFAULT_TRANSACTION_LIMIT, 200);
        assert_eq!(DEFAULT_HISTORY_MONTHS, 24);
    }
}
