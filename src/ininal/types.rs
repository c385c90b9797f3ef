//! Kiểu dữ liệu cho Ininal API.
//!
//! Mọi response đều được bọc trong một envelope chung
//! `{httpCode, description, response}`; field names phía wire là camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Envelope chung của mọi Ininal response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiEnvelope<T> {
    /// HTTP code mà backend tự báo (không phải lúc nào cũng khớp status thật)
    #[serde(default)]
    pub http_code: Option<u16>,
    /// Mô tả kết quả, dùng cho error messages
    #[serde(default)]
    pub description: Option<String>,
    /// Payload thật; `None` khi backend trả lỗi
    #[serde(default)]
    pub response: Option<T>,
}

/// Body của `POST /v3.0/auth/login`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub password: String,
    pub device_signature: String,
    pub device_id: String,
    pub device_name: String,
    pub login_credential: String,
    pub app_version: String,
    /// Login token cấp sẵn cho device
    pub token: String,
}

/// Body của `POST /v3.0/auth/login/verify`.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyRequest {
    pub otp: String,
    /// Challenge token nhận được từ bước login
    pub token: String,
}

/// Payload của login và verify response.
///
/// `auth_status` quyết định bước tiếp theo: `"OTP_REQUIRED"` nghĩa là `token`
/// là challenge token cho bước verify; mọi giá trị khác nghĩa là `token` đã
/// là session token dùng được ngay.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginResult {
    pub auth_status: String,
    pub token: String,
    pub user_token: String,
}

/// Thông tin user (GET /v3.0/users/{userToken}).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserDetails {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub gsm_number: String,
    pub user_status_text: String,
    pub total_active_card_balance: f64,
}

/// Card account response (POST /v3.2/users/{userToken}/cardaccount).
///
/// `access_token` là token riêng cho transactions endpoint, scope theo
/// card account chứ không phải session.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CardAccount {
    pub account_list_response: Vec<AccountInfo>,
    pub access_token: String,
}

/// Một account trong ví.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountInfo {
    pub account_number: String,
    pub account_name: String,
    pub account_status: String,
    pub account_balance: f64,
    pub currency: String,
    pub iban: String,
}

/// Một giao dịch trong lịch sử của account.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub transaction_date: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
    /// Reference number do Ininal cấp - dedup key chính; có thể rỗng
    #[serde(default)]
    pub reference_no: String,
    pub amount: f64,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub transaction_type: String,
}

/// Payload của transactions response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransactionList {
    pub transaction_list: Vec<Transaction>,
}
