//! HTTP client cho Ininal API.
//!
//! Tất cả calls đều blocking; headers bắt chước đúng app iOS của Ininal
//! (User-Agent, Content-Language, ...) vì backend từ chối client lạ.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::auth::AuthExchange;
use super::types::{
    ApiEnvelope, CardAccount, LoginRequest, LoginResult, Transaction, TransactionList,
    UserDetails, VerifyRequest,
};
use crate::config::Config;
use crate::error::{SyncError, SyncResult};
use crate::sync::provider::WalletApi;

/// Base URL của Ininal API (API version nằm trong path từng endpoint)
const BASE_URL: &str = "https://api.ininal.com";

/// Format ngày mà transactions endpoint yêu cầu
const DATE_FORMAT: &str = "%Y/%m/%d";

/// Client cho api.ininal.com.
///
/// Giữ một copy của `Config` vì login body cần credentials và mọi request
/// cần User-Agent build từ app version.
pub struct IninalClient {
    client: reqwest::blocking::Client,
    config: Config,
}

impl IninalClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            config: config.clone(),
        }
    }

    /// Lấy thông tin user hiện tại (tên, email, tổng số dư).
    pub fn user_details(&self, user_token: &str, session_token: &str) -> SyncResult<UserDetails> {
        let url = format!("{}/v3.0/users/{}", BASE_URL, user_token);
        self.get_json(&url, session_token)
    }

    /// Lấy danh sách accounts trong ví cùng access token cho transactions
    /// endpoint.
    pub fn card_account(&self, user_token: &str, session_token: &str) -> SyncResult<CardAccount> {
        let url = format!("{}/v3.2/users/{}/cardaccount", BASE_URL, user_token);
        let body = serde_json::json!({ "deviceId": self.config.device_id });
        self.post_json(&url, session_token, &body)
    }

    /// Lấy lịch sử giao dịch của một account trong khoảng `[start, end]`,
    /// tối đa `limit` records, thứ tự do backend quyết định (mới nhất trước).
    pub fn transactions(
        &self,
        user_token: &str,
        access_token: &str,
        account_number: &str,
        start: NaiveDate,
        end: NaiveDate,
        limit: u32,
    ) -> SyncResult<Vec<Transaction>> {
        let url = format!(
            "{}/v3.1/users/{}/transactions/{}",
            BASE_URL, user_token, account_number
        );
        let body = serde_json::json!({
            "startDate": start.format(DATE_FORMAT).to_string(),
            "endDate": end.format(DATE_FORMAT).to_string(),
            "resultLimit": limit,
        });

        debug!(%account_number, %start, %end, limit, "fetching wallet transactions");
        let list: TransactionList = self.post_json(&url, access_token, &body)?;
        Ok(list.transaction_list)
    }

    fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: &str,
        bearer: &str,
        body: &B,
    ) -> SyncResult<T> {
        let response = self
            .client
            .post(url)
            .headers(self.default_headers())
            .bearer_auth(bearer)
            .json(body)
            .send()?;
        Self::decode(response)
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str, bearer: &str) -> SyncResult<T> {
        let response = self
            .client
            .get(url)
            .headers(self.default_headers())
            .bearer_auth(bearer)
            .send()?;
        Self::decode(response)
    }

    fn default_headers(&self) -> reqwest::header::HeaderMap {
        use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("Content-Language", HeaderValue::from_static("en"));
        headers.insert(
            "Accept-Language",
            HeaderValue::from_static("en-US;q=1.0, ja-US;q=0.9, de-US;q=0.8"),
        );
        if let Ok(agent) = HeaderValue::from_str(&self.config.user_agent()) {
            headers.insert(USER_AGENT, agent);
        }
        headers
    }

    /// Bóc envelope chung `{httpCode, description, response}`.
    ///
    /// Quyết định của caller dựa trên payload (vd. `authStatus`), không phải
    /// HTTP status; status chỉ được giữ lại cho error diagnostics khi body
    /// không parse được hoặc payload trống.
    fn decode<T: DeserializeOwned>(response: reqwest::blocking::Response) -> SyncResult<T> {
        let status = response.status();
        let body = response.text()?;

        let envelope: ApiEnvelope<T> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(SyncError::Api {
                    status: status.as_u16(),
                    message: body.chars().take(200).collect(),
                });
            }
            Err(err) => return Err(SyncError::Decode(err.to_string())),
        };

        match envelope.response {
            Some(payload) => Ok(payload),
            None => Err(SyncError::Api {
                status: envelope.http_code.unwrap_or_else(|| status.as_u16()),
                message: envelope
                    .description
                    .unwrap_or_else(|| "empty response payload".to_string()),
            }),
        }
    }
}

impl WalletApi for IninalClient {
    fn transactions(
        &self,
        user_token: &str,
        access_token: &str,
        account_number: &str,
        start: NaiveDate,
        end: NaiveDate,
        limit: u32,
    ) -> SyncResult<Vec<Transaction>> {
        IninalClient::transactions(self, user_token, access_token, account_number, start, end, limit)
    }
}

impl AuthExchange for IninalClient {
    fn login(&self, login_token: &str, bearer_token: &str) -> SyncResult<LoginResult> {
        let request = LoginRequest {
            password: self.config.password.clone(),
            device_signature: self.config.device_signature.clone(),
            device_id: self.config.device_id.clone(),
            device_name: self.config.device_name.clone(),
            login_credential: self.config.login_credential.clone(),
            app_version: self.config.app_version.clone(),
            token: login_token.to_string(),
        };

        debug!(device_id = %self.config.device_id, "submitting login exchange");
        self.post_json(&format!("{}/v3.0/auth/login", BASE_URL), bearer_token, &request)
    }

    fn verify(
        &self,
        otp: &str,
        challenge_token: &str,
        bearer_token: &str,
    ) -> SyncResult<LoginResult> {
        let request = VerifyRequest {
            otp: otp.to_string(),
            token: challenge_token.to_string(),
        };

        debug!("submitting OTP verify exchange");
        self.post_json(
            &format!("{}/v3.0/auth/login/verify", BASE_URL),
            bearer_token,
            &request,
        )
    }
}
