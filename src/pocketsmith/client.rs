//! HTTP client cho PocketSmith REST API v2.
//!
//! Authentication qua developer key (header `X-Developer-Key`). Mọi lookup
//! miss được map thành `SyncError::NotFound` để caller phân biệt được với
//! lỗi thật - "chưa có account" là chuyện bình thường, trigger create.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::types::{
    Account, CreateTransaction, Institution, LedgerTransaction, TransactionAccount, User,
    ACCOUNT_TYPE_CREDITS,
};
use crate::error::{SyncError, SyncResult};
use crate::sync::provider::LedgerApi;

const BASE_URL: &str = "https://api.pocketsmith.com/v2";

/// Client cho api.pocketsmith.com.
pub struct PocketsmithClient {
    client: reqwest::blocking::Client,
    token: String,
}

impl PocketsmithClient {
    pub fn new(token: &str) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            token: token.to_string(),
        }
    }

    /// User gắn với developer key (GET /me).
    pub fn current_user(&self) -> SyncResult<User> {
        self.execute(self.client.get(format!("{}/me", BASE_URL)))
    }

    /// Tất cả accounts của user.
    pub fn accounts(&self, user_id: i64) -> SyncResult<Vec<Account>> {
        self.execute(
            self.client
                .get(format!("{}/users/{}/accounts", BASE_URL, user_id)),
        )
    }

    /// Tìm account theo title (exact match); miss → `NotFound`.
    pub fn find_account_by_name(&self, user_id: i64, name: &str) -> SyncResult<Account> {
        self.accounts(user_id)?
            .into_iter()
            .find(|account| account.title == name)
            .ok_or_else(|| SyncError::account_not_found(name))
    }

    /// Tất cả institutions của user.
    pub fn institutions(&self, user_id: i64) -> SyncResult<Vec<Institution>> {
        self.execute(
            self.client
                .get(format!("{}/users/{}/institutions", BASE_URL, user_id)),
        )
    }

    /// Tìm institution theo title (exact match); miss → `NotFound`.
    pub fn find_institution_by_name(&self, user_id: i64, title: &str) -> SyncResult<Institution> {
        self.institutions(user_id)?
            .into_iter()
            .find(|institution| institution.title == title)
            .ok_or_else(|| SyncError::institution_not_found(title))
    }

    pub fn create_institution(
        &self,
        user_id: i64,
        title: &str,
        currency_code: &str,
    ) -> SyncResult<Institution> {
        #[derive(Serialize)]
        struct CreateInstitutionRequest<'a> {
            title: &'a str,
            currency_code: &'a str,
        }

        debug!(%title, "creating PocketSmith institution");
        self.execute(
            self.client
                .post(format!("{}/users/{}/institutions", BASE_URL, user_id))
                .json(&CreateInstitutionRequest {
                    title,
                    currency_code,
                }),
        )
    }

    pub fn create_account(
        &self,
        user_id: i64,
        institution_id: i64,
        title: &str,
        currency_code: &str,
    ) -> SyncResult<Account> {
        #[derive(Serialize)]
        struct CreateAccountRequest<'a> {
            institution_id: i64,
            title: &'a str,
            currency_code: &'a str,
            #[serde(rename = "type")]
            account_type: &'a str,
        }

        debug!(%title, institution_id, "creating PocketSmith account");
        self.execute(
            self.client
                .post(format!("{}/users/{}/accounts", BASE_URL, user_id))
                .json(&CreateAccountRequest {
                    institution_id,
                    title,
                    currency_code,
                    account_type: ACCOUNT_TYPE_CREDITS,
                }),
        )
    }

    /// Ghi balance snapshot "tính đến ngày" vào transaction account.
    pub fn update_account_balance(
        &self,
        transaction_account_id: i64,
        institution_id: i64,
        balance: f64,
        as_of: NaiveDate,
    ) -> SyncResult<TransactionAccount> {
        #[derive(Serialize)]
        struct UpdateBalanceRequest {
            institution_id: i64,
            current_balance: f64,
            current_balance_date: String,
        }

        self.execute(
            self.client
                .put(format!(
                    "{}/transaction_accounts/{}",
                    BASE_URL, transaction_account_id
                ))
                .json(&UpdateBalanceRequest {
                    institution_id,
                    current_balance: balance,
                    current_balance_date: as_of.format("%Y-%m-%d").to_string(),
                }),
        )
    }

    /// Query transactions đã có trong một date range (search substring có
    /// thể rỗng - backend trả mọi transaction trong range).
    pub fn search_transactions(
        &self,
        transaction_account_id: i64,
        start: NaiveDate,
        end: NaiveDate,
        search: &str,
    ) -> SyncResult<Vec<LedgerTransaction>> {
        self.execute(
            self.client
                .get(format!(
                    "{}/transaction_accounts/{}/transactions",
                    BASE_URL, transaction_account_id
                ))
                .query(&[
                    ("start_date", start.format("%Y-%m-%d").to_string()),
                    ("end_date", end.format("%Y-%m-%d").to_string()),
                    ("search", search.to_string()),
                ]),
        )
    }

    pub fn add_transaction(
        &self,
        transaction_account_id: i64,
        transaction: &CreateTransaction,
    ) -> SyncResult<LedgerTransaction> {
        self.execute(
            self.client
                .post(format!(
                    "{}/transaction_accounts/{}/transactions",
                    BASE_URL, transaction_account_id
                ))
                .json(transaction),
        )
    }

    fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::blocking::RequestBuilder,
    ) -> SyncResult<T> {
        let response = request
            .header("X-Developer-Key", &self.token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(SyncError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let body = response.text()?;
        serde_json::from_str(&body).map_err(|err| SyncError::Decode(err.to_string()))
    }
}

impl LedgerApi for PocketsmithClient {
    fn find_account_by_name(&self, user_id: i64, name: &str) -> SyncResult<Account> {
        PocketsmithClient::find_account_by_name(self, user_id, name)
    }

    fn find_institution_by_name(&self, user_id: i64, title: &str) -> SyncResult<Institution> {
        PocketsmithClient::find_institution_by_name(self, user_id, title)
    }

    fn create_institution(
        &self,
        user_id: i64,
        title: &str,
        currency_code: &str,
    ) -> SyncResult<Institution> {
        PocketsmithClient::create_institution(self, user_id, title, currency_code)
    }

    fn create_account(
        &self,
        user_id: i64,
        institution_id: i64,
        title: &str,
        currency_code: &str,
    ) -> SyncResult<Account> {
        PocketsmithClient::create_account(self, user_id, institution_id, title, currency_code)
    }

    fn update_account_balance(
        &self,
        transaction_account_id: i64,
        institution_id: i64,
        balance: f64,
        as_of: NaiveDate,
    ) -> SyncResult<TransactionAccount> {
        PocketsmithClient::update_account_balance(
            self,
            transaction_account_id,
            institution_id,
            balance,
            as_of,
        )
    }

    fn search_transactions(
        &self,
        transaction_account_id: i64,
        start: NaiveDate,
        end: NaiveDate,
        search: &str,
    ) -> SyncResult<Vec<LedgerTransaction>> {
        PocketsmithClient::search_transactions(self, transaction_account_id, start, end, search)
    }

    fn add_transaction(
        &self,
        transaction_account_id: i64,
        transaction: &CreateTransaction,
    ) -> SyncResult<LedgerTransaction> {
        PocketsmithClient::add_transaction(self, transaction_account_id, transaction)
    }
}
