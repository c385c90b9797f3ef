//! Provider seams - interface giữa SyncEngine và hai services bên ngoài.
//!
//! Engine chỉ nói chuyện qua hai traits này; implementations thật là
//! `IninalClient` và `PocketsmithClient`, trong tests là mocks in-memory.

use chrono::NaiveDate;

use crate::config::{DEFAULT_HISTORY_MONTHS, DEFAULT_TRANSACTION_LIMIT};
use crate::error::SyncResult;
use crate::ininal::types::Transaction;
use crate::pocketsmith::types::{
    Account, CreateTransaction, Institution, LedgerTransaction, TransactionAccount,
};

/// Phía nguồn: chỉ cần đọc transaction history (danh sách accounts do
/// driver fetch một lần rồi đưa vào engine).
pub trait WalletApi {
    /// Lịch sử giao dịch của một account trong `[start, end]`, tối đa
    /// `limit` records, giữ nguyên thứ tự provider trả về.
    fn transactions(
        &self,
        user_token: &str,
        access_token: &str,
        account_number: &str,
        start: NaiveDate,
        end: NaiveDate,
        limit: u32,
    ) -> SyncResult<Vec<Transaction>>;
}

/// Phía đích: lookup/create accounts và transactions trong PocketSmith.
///
/// `find_*` trả `SyncError::NotFound` khi miss - caller dùng nó để
/// create-on-demand, không coi là lỗi.
pub trait LedgerApi {
    fn find_account_by_name(&self, user_id: i64, name: &str) -> SyncResult<Account>;

    fn find_institution_by_name(&self, user_id: i64, title: &str) -> SyncResult<Institution>;

    fn create_institution(
        &self,
        user_id: i64,
        title: &str,
        currency_code: &str,
    ) -> SyncResult<Institution>;

    fn create_account(
        &self,
        user_id: i64,
        institution_id: i64,
        title: &str,
        currency_code: &str,
    ) -> SyncResult<Account>;

    fn update_account_balance(
        &self,
        transaction_account_id: i64,
        institution_id: i64,
        balance: f64,
        as_of: NaiveDate,
    ) -> SyncResult<TransactionAccount>;

    fn search_transactions(
        &self,
        transaction_account_id: i64,
        start: NaiveDate,
        end: NaiveDate,
        search: &str,
    ) -> SyncResult<Vec<LedgerTransaction>>;

    fn add_transaction(
        &self,
        transaction_account_id: i64,
        transaction: &CreateTransaction,
    ) -> SyncResult<LedgerTransaction>;
}

/// Fetch policy cho một run.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Số transaction tối đa fetch cho mỗi account
    pub transaction_limit: u32,
    /// Trailing window của lịch sử (tháng)
    pub history_months: u32,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            transaction_limit: DEFAULT_TRANSACTION_LIMIT,
            history_months: DEFAULT_HISTORY_MONTHS,
        }
    }
}

/// Kết quả sync của một account.
#[derive(Debug, Clone, Default)]
pub struct AccountSummary {
    /// Tên account phía ví
    pub account_name: String,
    /// Tên account mirror phía PocketSmith
    pub ledger_account_name: String,
    /// Balance đã push sang PocketSmith
    pub balance: f64,
    /// Số transaction fetch được từ ví
    pub fetched: usize,
    /// Số transaction mới tạo
    pub created: usize,
    /// Số transaction đã tồn tại (repeat counter cuối loop)
    pub skipped_existing: usize,
    /// Số transaction lỗi (search hoặc create) đã bỏ qua
    pub failed: usize,
    /// Loop dừng sớm vì lịch sử bắt đầu lặp lại
    pub early_exit: bool,
    /// Lỗi khiến account này bị bỏ dở (fetch/balance/account setup)
    pub error: Option<String>,
}

impl AccountSummary {
    pub fn new(account_name: &str) -> Self {
        Self {
            account_name: account_name.to_string(),
            ..Default::default()
        }
    }
}

/// Kết quả của cả run, một entry cho mỗi wallet account.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub accounts: Vec<AccountSummary>,
}

impl SyncReport {
    pub fn total_created(&self) -> usize {
        self.accounts.iter().map(|account| account.created).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.accounts
            .iter()
            .map(|account| account.skipped_existing)
            .sum()
    }

    pub fn has_failures(&self) -> bool {
        self.accounts
            .iter()
            .any(|account| account.failed > 0 || account.error.is_some())
    }
}
