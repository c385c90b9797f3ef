//! SyncEngine - reconciliation loop per-account.
//!
//! Chạy sau khi auth xong: với mỗi account trong ví, tìm/tạo account mirror
//! phía PocketSmith, push balance snapshot, fetch lịch sử giao dịch trong
//! trailing window rồi dedup từng transaction trước khi tạo. Tuần tự hoàn
//! toàn - không có gì chạy song song vì mỗi quyết định dedup phải thấy
//! ledger state nhất quán và cả hai API đều rate-limit theo session.
//!
//! Failure granularity: lỗi của một transaction chỉ bỏ transaction đó, lỗi
//! fetch/balance/setup của một account chỉ bỏ account đó; không gì ở đây
//! dừng được cả run.

use chrono::{Months, Utc};
use tracing::{debug, info, warn};

use super::dedup::DedupMatcher;
use super::provider::{AccountSummary, LedgerApi, SyncOptions, SyncReport, WalletApi};
use crate::config::{CURRENCY, INSTITUTION_NAME};
use crate::error::SyncResult;
use crate::ininal::types::{AccountInfo, Transaction};
use crate::pocketsmith::types::{Account, CreateTransaction};

/// Ngưỡng repeat: khi số transaction đã-tồn-tại trong một account vượt quá
/// giá trị này, phần còn lại (cũ hơn) được coi là đã sync từ run trước.
/// Heuristic, không phải proof - nếu provider trả lịch sử không đúng thứ tự
/// thời gian thì transaction mới có thể bị bỏ sót.
const REPEAT_LIMIT: usize = 10;

/// Marker trong transactionType đánh dấu bank transfer
const TRANSFER_TYPE_MARKER: &str = "Banka Transferi";

/// Tên account mirror phía PocketSmith cho một account trong ví.
pub fn ledger_account_name(account_name: &str) -> String {
    format!("{} {}", INSTITUTION_NAME, account_name.trim())
}

/// Engine reconciliation, generic trên hai provider seams.
pub struct SyncEngine<'a, W: WalletApi, L: LedgerApi> {
    wallet: &'a W,
    ledger: &'a L,
    /// PocketSmith user id (chủ của accounts/institutions)
    ledger_user_id: i64,
    /// User token từ AuthSession
    user_token: String,
    /// Access token scope theo card account, từ cardaccount response
    access_token: String,
    options: SyncOptions,
}

impl<'a, W: WalletApi, L: LedgerApi> SyncEngine<'a, W, L> {
    pub fn new(
        wallet: &'a W,
        ledger: &'a L,
        ledger_user_id: i64,
        user_token: &str,
        access_token: &str,
        options: SyncOptions,
    ) -> Self {
        Self {
            wallet,
            ledger,
            ledger_user_id,
            user_token: user_token.to_string(),
            access_token: access_token.to_string(),
            options,
        }
    }

    /// Sync lần lượt từng account; không account nào dừng được account khác.
    pub fn run(&self, accounts: &[AccountInfo]) -> SyncReport {
        let mut report = SyncReport::default();

        for account in accounts {
            info!(account = %account.account_name, "syncing account");
            let summary = self.sync_account(account);
            if let Some(error) = &summary.error {
                warn!(account = %account.account_name, %error, "account aborted");
            }
            report.accounts.push(summary);
        }

        report
    }

    fn sync_account(&self, account: &AccountInfo) -> AccountSummary {
        let name = ledger_account_name(&account.account_name);
        let mut summary = AccountSummary::new(&account.account_name);
        summary.ledger_account_name = name.clone();
        summary.balance = account.account_balance;

        let ledger_account = match self.find_or_create_account(&name) {
            Ok(ledger_account) => ledger_account,
            Err(err) => {
                summary.error = Some(err.to_string());
                return summary;
            }
        };
        let transaction_account_id = ledger_account.primary_transaction_account.id;
        let institution_id = ledger_account.primary_transaction_account.institution.id;

        // Balance snapshot tính đến hôm nay, không phải transaction
        let today = Utc::now().date_naive();
        if let Err(err) = self.ledger.update_account_balance(
            transaction_account_id,
            institution_id,
            account.account_balance,
            today,
        ) {
            summary.error = Some(err.to_string());
            return summary;
        }
        debug!(balance = account.account_balance, "pushed balance snapshot");

        let start = today
            .checked_sub_months(Months::new(self.options.history_months))
            .unwrap_or(today);
        let transactions = match self.wallet.transactions(
            &self.user_token,
            &self.access_token,
            &account.account_number,
            start,
            today,
            self.options.transaction_limit,
        ) {
            Ok(transactions) => transactions,
            Err(err) => {
                summary.error = Some(err.to_string());
                return summary;
            }
        };
        summary.fetched = transactions.len();

        // Thứ tự provider trả về được giữ nguyên (mới nhất trước) - repeat
        // counter dựa trên assumption đó
        let matcher = DedupMatcher::new(self.ledger);
        for txn in &transactions {
            if summary.skipped_existing > REPEAT_LIMIT {
                info!(
                    account = %account.account_name,
                    "too many repeated existing transactions, stopping early"
                );
                summary.early_exit = true;
                break;
            }

            match matcher.exists(transaction_account_id, txn) {
                Ok(true) => {
                    debug!(reference = %txn.reference_no, "already synced, skipping");
                    summary.skipped_existing += 1;
                    continue;
                }
                Ok(false) => {}
                Err(err) => {
                    warn!(reference = %txn.reference_no, error = %err, "dedup query failed");
                    summary.failed += 1;
                    continue;
                }
            }

            let entry = build_entry(txn);
            match self.ledger.add_transaction(transaction_account_id, &entry) {
                Ok(_) => {
                    debug!(payee = %entry.payee, date = %entry.date, "created ledger transaction");
                    summary.created += 1;
                }
                Err(err) => {
                    warn!(reference = %txn.reference_no, error = %err, "create failed");
                    summary.failed += 1;
                }
            }
        }

        summary
    }

    /// Lấy account mirror, tạo lazy cả institution lẫn account khi chưa có.
    fn find_or_create_account(&self, name: &str) -> SyncResult<Account> {
        match self.ledger.find_account_by_name(self.ledger_user_id, name) {
            Ok(account) => Ok(account),
            Err(err) if err.is_not_found() => {
                let institution = match self
                    .ledger
                    .find_institution_by_name(self.ledger_user_id, INSTITUTION_NAME)
                {
                    Ok(institution) => institution,
                    Err(err) if err.is_not_found() => self.ledger.create_institution(
                        self.ledger_user_id,
                        INSTITUTION_NAME,
                        CURRENCY,
                    )?,
                    Err(err) => return Err(err),
                };

                info!(account = %name, "creating ledger account");
                self.ledger
                    .create_account(self.ledger_user_id, institution.id, name, CURRENCY)
            }
            Err(err) => Err(err),
        }
    }
}

/// Build ledger entry từ một wallet transaction. Reference number nằm ở cả
/// `memo` lẫn `cheque_number` - các run sau dedup dựa trên redundancy này.
fn build_entry(txn: &Transaction) -> CreateTransaction {
    CreateTransaction {
        payee: txn.description.trim().to_string(),
        amount: txn.amount,
        date: txn.transaction_date.format("%Y-%m-%d").to_string(),
        is_transfer: txn.transaction_type.contains(TRANSFER_TYPE_MARKER),
        cheque_number: txn.reference_no.clone(),
        note: txn.transaction_type.clone(),
        memo: txn.reference_no.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::testing::{ledger_entry, wallet_txn, MockLedger, MockWallet};

    fn wallet_account(number: &str, name: &str, balance: f64) -> AccountInfo {
        AccountInfo {
            account_number: number.to_string(),
            account_name: name.to_string(),
            account_status: "ACTIVE".to_string(),
            account_balance: balance,
            currency: "TRY".to_string(),
            iban: String::new(),
        }
    }

    fn engine<'a>(wallet: &'a MockWallet, ledger: &'a MockLedger) -> SyncEngine<'a, MockWallet, MockLedger> {
        SyncEngine::new(wallet, ledger, 1, "user-token", "access-token", SyncOptions::default())
    }

    #[test]
    fn test_first_run_creates_account_balance_and_transaction() {
        let wallet = MockWallet::new();
        let ledger = MockLedger::new();
        wallet.seed(
            "1234",
            vec![wallet_txn("2024-01-10", "Coffee Shop", "REF1", -15.0)],
        );

        let report = engine(&wallet, &ledger).run(&[wallet_account("1234", "Main", 120.5)]);

        // Institution và account mirror được tạo lazy
        assert_eq!(ledger.institution_titles(), vec!["Ininal".to_string()]);
        assert_eq!(ledger.account_titles(), vec!["Ininal Main".to_string()]);

        // Balance snapshot push đúng một lần
        let balance_updates = ledger.balance_updates();
        assert_eq!(balance_updates.len(), 1);
        assert_eq!(balance_updates[0].1, 120.5);

        // Một transaction mới với reference ở cả memo lẫn cheque_number
        let created = ledger.created();
        assert_eq!(created.len(), 1);
        let entry = &created[0].1;
        assert_eq!(entry.payee, "Coffee Shop");
        assert_eq!(entry.amount, -15.0);
        assert_eq!(entry.date, "2024-01-10");
        assert_eq!(entry.memo, "REF1");
        assert_eq!(entry.cheque_number, "REF1");
        assert!(!entry.is_transfer);

        assert_eq!(report.accounts.len(), 1);
        assert_eq!(report.accounts[0].created, 1);
        assert_eq!(report.accounts[0].skipped_existing, 0);
        assert!(report.accounts[0].error.is_none());
    }

    #[test]
    fn test_existing_reference_is_not_recreated() {
        let wallet = MockWallet::new();
        let ledger = MockLedger::new();
        let transaction_account_id = ledger.seed_account("Ininal Main");
        ledger.seed_transaction(
            transaction_account_id,
            ledger_entry("2024-01-10", Some("REF1"), Some("REF1")),
        );
        wallet.seed(
            "1234",
            vec![wallet_txn("2024-01-10", "Coffee Shop", "REF1", -15.0)],
        );

        let report = engine(&wallet, &ledger).run(&[wallet_account("1234", "Main", 120.5)]);

        assert_eq!(ledger.created().len(), 0);
        assert_eq!(report.accounts[0].skipped_existing, 1);
    }

    #[test]
    fn test_second_run_is_idempotent() {
        let wallet = MockWallet::new();
        let ledger = MockLedger::new();
        wallet.seed(
            "1234",
            vec![
                wallet_txn("2024-01-10", "Coffee Shop", "REF1", -15.0),
                wallet_txn("2024-01-09", "Market", "REF2", -42.0),
            ],
        );
        let accounts = [wallet_account("1234", "Main", 120.5)];

        let first = engine(&wallet, &ledger).run(&accounts);
        assert_eq!(first.total_created(), 2);

        // Run thứ hai trên cùng transaction set: không tạo thêm gì
        let second = engine(&wallet, &ledger).run(&accounts);
        assert_eq!(second.total_created(), 0);
        assert_eq!(second.total_skipped(), 2);
        assert_eq!(ledger.created().len(), 2);
    }

    #[test]
    fn test_early_exit_after_repeat_threshold() {
        let wallet = MockWallet::new();
        let ledger = MockLedger::new();
        let transaction_account_id = ledger.seed_account("Ininal Main");

        // 15 transactions, tất cả đã tồn tại từ run trước
        let mut transactions = Vec::new();
        for i in 0..15 {
            let reference = format!("REF{}", i);
            ledger.seed_transaction(
                transaction_account_id,
                ledger_entry("2024-01-10", Some(&reference), None),
            );
            transactions.push(wallet_txn("2024-01-10", "Coffee Shop", &reference, -1.0));
        }
        wallet.seed("1234", transactions);

        let report = engine(&wallet, &ledger).run(&[wallet_account("1234", "Main", 120.5)]);
        let summary = &report.accounts[0];

        // Index 0..=10 được xử lý (11 lần match), index 11 trở đi thì không
        assert!(summary.early_exit);
        assert_eq!(summary.skipped_existing, 11);
        assert_eq!(summary.created, 0);
        assert_eq!(ledger.search_calls(), 11);
    }

    #[test]
    fn test_create_failure_does_not_abort_account_loop() {
        let wallet = MockWallet::new();
        let ledger = MockLedger::new();
        ledger.fail_create_for("REF2");
        wallet.seed(
            "1234",
            vec![
                wallet_txn("2024-01-10", "Coffee Shop", "REF1", -15.0),
                wallet_txn("2024-01-09", "Market", "REF2", -42.0),
                wallet_txn("2024-01-08", "Pharmacy", "REF3", -7.5),
            ],
        );

        let report = engine(&wallet, &ledger).run(&[wallet_account("1234", "Main", 120.5)]);
        let summary = &report.accounts[0];

        assert_eq!(summary.created, 2);
        assert_eq!(summary.failed, 1);
        assert!(summary.error.is_none());
        assert_eq!(ledger.created().len(), 2);
    }

    #[test]
    fn test_wallet_fetch_failure_aborts_only_that_account() {
        let wallet = MockWallet::new();
        let ledger = MockLedger::new();
        wallet.fail_for("1111");
        wallet.seed(
            "2222",
            vec![wallet_txn("2024-01-10", "Coffee Shop", "REF1", -15.0)],
        );

        let report = engine(&wallet, &ledger).run(&[
            wallet_account("1111", "Broken", 10.0),
            wallet_account("2222", "Main", 120.5),
        ]);

        assert!(report.accounts[0].error.is_some());
        assert_eq!(report.accounts[0].created, 0);
        assert!(report.accounts[1].error.is_none());
        assert_eq!(report.accounts[1].created, 1);
    }

    #[test]
    fn test_balance_update_failure_aborts_account_before_fetch() {
        let wallet = MockWallet::new();
        let ledger = MockLedger::new();
        ledger.fail_balance_updates();
        wallet.seed(
            "1234",
            vec![wallet_txn("2024-01-10", "Coffee Shop", "REF1", -15.0)],
        );

        let report = engine(&wallet, &ledger).run(&[wallet_account("1234", "Main", 120.5)]);

        assert!(report.accounts[0].error.is_some());
        assert_eq!(report.accounts[0].fetched, 0);
        assert_eq!(ledger.created().len(), 0);
    }

    #[test]
    fn test_empty_reference_duplicates_every_run() {
        let wallet = MockWallet::new();
        let ledger = MockLedger::new();
        wallet.seed(
            "1234",
            vec![wallet_txn("2024-01-10", "Coffee Shop", "", -15.0)],
        );
        let accounts = [wallet_account("1234", "Main", 120.5)];

        engine(&wallet, &ledger).run(&accounts);
        engine(&wallet, &ledger).run(&accounts);

        // Không có reference number thì dedup không nhận lại được - mỗi run
        // tạo thêm một bản
        assert_eq!(ledger.created().len(), 2);
    }

    #[test]
    fn test_transfer_marker_sets_is_transfer() {
        let mut txn = wallet_txn("2024-01-10", "Havale", "REF1", -100.0);
        txn.transaction_type = "Banka Transferi - Giden".to_string();

        let entry = build_entry(&txn);
        assert!(entry.is_transfer);
        assert_eq!(entry.note, "Banka Transferi - Giden");
    }

    #[test]
    fn test_payee_is_trimmed() {
        let entry = build_entry(&wallet_txn("2024-01-10", "  Coffee Shop  ", "REF1", -15.0));
        assert_eq!(entry.payee, "Coffee Shop");
    }

    #[test]
    fn test_ledger_account_name_prefix() {
        assert_eq!(ledger_account_name("Main"), "Ininal Main");
        assert_eq!(ledger_account_name(" Main "), "Ininal Main");
    }
}
