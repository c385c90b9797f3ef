//! DedupMatcher - quyết định một wallet transaction đã có trong PocketSmith
//! hay chưa.
//!
//! Match dựa trên reference number: một transaction được coi là đã tồn tại
//! khi trong PocketSmith có entry (cùng khoảng ngày) mà `cheque_number`
//! hoặc `memo` bằng đúng `reference_no`. So sánh exact, case-sensitive,
//! không fuzzy.

use chrono::Duration;
use tracing::debug;

use super::provider::LedgerApi;
use crate::error::SyncResult;
use crate::ininal::types::Transaction;

/// Search window lùi về trước transaction date (ngày), bù cho lệch
/// timezone/settlement date giữa hai hệ thống
const SEARCH_BACK_DAYS: i64 = 2;

/// Search window tiến sau transaction date (ngày)
const SEARCH_FORWARD_DAYS: i64 = 1;

/// Match policy cho dedup, stateless - mỗi câu hỏi một ledger query riêng,
/// không cache giữa các transactions.
pub struct DedupMatcher<'a, L: LedgerApi> {
    ledger: &'a L,
}

impl<'a, L: LedgerApi> DedupMatcher<'a, L> {
    pub fn new(ledger: &'a L) -> Self {
        Self { ledger }
    }

    /// `true` nếu transaction đã có trong PocketSmith.
    ///
    /// Transaction không có reference number thì không bao giờ match - sẽ
    /// bị tạo lại ở mọi run. Đây là hành vi có chủ đích (không có fallback
    /// matching theo amount/date/payee), không phải bug.
    pub fn exists(&self, transaction_account_id: i64, txn: &Transaction) -> SyncResult<bool> {
        if txn.reference_no.is_empty() {
            debug!(
                description = %txn.description,
                "transaction has no reference number, treating as new"
            );
            return Ok(false);
        }

        let date = txn.transaction_date.date_naive();
        let start = date - Duration::days(SEARCH_BACK_DAYS);
        let end = date + Duration::days(SEARCH_FORWARD_DAYS);

        let existing = self
            .ledger
            .search_transactions(transaction_account_id, start, end, "")?;

        Ok(existing.iter().any(|entry| {
            entry.cheque_number.as_deref() == Some(txn.reference_no.as_str())
                || entry.memo.as_deref() == Some(txn.reference_no.as_str())
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::testing::{ledger_entry, wallet_txn, MockLedger};

    #[test]
    fn test_match_on_cheque_number() {
        let ledger = MockLedger::new();
        ledger.seed_transaction(1, ledger_entry("2024-01-10", Some("REF1"), None));

        let matcher = DedupMatcher::new(&ledger);
        let txn = wallet_txn("2024-01-10", "Coffee Shop", "REF1", -15.0);
        assert!(matcher.exists(1, &txn).unwrap());
    }

    #[test]
    fn test_match_on_memo() {
        let ledger = MockLedger::new();
        ledger.seed_transaction(1, ledger_entry("2024-01-10", None, Some("REF1")));

        let matcher = DedupMatcher::new(&ledger);
        let txn = wallet_txn("2024-01-10", "Coffee Shop", "REF1", -15.0);
        assert!(matcher.exists(1, &txn).unwrap());
    }

    #[test]
    fn test_match_is_case_sensitive() {
        let ledger = MockLedger::new();
        ledger.seed_transaction(1, ledger_entry("2024-01-10", Some("ref1"), Some("ref1")));

        let matcher = DedupMatcher::new(&ledger);
        let txn = wallet_txn("2024-01-10", "Coffee Shop", "REF1", -15.0);
        assert!(!matcher.exists(1, &txn).unwrap());
    }

    #[test]
    fn test_search_window_covers_settlement_drift() {
        let ledger = MockLedger::new();
        // Entry nằm 2 ngày trước transaction date vẫn match
        ledger.seed_transaction(1, ledger_entry("2024-01-08", Some("REF1"), None));

        let matcher = DedupMatcher::new(&ledger);
        let txn = wallet_txn("2024-01-10", "Coffee Shop", "REF1", -15.0);
        assert!(matcher.exists(1, &txn).unwrap());

        // Entry nằm ngoài window [date-2d, date+1d] thì không
        let ledger = MockLedger::new();
        ledger.seed_transaction(1, ledger_entry("2024-01-07", Some("REF2"), None));

        let matcher = DedupMatcher::new(&ledger);
        let txn = wallet_txn("2024-01-10", "Coffee Shop", "REF2", -15.0);
        assert!(!matcher.exists(1, &txn).unwrap());
    }

    #[test]
    fn test_empty_reference_never_matches_and_skips_query() {
        let ledger = MockLedger::new();
        ledger.seed_transaction(1, ledger_entry("2024-01-10", Some(""), Some("")));

        let matcher = DedupMatcher::new(&ledger);
        let txn = wallet_txn("2024-01-10", "Coffee Shop", "", -15.0);
        assert!(!matcher.exists(1, &txn).unwrap());
        assert_eq!(ledger.search_calls(), 0);
    }

    #[test]
    fn test_other_account_entries_do_not_match() {
        let ledger = MockLedger::new();
        ledger.seed_transaction(2, ledger_entry("2024-01-10", Some("REF1"), None));

        let matcher = DedupMatcher::new(&ledger);
        let txn = wallet_txn("2024-01-10", "Coffee Shop", "REF1", -15.0);
        assert!(!matcher.exists(1, &txn).unwrap());
    }
}
