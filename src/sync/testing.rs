//! Test helpers - mock providers in-memory cho engine và dedup tests.
//!
//! `MockLedger` hành xử như một PocketSmith thu nhỏ: transactions tạo qua
//! `add_transaction` được ghi lại và tìm thấy ở các lần search sau, để test
//! được tính idempotent của cả vòng sync.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;

use super::provider::{LedgerApi, WalletApi};
use crate::error::{SyncError, SyncResult};
use crate::ininal::types::Transaction;
use crate::pocketsmith::types::{
    Account, CreateTransaction, Institution, LedgerTransaction, TransactionAccount,
};

/// Wallet transaction với date dạng `YYYY-MM-DD`.
pub fn wallet_txn(date: &str, description: &str, reference_no: &str, amount: f64) -> Transaction {
    Transaction {
        transaction_date: format!("{}T12:00:00Z", date).parse().unwrap(),
        description: description.to_string(),
        reference_no: reference_no.to_string(),
        amount,
        currency: "TRY".to_string(),
        transaction_type: "Alisveris".to_string(),
    }
}

/// Ledger entry đã tồn tại, chỉ các field mà dedup đọc.
pub fn ledger_entry(
    date: &str,
    cheque_number: Option<&str>,
    memo: Option<&str>,
) -> LedgerTransaction {
    LedgerTransaction {
        id: 0,
        date: Some(date.to_string()),
        memo: memo.map(str::to_string),
        cheque_number: cheque_number.map(str::to_string),
    }
}

/// Mock phía ví: map account_number → transactions, có thể đánh dấu account
/// fail để test failure isolation.
#[derive(Default)]
pub struct MockWallet {
    transactions: RefCell<HashMap<String, Vec<Transaction>>>,
    failing: RefCell<HashSet<String>>,
}

impl MockWallet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, account_number: &str, transactions: Vec<Transaction>) {
        self.transactions
            .borrow_mut()
            .insert(account_number.to_string(), transactions);
    }

    pub fn fail_for(&self, account_number: &str) {
        self.failing.borrow_mut().insert(account_number.to_string());
    }
}

impl WalletApi for MockWallet {
    fn transactions(
        &self,
        _user_token: &str,
        _access_token: &str,
        account_number: &str,
        _start: NaiveDate,
        _end: NaiveDate,
        limit: u32,
    ) -> SyncResult<Vec<Transaction>> {
        if self.failing.borrow().contains(account_number) {
            return Err(SyncError::Transport("wallet unreachable".to_string()));
        }

        let transactions = self
            .transactions
            .borrow()
            .get(account_number)
            .cloned()
            .unwrap_or_default();
        Ok(transactions.into_iter().take(limit as usize).collect())
    }
}

/// Mock phía PocketSmith, state in-memory.
pub struct MockLedger {
    accounts: RefCell<Vec<Account>>,
    institutions: RefCell<Vec<Institution>>,
    /// (transaction_account_id, entry)
    entries: RefCell<Vec<(i64, LedgerTransaction)>>,
    /// (transaction_account_id, request) theo thứ tự tạo
    created: RefCell<Vec<(i64, CreateTransaction)>>,
    /// (transaction_account_id, balance, as_of)
    balance_updates: RefCell<Vec<(i64, f64, NaiveDate)>>,
    search_calls: Cell<usize>,
    next_id: Cell<i64>,
    fail_create_refs: RefCell<HashSet<String>>,
    fail_balance: Cell<bool>,
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLedger {
    pub fn new() -> Self {
        Self {
            accounts: RefCell::new(Vec::new()),
            institutions: RefCell::new(Vec::new()),
            entries: RefCell::new(Vec::new()),
            created: RefCell::new(Vec::new()),
            balance_updates: RefCell::new(Vec::new()),
            search_calls: Cell::new(0),
            next_id: Cell::new(1),
            fail_create_refs: RefCell::new(HashSet::new()),
            fail_balance: Cell::new(false),
        }
    }

    fn alloc_id(&self) -> i64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    /// Seed một account sẵn có; trả về transaction account id.
    pub fn seed_account(&self, title: &str) -> i64 {
        let account = self.build_account(title, 1);
        let transaction_account_id = account.primary_transaction_account.id;
        self.accounts.borrow_mut().push(account);
        transaction_account_id
    }

    pub fn seed_transaction(&self, transaction_account_id: i64, entry: LedgerTransaction) {
        self.entries
            .borrow_mut()
            .push((transaction_account_id, entry));
    }

    /// Đánh dấu mọi create với cheque_number này sẽ fail.
    pub fn fail_create_for(&self, reference_no: &str) {
        self.fail_create_refs
            .borrow_mut()
            .insert(reference_no.to_string());
    }

    pub fn fail_balance_updates(&self) {
        self.fail_balance.set(true);
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.get()
    }

    pub fn created(&self) -> Vec<(i64, CreateTransaction)> {
        self.created.borrow().clone()
    }

    pub fn balance_updates(&self) -> Vec<(i64, f64, NaiveDate)> {
        self.balance_updates.borrow().clone()
    }

    pub fn account_titles(&self) -> Vec<String> {
        self.accounts
            .borrow()
            .iter()
            .map(|account| account.title.clone())
            .collect()
    }

    pub fn institution_titles(&self) -> Vec<String> {
        self.institutions
            .borrow()
            .iter()
            .map(|institution| institution.title.clone())
            .collect()
    }

    fn build_account(&self, title: &str, institution_id: i64) -> Account {
        let account_id = self.alloc_id();
        let transaction_account_id = self.alloc_id();
        Account {
            id: account_id,
            title: title.to_string(),
            current_balance: None,
            primary_transaction_account: TransactionAccount {
                id: transaction_account_id,
                name: title.to_string(),
                current_balance: None,
                current_balance_date: None,
                institution: Institution {
                    id: institution_id,
                    title: "Ininal".to_string(),
                    currency_code: Some("try".to_string()),
                },
            },
        }
    }
}

impl LedgerApi for MockLedger {
    fn find_account_by_name(&self, _user_id: i64, name: &str) -> SyncResult<Account> {
        self.accounts
            .borrow()
            .iter()
            .find(|account| account.title == name)
            .cloned()
            .ok_or_else(|| SyncError::account_not_found(name))
    }

    fn find_institution_by_name(&self, _user_id: i64, title: &str) -> SyncResult<Institution> {
        self.institutions
            .borrow()
            .iter()
            .find(|institution| institution.title == title)
            .cloned()
            .ok_or_else(|| SyncError::institution_not_found(title))
    }

    fn create_institution(
        &self,
        _user_id: i64,
        title: &str,
        currency_code: &str,
    ) -> SyncResult<Institution> {
        let institution = Institution {
            id: self.alloc_id(),
            title: title.to_string(),
            currency_code: Some(currency_code.to_string()),
        };
        self.institutions.borrow_mut().push(institution.clone());
        Ok(institution)
    }

    fn create_account(
        &self,
        _user_id: i64,
        institution_id: i64,
        title: &str,
        _currency_code: &str,
    ) -> SyncResult<Account> {
        let account = self.build_account(title, institution_id);
        self.accounts.borrow_mut().push(account.clone());
        Ok(account)
    }

    fn update_account_balance(
        &self,
        transaction_account_id: i64,
        _institution_id: i64,
        balance: f64,
        as_of: NaiveDate,
    ) -> SyncResult<TransactionAccount> {
        if self.fail_balance.get() {
            return Err(SyncError::Transport("ledger unreachable".to_string()));
        }

        self.balance_updates
            .borrow_mut()
            .push((transaction_account_id, balance, as_of));
        Ok(TransactionAccount {
            id: transaction_account_id,
            current_balance: Some(balance),
            current_balance_date: Some(as_of.format("%Y-%m-%d").to_string()),
            ..Default::default()
        })
    }

    fn search_transactions(
        &self,
        transaction_account_id: i64,
        start: NaiveDate,
        end: NaiveDate,
        _search: &str,
    ) -> SyncResult<Vec<LedgerTransaction>> {
        self.search_calls.set(self.search_calls.get() + 1);

        Ok(self
            .entries
            .borrow()
            .iter()
            .filter(|(account_id, entry)| {
                if *account_id != transaction_account_id {
                    return false;
                }
                let Some(date) = entry
                    .date
                    .as_deref()
                    .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
                else {
                    return false;
                };
                start <= date && date <= end
            })
            .map(|(_, entry)| entry.clone())
            .collect())
    }

    fn add_transaction(
        &self,
        transaction_account_id: i64,
        transaction: &CreateTransaction,
    ) -> SyncResult<LedgerTransaction> {
        if self
            .fail_create_refs
            .borrow()
            .contains(&transaction.cheque_number)
        {
            return Err(SyncError::Api {
                status: 500,
                message: "create rejected".to_string(),
            });
        }

        let entry = LedgerTransaction {
            id: self.alloc_id(),
            date: Some(transaction.date.clone()),
            memo: Some(transaction.memo.clone()),
            cheque_number: Some(transaction.cheque_number.clone()),
        };

        self.created
            .borrow_mut()
            .push((transaction_account_id, transaction.clone()));
        self.entries
            .borrow_mut()
            .push((transaction_account_id, entry.clone()));
        Ok(entry)
    }
}
