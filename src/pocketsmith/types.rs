//! Kiểu dữ liệu cho PocketSmith API v2 (JSON phía wire là snake_case sẵn).

use serde::{Deserialize, Serialize};

/// Account type cho accounts được tool này tạo ra
pub const ACCOUNT_TYPE_CREDITS: &str = "credits";

/// User hiện tại (GET /me).
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub login: Option<String>,
}

/// Một institution (nhóm accounts theo ngân hàng/ví).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Institution {
    pub id: i64,
    pub title: String,
    pub currency_code: Option<String>,
}

/// Transaction account - nơi transactions và balance thực sự nằm.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TransactionAccount {
    pub id: i64,
    pub name: String,
    pub current_balance: Option<f64>,
    pub current_balance_date: Option<String>,
    /// Giống Go client: vắng mặt thì để zero value thay vì fail decode
    pub institution: Institution,
}

/// Account tổng hợp (GET /users/{id}/accounts).
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub current_balance: Option<f64>,
    #[serde(default)]
    pub primary_transaction_account: TransactionAccount,
}

/// Projection của một transaction đã tồn tại - dedup chỉ đọc
/// `{date, memo, cheque_number}`, các field khác của API bị bỏ qua.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LedgerTransaction {
    pub id: i64,
    pub date: Option<String>,
    pub memo: Option<String>,
    pub cheque_number: Option<String>,
}

/// Body của POST /transaction_accounts/{id}/transactions.
///
/// `reference_no` của wallet transaction nằm ở cả `memo` lẫn
/// `cheque_number` - chính redundancy này là thứ các run sau dùng để
/// nhận lại transaction đã sync.
#[derive(Debug, Clone, Serialize)]
pub struct CreateTransaction {
    pub payee: String,
    pub amount: f64,
    /// `%Y-%m-%d`
    pub date: String,
    pub is_transfer: bool,
    pub cheque_number: String,
    pub note: String,
    pub memo: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_account_with_institution() {
        let body = r#"{
            "id": 42,
            "title": "Ininal Main",
            "current_balance": 120.5,
            "primary_transaction_account": {
                "id": 99,
                "name": "Ininal Main",
                "institution": {"id": 7, "title": "Ininal", "currency_code": "try"}
            }
        }"#;

        let account: Account = serde_json::from_str(body).unwrap();
        assert_eq!(account.primary_transaction_account.id, 99);
        assert_eq!(account.primary_transaction_account.institution.id, 7);
    }

    #[test]
    fn test_decode_ledger_transaction_ignores_extra_fields() {
        let body = r#"{"id": 1, "payee": "Coffee Shop", "amount": -15.0, "memo": null, "cheque_number": "REF1"}"#;

        let txn: LedgerTransaction = serde_json::from_str(body).unwrap();
        assert_eq!(txn.memo, None);
        assert_eq!(txn.cheque_number.as_deref(), Some("REF1"));
    }
}
