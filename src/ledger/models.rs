//! Ledger data models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Kind of money movement, one value per ledger row.
///
/// `Receive` is the paired side written to the receiver's wallet when a
/// `Send` happens; it never appears alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxnType {
    Deposit,
    Withdraw,
    Send,
    Receive,
    CashIn,
    CashOut,
}

impl TxnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxnType::Deposit => "DEPOSIT",
            TxnType::Withdraw => "WITHDRAW",
            TxnType::Send => "SEND",
            TxnType::Receive => "RECEIVE",
            TxnType::CashIn => "CASH_IN",
            TxnType::CashOut => "CASH_OUT",
        }
    }
}

impl fmt::Display for TxnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TxnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEPOSIT" => Ok(TxnType::Deposit),
            "WITHDRAW" => Ok(TxnType::Withdraw),
            "SEND" => Ok(TxnType::Send),
            "RECEIVE" => Ok(TxnType::Receive),
            "CASH_IN" => Ok(TxnType::CashIn),
            "CASH_OUT" => Ok(TxnType::CashOut),
            _ => Err(format!("Invalid transaction type: {}", s)),
        }
    }
}

/// Transaction status lifecycle: PENDING -> COMPLETED | FAILED, then frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxnStatus {
    Pending,
    Completed,
    Failed,
}

impl TxnStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxnStatus::Pending => "PENDING",
            TxnStatus::Completed => "COMPLETED",
            TxnStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for TxnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for TxnStatus {
    fn from(v: &str) -> Self {
        match v {
            "COMPLETED" => TxnStatus::Completed,
            "FAILED" => TxnStatus::Failed,
            _ => TxnStatus::Pending,
        }
    }
}

/// One side of a money movement, attached to the affected wallet.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionRecord {
    /// BIGSERIAL primary key; doubles as insertion order.
    pub txn_id: i64,
    pub wallet_id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub amount: Decimal,
    pub txn_type: TxnType,
    pub status: TxnStatus,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The (wallet, sender, receiver, type, amount) tuple for a new ledger row.
/// Matched pairs are expressed as two of these inserted in one batch.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub wallet_id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub amount: Decimal,
    pub txn_type: TxnType,
    pub note: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_txn_type_round_trip() {
        for t in [
            TxnType::Deposit,
            TxnType::Withdraw,
            TxnType::Send,
            TxnType::Receive,
            TxnType::CashIn,
            TxnType::CashOut,
        ] {
            assert_eq!(t.as_str().parse::<TxnType>().unwrap(), t);
        }
        assert!("REFUND".parse::<TxnType>().is_err());
    }

    #[test]
    fn test_status_from_row_text() {
        assert_eq!(TxnStatus::from("COMPLETED"), TxnStatus::Completed);
        assert_eq!(TxnStatus::from("FAILED"), TxnStatus::Failed);
        assert_eq!(TxnStatus::from("PENDING"), TxnStatus::Pending);
    }

    #[test]
    fn test_record_serializes_screaming_enums() {
        let v = serde_json::to_value(TxnType::CashIn).unwrap();
        assert_eq!(v, serde_json::json!("CASH_IN"));
        let v = serde_json::to_value(TxnStatus::Completed).unwrap();
        assert_eq!(v, serde_json::json!("COMPLETED"));
    }
}
