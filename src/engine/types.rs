//! Engine response types

use crate::ledger::{ListMeta, TransactionRecord};
use crate::wallet::Wallet;
use serde::Serialize;

/// Uniform response wrapper for callers that serialize engine results.
#[derive(Debug, Serialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            error: None,
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>, error: &'static str) -> Self {
        Self {
            success: false,
            message: message.into(),
            error: Some(error),
            data: None,
        }
    }
}

/// Result of a single-wallet operation (deposit, withdraw).
#[derive(Debug, Clone, Serialize)]
pub struct SingleOutcome {
    pub wallet: Wallet,
    pub transaction: TransactionRecord,
}

/// Result of a peer send: both updated wallets plus the sender-side row.
/// The paired RECEIVE row shares the same amount and parties.
#[derive(Debug, Clone, Serialize)]
pub struct SendOutcome {
    pub sender_wallet: Wallet,
    pub receiver_wallet: Wallet,
    pub transaction: TransactionRecord,
}

/// Result of an agent cash-in or cash-out.
#[derive(Debug, Clone, Serialize)]
pub struct CashOutcome {
    pub agent_wallet: Wallet,
    pub target_wallet: Wallet,
    pub transaction: TransactionRecord,
}

/// One page of the transaction listing, rows already projected.
#[derive(Debug, Serialize)]
pub struct ListPage {
    pub data: Vec<serde_json::Value>,
    pub meta: ListMeta,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_success_shape() {
        let env = ApiEnvelope::success("Deposit successful", json!({"balance": "90"}));
        let v = serde_json::to_value(&env).unwrap();
        assert_eq!(v["success"], json!(true));
        assert_eq!(v["message"], json!("Deposit successful"));
        assert_eq!(v["data"]["balance"], json!("90"));
        assert!(v.get("error").is_none());
    }

    #[test]
    fn test_envelope_failure_shape() {
        let env: ApiEnvelope<()> = ApiEnvelope::failure("Insufficient balance", "INSUFFICIENT_FUNDS");
        let v = serde_json::to_value(&env).unwrap();
        assert_eq!(v["success"], json!(false));
        assert_eq!(v["error"], json!("INSUFFICIENT_FUNDS"));
        assert!(v.get("data").is_none());
    }
}
