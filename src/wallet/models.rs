//! Wallet data models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Wallet status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WalletStatus {
    Active,
    Blocked,
}

impl WalletStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletStatus::Active => "ACTIVE",
            WalletStatus::Blocked => "BLOCKED",
        }
    }
}

impl fmt::Display for WalletStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for WalletStatus {
    fn from(v: &str) -> Self {
        match v {
            "BLOCKED" => WalletStatus::Blocked,
            _ => WalletStatus::Active,
        }
    }
}

/// Strict parse for API input; the lossy `From<&str>` above is only for
/// rows already constrained by the schema.
impl FromStr for WalletStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(WalletStatus::Active),
            "BLOCKED" => Ok(WalletStatus::Blocked),
            _ => Err(format!(
                "Invalid status: {}. Status must be \"BLOCKED\" or \"ACTIVE\"",
                s
            )),
        }
    }
}

/// The balance-bearing account record, one per user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub wallet_id: Uuid,
    pub user_id: Uuid,
    pub balance: Decimal,
    pub status: WalletStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    pub fn is_blocked(&self) -> bool {
        self.status == WalletStatus::Blocked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_row_text() {
        assert_eq!(WalletStatus::from("ACTIVE"), WalletStatus::Active);
        assert_eq!(WalletStatus::from("BLOCKED"), WalletStatus::Blocked);
        assert_eq!(WalletStatus::from("???"), WalletStatus::Active); // schema-constrained
    }

    #[test]
    fn test_status_strict_parse() {
        assert_eq!("BLOCKED".parse::<WalletStatus>().unwrap(), WalletStatus::Blocked);
        assert!("blocked".parse::<WalletStatus>().is_err());
        assert!("SUSPENDED".parse::<WalletStatus>().is_err());
    }
}
