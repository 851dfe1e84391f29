//! Engine error taxonomy

use crate::ledger::store::LedgerError;
use crate::wallet::WalletError;
use thiserror::Error;

/// Every way a money-movement operation can refuse or fail.
///
/// Validation variants carry the caller-facing message; [`EngineError::kind`]
/// gives the stable machine-readable code.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    InvalidAmount(String),

    #[error("Invalid target user id")]
    InvalidTargetId,

    #[error("Sender and receiver cannot be the same user")]
    SelfTransferNotAllowed,

    #[error("{0}")]
    RoleNotPermitted(&'static str),

    #[error("{0}")]
    WalletNotFound(&'static str),

    #[error("{0}")]
    InsufficientFunds(&'static str),

    #[error("{0}")]
    WalletBlocked(&'static str),

    #[error("You are not permitted to view other users' transactions")]
    Forbidden,

    #[error("A wallet already exists for this user")]
    Conflict,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl EngineError {
    /// Stable error code for API envelopes and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::InvalidAmount(_) => "INVALID_AMOUNT",
            EngineError::InvalidTargetId => "INVALID_TARGET_ID",
            EngineError::SelfTransferNotAllowed => "SELF_TRANSFER_NOT_ALLOWED",
            EngineError::RoleNotPermitted(_) => "ROLE_NOT_PERMITTED",
            EngineError::WalletNotFound(_) => "WALLET_NOT_FOUND",
            EngineError::InsufficientFunds(_) => "INSUFFICIENT_FUNDS",
            EngineError::WalletBlocked(_) => "WALLET_BLOCKED",
            EngineError::Forbidden => "FORBIDDEN",
            EngineError::Conflict => "CONFLICT",
            EngineError::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl From<WalletError> for EngineError {
    fn from(e: WalletError) -> Self {
        match e {
            WalletError::NotFound => EngineError::WalletNotFound("Wallet not found"),
            WalletError::Conflict => EngineError::Conflict,
            WalletError::InsufficientFunds => EngineError::InsufficientFunds("Insufficient balance"),
            WalletError::Database(e) => EngineError::Database(e),
        }
    }
}

impl From<LedgerError> for EngineError {
    fn from(e: LedgerError) -> Self {
        match e {
            // set_status targets a row appended moments earlier in the same
            // transaction, so a miss is a database-level anomaly
            LedgerError::NotFound => EngineError::Database(sqlx::Error::RowNotFound),
            LedgerError::Database(e) => EngineError::Database(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_codes_are_stable() {
        assert_eq!(
            EngineError::InvalidAmount("x".into()).kind(),
            "INVALID_AMOUNT"
        );
        assert_eq!(EngineError::Forbidden.kind(), "FORBIDDEN");
        assert_eq!(
            EngineError::from(WalletError::InsufficientFunds).kind(),
            "INSUFFICIENT_FUNDS"
        );
        assert_eq!(EngineError::from(WalletError::Conflict).kind(), "CONFLICT");
    }
}
