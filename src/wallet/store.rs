//! Wallet store: row access and balance mutation primitives

use super::models::{Wallet, WalletStatus};
use crate::ledger::query::{ListMeta, normalize_page};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Wallet not found")]
    NotFound,

    #[error("A wallet already exists for this user")]
    Conflict,

    #[error("Insufficient balance")]
    InsufficientFunds,
}

const WALLET_COLUMNS: &str = "wallet_id, user_id, balance, status, created_at, updated_at";

fn row_to_wallet(row: &PgRow) -> Wallet {
    Wallet {
        wallet_id: row.get("wallet_id"),
        user_id: row.get("user_id"),
        balance: row.get("balance"),
        status: WalletStatus::from(row.get::<&str, _>("status")),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Wallet repository. All balance mutations happen through
/// [`WalletStore::adjust_balance`] inside a caller-owned transaction;
/// nothing here takes component-level locks.
pub struct WalletStore;

impl WalletStore {
    /// Get a wallet by its owning user
    pub async fn get(pool: &PgPool, user_id: Uuid) -> Result<Option<Wallet>, WalletError> {
        let row = sqlx::query(&format!(
            "SELECT {WALLET_COLUMNS} FROM wallets_tb WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(row.as_ref().map(row_to_wallet))
    }

    /// Get a wallet by its own id
    pub async fn get_by_wallet_id(
        pool: &PgPool,
        wallet_id: Uuid,
    ) -> Result<Option<Wallet>, WalletError> {
        let row = sqlx::query(&format!(
            "SELECT {WALLET_COLUMNS} FROM wallets_tb WHERE wallet_id = $1"
        ))
        .bind(wallet_id)
        .fetch_optional(pool)
        .await?;

        Ok(row.as_ref().map(row_to_wallet))
    }

    /// Row-locked load inside the caller's transaction.
    ///
    /// Two concurrent operations touching the same wallet serialize here:
    /// the second blocks until the first commits or aborts, then re-reads
    /// the committed balance.
    pub async fn get_for_update(
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> Result<Option<Wallet>, WalletError> {
        let row = sqlx::query(&format!(
            "SELECT {WALLET_COLUMNS} FROM wallets_tb WHERE user_id = $1 FOR UPDATE"
        ))
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row.as_ref().map(row_to_wallet))
    }

    /// Create the user's wallet with its opening balance.
    ///
    /// Exactly one wallet per user: the UNIQUE constraint on `user_id`
    /// turns a duplicate into [`WalletError::Conflict`].
    pub async fn create(
        pool: &PgPool,
        user_id: Uuid,
        initial_balance: Decimal,
    ) -> Result<Wallet, WalletError> {
        let row = sqlx::query(&format!(
            "INSERT INTO wallets_tb (wallet_id, user_id, balance, status)
             VALUES ($1, $2, $3, 'ACTIVE')
             RETURNING {WALLET_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(initial_balance)
        .fetch_one(pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => WalletError::Conflict,
            _ => WalletError::Database(e),
        })?;

        Ok(row_to_wallet(&row))
    }

    /// Apply a signed delta to a wallet balance inside the caller's
    /// transaction, returning the updated wallet.
    ///
    /// The UPDATE is guarded with `balance + delta >= 0`; a debit that would
    /// go negative matches no row and surfaces as
    /// [`WalletError::InsufficientFunds`]. The caller must have loaded the
    /// wallet (row-locked) earlier in the same transaction, so a zero-row
    /// result here can only mean insufficient funds.
    pub async fn adjust_balance(
        conn: &mut PgConnection,
        wallet_id: Uuid,
        delta: Decimal,
    ) -> Result<Wallet, WalletError> {
        let row = sqlx::query(&format!(
            "UPDATE wallets_tb
             SET balance = balance + $1, updated_at = NOW()
             WHERE wallet_id = $2 AND balance + $1 >= 0
             RETURNING {WALLET_COLUMNS}"
        ))
        .bind(delta)
        .bind(wallet_id)
        .fetch_optional(&mut *conn)
        .await?;

        match row {
            Some(r) => Ok(row_to_wallet(&r)),
            None => Err(WalletError::InsufficientFunds),
        }
    }

    /// Set wallet status (ACTIVE | BLOCKED)
    pub async fn set_status(
        pool: &PgPool,
        wallet_id: Uuid,
        status: WalletStatus,
    ) -> Result<Wallet, WalletError> {
        let row = sqlx::query(&format!(
            "UPDATE wallets_tb SET status = $1, updated_at = NOW()
             WHERE wallet_id = $2
             RETURNING {WALLET_COLUMNS}"
        ))
        .bind(status.as_str())
        .bind(wallet_id)
        .fetch_optional(pool)
        .await?;

        row.as_ref().map(row_to_wallet).ok_or(WalletError::NotFound)
    }

    /// Administrative listing of all wallets, newest first, paginated.
    pub async fn list(
        pool: &PgPool,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<(Vec<Wallet>, ListMeta), WalletError> {
        let (page, limit, offset) = normalize_page(page, limit);

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM wallets_tb")
            .fetch_one(pool)
            .await?;

        let rows = sqlx::query(&format!(
            "SELECT {WALLET_COLUMNS} FROM wallets_tb
             ORDER BY created_at DESC
             LIMIT $1 OFFSET $2"
        ))
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        let wallets = rows.iter().map(row_to_wallet).collect();
        Ok((wallets, ListMeta::new(page, limit, total)))
    }
}
