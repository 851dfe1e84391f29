//! Database connection management and schema bootstrap

use anyhow::Result;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// PostgreSQL database connection pool
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        tracing::info!("PostgreSQL connection pool established");
        Ok(Self { pool })
    }

    /// Wrap an existing pool (used by tests and embedders)
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health
    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

const CREATE_WALLETS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS wallets_tb (
    wallet_id   UUID PRIMARY KEY,
    user_id     UUID NOT NULL UNIQUE,
    balance     NUMERIC(20, 4) NOT NULL CHECK (balance >= 0),
    status      TEXT NOT NULL DEFAULT 'ACTIVE',
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
)"#;

const CREATE_WALLET_TXNS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS wallet_txns_tb (
    txn_id      BIGSERIAL PRIMARY KEY,
    wallet_id   UUID NOT NULL REFERENCES wallets_tb(wallet_id),
    sender_id   UUID NOT NULL,
    receiver_id UUID NOT NULL,
    amount      NUMERIC(20, 4) NOT NULL CHECK (amount > 0),
    txn_type    TEXT NOT NULL,
    status      TEXT NOT NULL DEFAULT 'PENDING',
    note        TEXT,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
)"#;

const CREATE_TXN_PARTY_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_wallet_txns_sender ON wallet_txns_tb (sender_id)",
    "CREATE INDEX IF NOT EXISTS idx_wallet_txns_receiver ON wallet_txns_tb (receiver_id)",
    "CREATE INDEX IF NOT EXISTS idx_wallet_txns_wallet ON wallet_txns_tb (wallet_id)",
];

/// Initialize the wallet/ledger schema (idempotent)
pub async fn init_schema(pool: &PgPool) -> Result<()> {
    tracing::info!("Initializing wallet schema...");

    sqlx::query(CREATE_WALLETS_TABLE)
        .execute(pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create wallets table: {}", e))?;

    sqlx::query(CREATE_WALLET_TXNS_TABLE)
        .execute(pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create wallet_txns table: {}", e))?;

    for ddl in CREATE_TXN_PARTY_INDEXES {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create ledger index: {}", e))?;
    }

    tracing::info!("Wallet schema initialized successfully");
    Ok(())
}
