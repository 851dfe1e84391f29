//! walletcore - Custodial Wallet Ledger & Transfer Engine
//!
//! One balance-bearing wallet per user; money moves through a small set of
//! operations (deposit, withdraw, peer send, agent cash-in/cash-out) that
//! execute as atomic units against PostgreSQL.
//!
//! # Modules
//!
//! - [`config`] - YAML application configuration
//! - [`logging`] - tracing subscriber setup
//! - [`db`] - connection pool and schema bootstrap
//! - [`money`] - strict amount parsing at the API boundary
//! - [`policy`] - role rules and history visibility scoping
//! - [`wallet`] - wallet rows and balance primitives
//! - [`ledger`] - append-only transaction log with filterable listing
//! - [`engine`] - the money-movement operations as atomic units

pub mod config;
pub mod db;
pub mod engine;
pub mod ledger;
pub mod logging;
pub mod money;
pub mod policy;
pub mod wallet;

// Convenient re-exports at crate root
pub use config::{AppConfig, WalletConfig};
pub use db::Database;
pub use engine::{ApiEnvelope, EngineError, TransferEngine};
pub use ledger::{
    ListMeta, ListQuery, NewTransaction, TransactionLedger, TransactionRecord, TxnStatus, TxnType,
};
pub use money::Amount;
pub use policy::{AuthorizationPolicy, Role};
pub use wallet::{Wallet, WalletStatus, WalletStore};
