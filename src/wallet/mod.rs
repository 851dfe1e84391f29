//! Wallet storage module
//!
//! PostgreSQL-backed wallet rows and the balance mutation primitives.
//! Concurrency control lives in the store's row locks and guarded updates,
//! not in this module's API: callers thread one transaction handle through
//! every primitive and commit or abort it exactly once.

pub mod models;
pub mod store;

pub use models::{Wallet, WalletStatus};
pub use store::{WalletError, WalletStore};
