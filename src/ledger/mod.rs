//! Transaction ledger module
//!
//! Append-only log of money movements. Every committed balance mutation has
//! a corresponding row here; dual-sided operations insert a matched pair.
//! Rows are immutable after completion except for the status field.

pub mod models;
pub mod query;
pub mod store;

pub use models::{NewTransaction, TransactionRecord, TxnStatus, TxnType};
pub use query::{ListMeta, ListQuery};
pub use store::TransactionLedger;
