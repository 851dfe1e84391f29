//! Transfer engine module
//!
//! The money-movement operations, each executed as one atomic unit: all
//! balance changes and ledger rows of an operation commit together or none
//! do. Validation that needs no I/O runs before the database transaction
//! opens; ledger rows stranded by an abort are swept to FAILED afterwards.

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod integration_tests;

pub use error::EngineError;
pub use service::TransferEngine;
pub use types::{ApiEnvelope, CashOutcome, ListPage, SendOutcome, SingleOutcome};
