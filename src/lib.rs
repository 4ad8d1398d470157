//! Pocketbook is a personal-finance tracking core: an append-only transaction
//! ledger with materialised aggregates (account balances, budget spending,
//! savings progress) recomputed from it.
//!
//! The crate is split along the data flow: the [ledger] module stores
//! transactions, the [account] and [budget] modules derive balances and
//! monthly spending from them, the [service] module orchestrates writes and
//! their best-effort aggregate side effects, and the [categorize] module
//! suggests categories for new transactions from the user's history.
//!
//! Aggregates are deliberately eventually consistent: the write path applies
//! incremental deltas, and the read path recomputes from scratch as a
//! self-healing backstop. Neither path blocks or fails a transaction write.

#![warn(missing_docs)]

pub mod account;
pub mod budget;
pub mod categorize;
mod database_id;
pub mod db;
pub mod import_csv;
pub mod ledger;
pub mod recurring;
pub mod savings;
pub mod service;

pub use database_id::{
    AccountId, BudgetCategoryId, DatabaseId, RecurringBillId, SavingsGoalId, TransactionId, UserId,
};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A required input field was missing.
    ///
    /// Raised during validation of client input and always surfaced to the
    /// caller, never retried.
    #[error("the required field '{0}' is missing")]
    MissingField(&'static str),

    /// A transaction amount was negative.
    ///
    /// Amounts are magnitudes in minor currency units; the transaction type
    /// carries the direction.
    #[error("transaction amounts must not be negative, got {0}")]
    InvalidAmount(i64),

    /// An entry in an import batch failed validation.
    ///
    /// Import batches are all-or-nothing: one bad entry rejects the whole
    /// batch and nothing is persisted.
    #[error("import entry {index} is missing the required field '{field}'")]
    InvalidBatchEntry {
        /// The zero-based position of the bad entry in the batch.
        index: usize,
        /// The field that was missing or malformed.
        field: &'static str,
    },

    /// The requested resource could not be found for this user.
    ///
    /// Surfaced on direct operations (e.g. fetching a specific account), but
    /// swallowed and logged when encountered as a side-effect dependency
    /// during transaction creation.
    #[error("the requested resource could not be found")]
    NotFound,

    /// A candidate file from the import pipeline could not be parsed.
    #[error("could not parse import candidates: {0}")]
    InvalidCandidateFile(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}
