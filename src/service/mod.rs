//! Orchestrates transaction writes and their aggregate side effects.

mod transactions;

pub use transactions::{
    NewTransaction, bulk_recategorize, create_transaction, import_transactions,
};
