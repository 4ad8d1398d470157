//! The append-only transaction ledger.
//!
//! All derived quantities in the crate (account balances, budget spending,
//! savings progress) are recomputed from the records stored here.

mod core;

pub use core::{
    Transaction, TransactionBuilder, TransactionStatus, TransactionType, append_transaction,
    count_transactions, create_transaction_table, get_transactions_by_account,
    get_transactions_by_budget_category, get_transactions_by_name, get_transactions_by_user,
    map_transaction_row, next_transaction_id, rename_category_for_name,
};
