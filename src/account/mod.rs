//! Accounts and the balance half of the aggregate engine.
//!
//! An account's stored balance is only a baseline: whenever at least one
//! ledger transaction references the account, the true balance is derived
//! from the ledger. The [aggregate] submodule holds both derivation paths,
//! the full read-path recomputation and the incremental write-path delta.

mod aggregate;
mod core;

pub use aggregate::{
    apply_transaction_to_balance, list_accounts_with_balances, recompute_account_balance,
    signed_amount,
};
pub use core::{
    Account, AccountType, NewAccount, create_account, create_account_table, get_account,
    list_accounts, map_account_row, update_account_balance,
};
