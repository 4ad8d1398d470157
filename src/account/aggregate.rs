//! The two balance-derivation paths of the aggregate engine.
//!
//! The write path applies an incremental delta to the stored balance when a
//! transaction is created; the read path refolds the whole ledger and
//! supersedes the stored value. The two must agree whenever the ledger is
//! stable. Concurrent writes can lose an incremental update; the read path is
//! idempotent and heals the drift on the next recomputation, so no locking is
//! layered on top.

use rusqlite::Connection;

use crate::{
    Error,
    account::{Account, AccountType, get_account, list_accounts, update_account_balance},
    database_id::{AccountId, UserId},
    ledger::{Transaction, TransactionStatus, TransactionType, get_transactions_by_account},
};

/// The signed contribution of a transaction to an account's balance.
///
/// For credit cards the balance is a debt magnitude: an expense grows the
/// debt and an income (a payment) shrinks it. For every other account type
/// the balance is an asset value: income adds, expense subtracts. The same
/// transaction sequence therefore folds to opposite-signed balances on the
/// two kinds of account.
pub fn signed_amount(
    account_type: AccountType,
    transaction_type: TransactionType,
    amount: i64,
) -> i64 {
    match (account_type, transaction_type) {
        (AccountType::CreditCard, TransactionType::Expense) => amount,
        (AccountType::CreditCard, TransactionType::Income) => -amount,
        (_, TransactionType::Income) => amount,
        (_, TransactionType::Expense) => -amount,
    }
}

/// Recompute an account's balance from the ledger (the read path).
///
/// If no transaction references the account, the stored baseline balance is
/// returned unchanged, preserving a manually set opening balance. Otherwise
/// the balance is folded from zero over every completed transaction, in
/// arbitrary order (the sum is commutative), and the result supersedes the
/// baseline.
///
/// The recomputed value is written back to the account best-effort: a
/// write-back failure is logged and does not fail the read. Recomputing twice
/// with no intervening writes yields the same value both times.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the account does not exist for this user,
/// - or [Error::SqlError] if the ledger cannot be read.
pub fn recompute_account_balance(
    user_id: UserId,
    account_id: AccountId,
    connection: &Connection,
) -> Result<i64, Error> {
    let account = get_account(user_id, account_id, connection)?;
    let transactions = get_transactions_by_account(user_id, account_id, connection)?;

    if transactions.is_empty() {
        return Ok(account.balance);
    }

    let balance = fold_balance(account.account_type, &transactions);

    if let Err(error) = update_account_balance(user_id, account_id, balance, connection) {
        tracing::error!(
            user_id,
            account_id,
            "failed to write back recomputed balance: {error}"
        );
    }

    Ok(balance)
}

/// Apply a newly created transaction to its account's stored balance (the
/// write path).
///
/// Applies exactly one sign rule to the *current stored* balance and
/// persists the result. Deliberately redundant with
/// [recompute_account_balance]; both paths agree when applied consistently,
/// and the read path corrects any drift.
///
/// A transaction referencing an account that does not exist for this user is
/// skipped with a structured warning, not an error: the transaction itself
/// has already been created successfully. Transactions that are not
/// [TransactionStatus::Completed] are ignored, matching the read path.
///
/// # Errors
/// This function will return an [Error::SqlError] if the account lookup or
/// the balance write fails for storage reasons.
pub fn apply_transaction_to_balance(
    transaction: &Transaction,
    connection: &Connection,
) -> Result<(), Error> {
    if transaction.status != TransactionStatus::Completed {
        return Ok(());
    }

    let Some(account_id) = transaction.account_id else {
        return Ok(());
    };

    let account = match get_account(transaction.user_id, account_id, connection) {
        Ok(account) => account,
        Err(Error::NotFound) => {
            tracing::warn!(
                user_id = transaction.user_id,
                account_id,
                transaction_id = transaction.id,
                "skipping balance update: account not found for user"
            );
            return Ok(());
        }
        Err(error) => return Err(error),
    };

    let balance = account.balance
        + signed_amount(
            account.account_type,
            transaction.transaction_type,
            transaction.amount,
        );

    update_account_balance(transaction.user_id, account_id, balance, connection)
}

/// Retrieve all of a user's accounts with ledger-derived balances.
///
/// The read-path consistency backstop for the account list: every account
/// with linked transactions gets a freshly recomputed balance.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn list_accounts_with_balances(
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<Account>, Error> {
    let mut accounts = list_accounts(user_id, connection)?;

    for account in &mut accounts {
        account.balance = recompute_account_balance(user_id, account.id, connection)?;
    }

    Ok(accounts)
}

fn fold_balance(account_type: AccountType, transactions: &[Transaction]) -> i64 {
    transactions
        .iter()
        .filter(|transaction| transaction.status == TransactionStatus::Completed)
        .map(|transaction| {
            signed_amount(account_type, transaction.transaction_type, transaction.amount)
        })
        .sum()
}

// ============================================================================
// TESTS
// ============================================================================
