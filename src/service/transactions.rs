//! Validates and creates transactions, then triggers the aggregate side
//! effects.
//!
//! A transaction create fails only on bad input or a storage failure on the
//! ledger write itself. The aggregate updates run afterwards within the same
//! request but are fire-and-forget relative to the caller: every failure in
//! them is caught here and logged with enough context to diagnose drift
//! later, never surfaced.

use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    account::apply_transaction_to_balance,
    budget::recompute_budget_spent,
    database_id::{
        AccountId, BudgetCategoryId, RecurringBillId, SavingsGoalId, UserId,
    },
    ledger::{
        Transaction, TransactionBuilder, TransactionStatus, TransactionType, append_transaction,
        rename_category_for_name,
    },
};

/// The client-supplied fields for a new transaction.
///
/// Everything is optional at this layer; [create_transaction] and
/// [import_transactions] decide which absences are validation errors and
/// which get defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTransaction {
    /// Who or what the money went to or came from.
    pub name: Option<String>,
    /// A free-form category label.
    pub category: Option<String>,
    /// The calendar date the transaction happened.
    pub date: Option<Date>,
    /// The wall-clock time of day, as "HH:MM". Defaults to "00:00".
    pub time: Option<String>,
    /// The magnitude in minor currency units. Must not be negative.
    pub amount: Option<i64>,
    /// Whether this is income or an expense.
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    /// The settlement state. Defaults to completed.
    pub status: Option<TransactionStatus>,
    /// The account this transaction settles against.
    pub account_id: Option<AccountId>,
    /// The budget category this transaction draws from.
    pub budget_category_id: Option<BudgetCategoryId>,
    /// The savings goal this transaction contributes to.
    pub savings_goal_id: Option<SavingsGoalId>,
    /// How much of the amount goes to the savings goal, in minor units.
    pub savings_amount: Option<i64>,
    /// The recurring bill this transaction pays.
    pub recurring_bill_id: Option<RecurringBillId>,
}

/// Validate and create a new transaction, then trigger the aggregate side
/// effects.
///
/// Requires `name`, `category`, `date`, `amount` (non-negative), and
/// `transaction_type`; missing or malformed fields fail with a validation
/// error before anything is written. Status defaults to completed and time
/// to "00:00".
///
/// Once the ledger write succeeds the transaction is created, full stop.
/// For a completed expense with a budget category the category's monthly
/// `spent` is recomputed; for any completed transaction with an account the
/// incremental balance update runs. Failures in either side effect are
/// logged and swallowed, including a reference to an account that does not
/// exist for this user.
///
/// Returns the stored record, reflecting the ledger write rather than any
/// recomputed aggregate state.
///
/// # Errors
/// This function will return a:
/// - [Error::MissingField] if a required field is absent,
/// - [Error::InvalidAmount] if the amount is negative,
/// - or [Error::SqlError] if the ledger write fails.
pub fn create_transaction(
    input: NewTransaction,
    user_id: UserId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let builder = validate(&input, user_id)?;
    let category = input
        .category
        .as_deref()
        .map(str::trim)
        .filter(|category| !category.is_empty())
        .ok_or(Error::MissingField("category"))?;

    let transaction = append_transaction(builder.category(category), connection)?;

    if transaction.status == TransactionStatus::Completed {
        update_aggregates(&transaction, connection);
    }

    Ok(transaction)
}

/// Import a batch of extracted transaction candidates for `user_id`.
///
/// Validation is all-or-nothing: every entry must have `name`, `date`,
/// `amount`, and `transaction_type`, and one bad entry rejects the whole
/// batch with nothing persisted. IDs are assigned sequentially from the
/// user's current maximum, in input order, within a single database
/// transaction.
///
/// Imports do **not** trigger per-item aggregate updates. This skips O(n)
/// redundant aggregate writes during bulk import; callers rely on the
/// read-path full recomputation to reconcile balances and budget spending
/// afterwards.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidBatchEntry] if any entry fails validation,
/// - or [Error::SqlError] if the batch write fails.
pub fn import_transactions(
    inputs: Vec<NewTransaction>,
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let mut builders = Vec::with_capacity(inputs.len());
    for (index, input) in inputs.iter().enumerate() {
        let builder = validate(input, user_id).map_err(|error| match error {
            Error::MissingField(field) => Error::InvalidBatchEntry { index, field },
            Error::InvalidAmount(_) => Error::InvalidBatchEntry {
                index,
                field: "amount",
            },
            other => other,
        })?;
        builders.push(builder.category(input.category.as_deref().unwrap_or_default()));
    }

    let sql_transaction = connection.unchecked_transaction()?;

    let mut imported = Vec::with_capacity(builders.len());
    for builder in builders {
        imported.push(append_transaction(builder, &sql_transaction)?);
    }

    sql_transaction.commit()?;
    tracing::info!(user_id, count = imported.len(), "imported transaction batch");

    Ok(imported)
}

/// Rewrite the category of every transaction of `user_id` whose trimmed name
/// exactly matches `exact_name`, returning the number modified.
///
/// Budget aggregates for the old and new categories are deliberately left
/// stale; the next recomputation picks the change up.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn bulk_recategorize(
    user_id: UserId,
    exact_name: &str,
    new_category: &str,
    connection: &Connection,
) -> Result<usize, Error> {
    rename_category_for_name(user_id, exact_name, new_category, connection)
}

/// Check the required fields and turn the input into a ledger builder.
fn validate(input: &NewTransaction, user_id: UserId) -> Result<TransactionBuilder, Error> {
    let name = input
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or(Error::MissingField("name"))?;
    let date = input.date.ok_or(Error::MissingField("date"))?;
    let amount = input.amount.ok_or(Error::MissingField("amount"))?;
    let transaction_type = input
        .transaction_type
        .ok_or(Error::MissingField("type"))?;

    if amount < 0 {
        return Err(Error::InvalidAmount(amount));
    }

    let mut builder = Transaction::build(user_id, name, amount, date, transaction_type)
        .status(input.status.unwrap_or(TransactionStatus::Completed))
        .account_id(input.account_id)
        .budget_category_id(input.budget_category_id)
        .savings_goal_id(input.savings_goal_id)
        .savings_amount(input.savings_amount)
        .recurring_bill_id(input.recurring_bill_id);
    if let Some(time) = input.time.as_deref() {
        builder = builder.time(time);
    }

    Ok(builder)
}

/// Run the best-effort aggregate side effects for a freshly created,
/// completed transaction. Never fails: every error is logged and dropped.
fn update_aggregates(transaction: &Transaction, connection: &Connection) {
    if transaction.transaction_type == TransactionType::Expense {
        if let Some(budget_category_id) = transaction.budget_category_id {
            if let Err(error) = recompute_budget_spent(
                transaction.user_id,
                budget_category_id,
                transaction.date,
                connection,
            ) {
                tracing::error!(
                    user_id = transaction.user_id,
                    budget_category_id,
                    transaction_id = transaction.id,
                    "budget spent recomputation failed: {error}"
                );
            }
        }
    }

    if transaction.account_id.is_some() {
        if let Err(error) = apply_transaction_to_balance(transaction, connection) {
            tracing::error!(
                user_id = transaction.user_id,
                account_id = transaction.account_id,
                transaction_id = transaction.id,
                "account balance update failed: {error}"
            );
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
