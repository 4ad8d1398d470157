//! Defines the core data model and database queries for the transaction
//! ledger.

use std::fmt;
use std::str::FromStr;

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    database_id::{AccountId, BudgetCategoryId, RecurringBillId, SavingsGoalId, TransactionId, UserId},
};

// ============================================================================
// MODELS
// ============================================================================

/// Whether a transaction brings money in or sends it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Money earned or received.
    Income,
    /// Money spent.
    Expense,
}

impl TransactionType {
    /// The lowercase text form stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(format!("unknown transaction type '{other}'")),
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()
            .and_then(|text| text.parse().map_err(|_| FromSqlError::InvalidType))
    }
}

/// The settlement state of a transaction.
///
/// Only completed transactions count toward any aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// The transaction has settled.
    Completed,
    /// The transaction has been recorded but has not settled yet.
    Pending,
    /// The transaction did not go through.
    Failed,
}

impl TransactionStatus {
    /// The lowercase text form stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Completed => "completed",
            TransactionStatus::Pending => "pending",
            TransactionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text {
            "completed" => Ok(TransactionStatus::Completed),
            "pending" => Ok(TransactionStatus::Pending),
            "failed" => Ok(TransactionStatus::Failed),
            other => Err(format!("unknown transaction status '{other}'")),
        }
    }
}

impl ToSql for TransactionStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()
            .and_then(|text| text.parse().map_err(|_| FromSqlError::InvalidType))
    }
}

/// A single entry in a user's ledger: money that was earned or spent.
///
/// Transactions are immutable once written, with one exception: the free-form
/// `category` field can be rewritten in bulk via
/// [rename_category_for_name]. To create a new transaction, use
/// [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction, unique and monotonic per user.
    pub id: TransactionId,
    /// The ID of the user that owns this transaction.
    pub user_id: UserId,
    /// Who or what the money went to or came from, e.g. a merchant name.
    pub name: String,
    /// A free-form category label, e.g. "Groceries".
    pub category: String,
    /// The calendar date the transaction happened.
    pub date: Date,
    /// The wall-clock time of day, as "HH:MM".
    pub time: String,
    /// The magnitude of the transaction in minor currency units (cents).
    ///
    /// Always non-negative; [Transaction::transaction_type] carries the
    /// direction.
    pub amount: i64,
    /// Whether this is income or an expense.
    pub transaction_type: TransactionType,
    /// The settlement state. Only completed transactions count toward
    /// aggregates.
    pub status: TransactionStatus,
    /// The account this transaction settles against, if any.
    ///
    /// A weak reference: the transaction does not own the account lifecycle,
    /// and the ID is not required to resolve to a live account.
    pub account_id: Option<AccountId>,
    /// The budget category this transaction draws from, if any.
    pub budget_category_id: Option<BudgetCategoryId>,
    /// The savings goal this transaction contributes to, if any.
    pub savings_goal_id: Option<SavingsGoalId>,
    /// How much of the amount goes to the savings goal, in minor units.
    pub savings_amount: Option<i64>,
    /// The recurring bill this transaction pays, if any.
    pub recurring_bill_id: Option<RecurringBillId>,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        user_id: UserId,
        name: &str,
        amount: i64,
        date: Date,
        transaction_type: TransactionType,
    ) -> TransactionBuilder {
        TransactionBuilder {
            user_id,
            name: name.trim().to_owned(),
            category: String::new(),
            date,
            time: "00:00".to_owned(),
            amount,
            transaction_type,
            status: TransactionStatus::Completed,
            account_id: None,
            budget_category_id: None,
            savings_goal_id: None,
            savings_amount: None,
            recurring_bill_id: None,
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// Optional fields default to sensible values: status `completed`, time
/// `"00:00"`, no entity links. Finalise the builder with
/// [append_transaction], which assigns the next per-user ID and persists the
/// record.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionBuilder {
    /// The ID of the user the transaction belongs to.
    pub user_id: UserId,
    /// Who or what the money went to or came from.
    pub name: String,
    /// A free-form category label.
    pub category: String,
    /// The calendar date the transaction happened.
    pub date: Date,
    /// The wall-clock time of day, as "HH:MM".
    pub time: String,
    /// The magnitude in minor currency units.
    pub amount: i64,
    /// Whether this is income or an expense.
    pub transaction_type: TransactionType,
    /// The settlement state.
    pub status: TransactionStatus,
    /// The account this transaction settles against.
    pub account_id: Option<AccountId>,
    /// The budget category this transaction draws from.
    pub budget_category_id: Option<BudgetCategoryId>,
    /// The savings goal this transaction contributes to.
    pub savings_goal_id: Option<SavingsGoalId>,
    /// How much of the amount goes to the savings goal.
    pub savings_amount: Option<i64>,
    /// The recurring bill this transaction pays.
    pub recurring_bill_id: Option<RecurringBillId>,
}

impl TransactionBuilder {
    /// Set the category label.
    pub fn category(mut self, category: &str) -> Self {
        self.category = category.trim().to_owned();
        self
    }

    /// Set the time of day.
    pub fn time(mut self, time: &str) -> Self {
        self.time = time.to_owned();
        self
    }

    /// Set the settlement status.
    pub fn status(mut self, status: TransactionStatus) -> Self {
        self.status = status;
        self
    }

    /// Link the transaction to an account.
    pub fn account_id(mut self, account_id: Option<AccountId>) -> Self {
        self.account_id = account_id;
        self
    }

    /// Link the transaction to a budget category.
    pub fn budget_category_id(mut self, budget_category_id: Option<BudgetCategoryId>) -> Self {
        self.budget_category_id = budget_category_id;
        self
    }

    /// Link the transaction to a savings goal.
    pub fn savings_goal_id(mut self, savings_goal_id: Option<SavingsGoalId>) -> Self {
        self.savings_goal_id = savings_goal_id;
        self
    }

    /// Set the portion of the amount that goes to the savings goal.
    pub fn savings_amount(mut self, savings_amount: Option<i64>) -> Self {
        self.savings_amount = savings_amount;
        self
    }

    /// Link the transaction to a recurring bill.
    pub fn recurring_bill_id(mut self, recurring_bill_id: Option<RecurringBillId>) -> Self {
        self.recurring_bill_id = recurring_bill_id;
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const TRANSACTION_COLUMNS: &str = "id, user_id, name, category, date, time, amount, \
     transaction_type, status, account_id, budget_category_id, savings_goal_id, \
     savings_amount, recurring_bill_id";

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                category TEXT NOT NULL,
                date TEXT NOT NULL,
                time TEXT NOT NULL DEFAULT '00:00',
                amount INTEGER NOT NULL,
                transaction_type TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'completed',
                account_id INTEGER,
                budget_category_id INTEGER,
                savings_goal_id INTEGER,
                savings_amount INTEGER,
                recurring_bill_id INTEGER,
                PRIMARY KEY (user_id, id)
                )",
        (),
    )?;

    // Composite indexes used by the aggregate recomputation paths.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_account
         ON \"transaction\"(user_id, account_id);",
        (),
    )?;
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_budget
         ON \"transaction\"(user_id, budget_category_id);",
        (),
    )?;

    Ok(())
}

/// The next sequential transaction ID for `user_id`: one past the user's
/// current maximum, starting at 1 for a user with no transactions.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn next_transaction_id(user_id: UserId, connection: &Connection) -> Result<TransactionId, Error> {
    let id = connection
        .prepare("SELECT COALESCE(MAX(id), 0) + 1 FROM \"transaction\" WHERE user_id = :user_id")?
        .query_row(&[(":user_id", &user_id)], |row| row.get(0))?;

    Ok(id)
}

/// Append a new transaction to the ledger.
///
/// Assigns the next sequential per-user ID and persists the record. The
/// stored record is returned; amount, type, and date are never mutated after
/// this point.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn append_transaction(
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let id = next_transaction_id(builder.user_id, connection)?;

    let transaction = connection
        .prepare(&format!(
            "INSERT INTO \"transaction\" ({TRANSACTION_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                id,
                builder.user_id,
                builder.name,
                builder.category,
                builder.date,
                builder.time,
                builder.amount,
                builder.transaction_type,
                builder.status,
                builder.account_id,
                builder.budget_category_id,
                builder.savings_goal_id,
                builder.savings_amount,
                builder.recurring_bill_id,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve all transactions belonging to `user_id`.
///
/// No ordering is promised; ordering is a presentation concern.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_transactions_by_user(
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE user_id = :user_id"
        ))?
        .query_map(&[(":user_id", &user_id)], map_transaction_row)?
        .map(|row| row.map_err(Error::from))
        .collect()
}

/// Retrieve all of a user's transactions linked to `account_id`.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_transactions_by_account(
    user_id: UserId,
    account_id: AccountId,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE user_id = :user_id AND account_id = :account_id"
        ))?
        .query_map(
            &[(":user_id", &user_id), (":account_id", &account_id)],
            map_transaction_row,
        )?
        .map(|row| row.map_err(Error::from))
        .collect()
}

/// Retrieve all of a user's transactions linked to `budget_category_id`.
///
/// The rows are unfiltered; type, status, and month scoping are applied by
/// the aggregate layer.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_transactions_by_budget_category(
    user_id: UserId,
    budget_category_id: BudgetCategoryId,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE user_id = :user_id AND budget_category_id = :budget_category_id"
        ))?
        .query_map(
            &[
                (":user_id", &user_id),
                (":budget_category_id", &budget_category_id),
            ],
            map_transaction_row,
        )?
        .map(|row| row.map_err(Error::from))
        .collect()
}

/// Retrieve all of a user's transactions whose name matches `name`
/// case-insensitively.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_transactions_by_name(
    user_id: UserId,
    name: &str,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE user_id = :user_id AND name = :name COLLATE NOCASE"
        ))?
        .query_map(
            rusqlite::named_params! {":user_id": user_id, ":name": name},
            map_transaction_row,
        )?
        .map(|row| row.map_err(Error::from))
        .collect()
}

/// Rewrite the category of every transaction of `user_id` whose trimmed name
/// exactly matches `exact_name` (case-sensitive).
///
/// Returns the number of transactions modified. This is the only mutation the
/// ledger permits after a transaction is written.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn rename_category_for_name(
    user_id: UserId,
    exact_name: &str,
    new_category: &str,
    connection: &Connection,
) -> Result<usize, Error> {
    let modified = connection.execute(
        "UPDATE \"transaction\" SET category = :category
         WHERE user_id = :user_id AND TRIM(name) = :name",
        rusqlite::named_params! {
            ":category": new_category.trim(),
            ":user_id": user_id,
            ":name": exact_name.trim(),
        },
    )?;

    Ok(modified)
}

/// Get the total number of transactions `user_id` has in the ledger.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn count_transactions(user_id: UserId, connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM \"transaction\" WHERE user_id = :user_id",
            &[(":user_id", &user_id)],
            |row| row.get(0),
        )
        .map_err(Error::from)
}

/// Map a database row to a [Transaction].
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        category: row.get(3)?,
        date: row.get(4)?,
        time: row.get(5)?,
        amount: row.get(6)?,
        transaction_type: row.get(7)?,
        status: row.get(8)?,
        account_id: row.get(9)?,
        budget_category_id: row.get(10)?,
        savings_goal_id: row.get(11)?,
        savings_amount: row.get(12)?,
        recurring_bill_id: row.get(13)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================
