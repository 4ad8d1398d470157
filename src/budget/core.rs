//! Defines the core data model and database queries for budget categories.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    database_id::{BudgetCategoryId, UserId},
};

// ============================================================================
// MODELS
// ============================================================================

/// A monthly spending target for a slice of a user's expenses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetCategory {
    /// The ID of the budget category, unique per user.
    pub id: BudgetCategoryId,
    /// The ID of the user that owns this budget category.
    pub user_id: UserId,
    /// The display name, e.g. "Groceries".
    pub name: String,
    /// The target ceiling for a month, in minor currency units.
    pub budget: i64,
    /// How much has been spent, in minor units.
    ///
    /// Derived, not ground truth: the sum of completed expense transactions
    /// referencing this category within a single calendar month, overwritten
    /// by [super::recompute_budget_spent]. Not a running total.
    pub spent: i64,
    /// An icon identifier for the UI.
    pub icon: String,
    /// A display colour for the UI.
    pub color: String,
}

/// The client-supplied fields for creating a [BudgetCategory].
#[derive(Debug, Clone, Deserialize)]
pub struct NewBudgetCategory {
    /// The display name.
    pub name: String,
    /// The target ceiling in minor units.
    pub budget: i64,
    /// An icon identifier for the UI.
    #[serde(default)]
    pub icon: String,
    /// A display colour for the UI.
    #[serde(default)]
    pub color: String,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the budget category table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_budget_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget_category (
                id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                budget INTEGER NOT NULL,
                spent INTEGER NOT NULL DEFAULT 0,
                icon TEXT NOT NULL DEFAULT '',
                color TEXT NOT NULL DEFAULT '',
                PRIMARY KEY (user_id, id)
                )",
        (),
    )?;

    Ok(())
}

/// Create a new budget category for `user_id`, with nothing spent yet.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn create_budget_category(
    new_category: NewBudgetCategory,
    user_id: UserId,
    connection: &Connection,
) -> Result<BudgetCategory, Error> {
    let id: BudgetCategoryId = connection
        .prepare("SELECT COALESCE(MAX(id), 0) + 1 FROM budget_category WHERE user_id = :user_id")?
        .query_row(&[(":user_id", &user_id)], |row| row.get(0))?;

    let category = connection
        .prepare(
            "INSERT INTO budget_category (id, user_id, name, budget, spent, icon, color)
             VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6)
             RETURNING id, user_id, name, budget, spent, icon, color",
        )?
        .query_row(
            (
                id,
                user_id,
                new_category.name.trim(),
                new_category.budget,
                new_category.icon,
                new_category.color,
            ),
            map_budget_category_row,
        )?;

    Ok(category)
}

/// Retrieve a budget category by `(user_id, budget_category_id)`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the category does not exist for this user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_budget_category(
    user_id: UserId,
    budget_category_id: BudgetCategoryId,
    connection: &Connection,
) -> Result<BudgetCategory, Error> {
    let category = connection
        .prepare(
            "SELECT id, user_id, name, budget, spent, icon, color
             FROM budget_category WHERE user_id = :user_id AND id = :id",
        )?
        .query_one(
            &[(":user_id", &user_id), (":id", &budget_category_id)],
            map_budget_category_row,
        )?;

    Ok(category)
}

/// Retrieve all budget categories belonging to `user_id`, with their stored
/// `spent` values.
///
/// For freshly derived values, use
/// [super::list_budget_categories_with_spent].
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn list_budget_categories(
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<BudgetCategory>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, budget, spent, icon, color
             FROM budget_category WHERE user_id = :user_id",
        )?
        .query_map(&[(":user_id", &user_id)], map_budget_category_row)?
        .map(|row| row.map_err(Error::from))
        .collect()
}

/// Overwrite the stored `spent` value of a budget category.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the category does not exist for this user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_budget_spent(
    user_id: UserId,
    budget_category_id: BudgetCategoryId,
    spent: i64,
    connection: &Connection,
) -> Result<(), Error> {
    let modified = connection.execute(
        "UPDATE budget_category SET spent = :spent WHERE user_id = :user_id AND id = :id",
        rusqlite::named_params! {
            ":spent": spent,
            ":user_id": user_id,
            ":id": budget_category_id,
        },
    )?;

    if modified == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Map a database row to a [BudgetCategory].
pub fn map_budget_category_row(row: &Row) -> Result<BudgetCategory, rusqlite::Error> {
    Ok(BudgetCategory {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        budget: row.get(3)?,
        spent: row.get(4)?,
        icon: row.get(5)?,
        color: row.get(6)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================
