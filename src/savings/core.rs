//! Defines the core data model and database queries for savings goals.
//!
//! Clients enter goal amounts in major currency units; they are stored in
//! minor units (x100) like every other money field in the crate.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    database_id::{SavingsGoalId, UserId},
};

// ============================================================================
// MODELS
// ============================================================================

/// A target amount of money a user is putting aside for something.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsGoal {
    /// The ID of the savings goal, unique per user.
    pub id: SavingsGoalId,
    /// The ID of the user that owns this goal.
    pub user_id: UserId,
    /// The display name, e.g. "Holiday".
    pub name: String,
    /// How much has been saved so far, in minor units.
    pub current: i64,
    /// The target amount, in minor units.
    pub target: i64,
    /// The planned contribution per month, in minor units.
    pub monthly_contribution: i64,
    /// When the goal should be reached.
    pub due_date: Option<Date>,
}

/// The client-supplied fields for creating a [SavingsGoal].
///
/// Amounts are in whole major units and are converted to minor units on
/// insertion.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSavingsGoal {
    /// The display name.
    pub name: String,
    /// How much has already been saved, in major units.
    #[serde(default)]
    pub current: i64,
    /// The target amount, in major units.
    pub target: i64,
    /// The planned contribution per month, in major units.
    #[serde(default)]
    pub monthly_contribution: i64,
    /// When the goal should be reached.
    pub due_date: Option<Date>,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the savings goal table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_savings_goal_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS savings_goal (
                id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                current INTEGER NOT NULL DEFAULT 0,
                target INTEGER NOT NULL,
                monthly_contribution INTEGER NOT NULL DEFAULT 0,
                due_date TEXT,
                PRIMARY KEY (user_id, id)
                )",
        (),
    )?;

    Ok(())
}

/// Create a new savings goal for `user_id`, converting the major-unit
/// amounts to minor units.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn create_savings_goal(
    new_goal: NewSavingsGoal,
    user_id: UserId,
    connection: &Connection,
) -> Result<SavingsGoal, Error> {
    let id: SavingsGoalId = connection
        .prepare("SELECT COALESCE(MAX(id), 0) + 1 FROM savings_goal WHERE user_id = :user_id")?
        .query_row(&[(":user_id", &user_id)], |row| row.get(0))?;

    let goal = connection
        .prepare(
            "INSERT INTO savings_goal (id, user_id, name, current, target, monthly_contribution, due_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING id, user_id, name, current, target, monthly_contribution, due_date",
        )?
        .query_row(
            (
                id,
                user_id,
                new_goal.name.trim(),
                new_goal.current * 100,
                new_goal.target * 100,
                new_goal.monthly_contribution * 100,
                new_goal.due_date,
            ),
            map_savings_goal_row,
        )?;

    Ok(goal)
}

/// Retrieve a savings goal by `(user_id, savings_goal_id)`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the goal does not exist for this user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_savings_goal(
    user_id: UserId,
    savings_goal_id: SavingsGoalId,
    connection: &Connection,
) -> Result<SavingsGoal, Error> {
    let goal = connection
        .prepare(
            "SELECT id, user_id, name, current, target, monthly_contribution, due_date
             FROM savings_goal WHERE user_id = :user_id AND id = :id",
        )?
        .query_one(
            &[(":user_id", &user_id), (":id", &savings_goal_id)],
            map_savings_goal_row,
        )?;

    Ok(goal)
}

/// Retrieve all savings goals belonging to `user_id`.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn list_savings_goals(
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<SavingsGoal>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, current, target, monthly_contribution, due_date
             FROM savings_goal WHERE user_id = :user_id",
        )?
        .query_map(&[(":user_id", &user_id)], map_savings_goal_row)?
        .map(|row| row.map_err(Error::from))
        .collect()
}

/// Add a contribution in minor units to a goal's running total.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the goal does not exist for this user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn add_contribution(
    user_id: UserId,
    savings_goal_id: SavingsGoalId,
    amount: i64,
    connection: &Connection,
) -> Result<SavingsGoal, Error> {
    let modified = connection.execute(
        "UPDATE savings_goal SET current = current + :amount
         WHERE user_id = :user_id AND id = :id",
        rusqlite::named_params! {
            ":amount": amount,
            ":user_id": user_id,
            ":id": savings_goal_id,
        },
    )?;

    if modified == 0 {
        return Err(Error::NotFound);
    }

    get_savings_goal(user_id, savings_goal_id, connection)
}

/// Map a database row to a [SavingsGoal].
pub fn map_savings_goal_row(row: &Row) -> Result<SavingsGoal, rusqlite::Error> {
    Ok(SavingsGoal {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        current: row.get(3)?,
        target: row.get(4)?,
        monthly_contribution: row.get(5)?,
        due_date: row.get(6)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{Error, db::initialize};

    use super::{NewSavingsGoal, add_contribution, create_savings_goal};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn create_converts_major_units_to_minor() {
        let conn = get_test_connection();

        let goal = create_savings_goal(
            NewSavingsGoal {
                name: "Holiday".to_owned(),
                current: 250,
                target: 3000,
                monthly_contribution: 150,
                due_date: Some(date!(2026 - 06 - 01)),
            },
            1,
            &conn,
        )
        .unwrap();

        assert_eq!(goal.current, 25_000);
        assert_eq!(goal.target, 300_000);
        assert_eq!(goal.monthly_contribution, 15_000);
    }

    #[test]
    fn contributions_accumulate_in_minor_units() {
        let conn = get_test_connection();
        let goal = create_savings_goal(
            NewSavingsGoal {
                name: "Emergency Fund".to_owned(),
                current: 0,
                target: 5000,
                monthly_contribution: 0,
                due_date: None,
            },
            1,
            &conn,
        )
        .unwrap();

        let goal = add_contribution(1, goal.id, 7550, &conn).unwrap();

        assert_eq!(goal.current, 7550);
    }

    #[test]
    fn contribution_to_missing_goal_fails() {
        let conn = get_test_connection();

        assert_eq!(add_contribution(1, 9, 100, &conn), Err(Error::NotFound));
    }
}
