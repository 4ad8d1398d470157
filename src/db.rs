//! Database initialisation for the application.

use rusqlite::Connection;

use crate::{
    account::create_account_table, budget::create_budget_category_table,
    ledger::create_transaction_table, recurring::create_recurring_bill_table,
    savings::create_savings_goal_table,
};

/// Create the tables for all of the domain models.
///
/// # Errors
/// Returns an error if a table cannot be created or if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    create_transaction_table(connection)?;
    create_account_table(connection)?;
    create_budget_category_table(connection)?;
    create_savings_goal_table(connection)?;
    create_recurring_bill_table(connection)?;

    Ok(())
}
