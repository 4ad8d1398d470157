//! Month-scoped recomputation of budget spending.

use rusqlite::Connection;
use time::Date;

use crate::{
    Error,
    budget::{BudgetCategory, get_budget_category, list_budget_categories, update_budget_spent},
    database_id::{BudgetCategoryId, UserId},
    ledger::{TransactionStatus, TransactionType, get_transactions_by_budget_category},
};

/// Recompute how much of a budget category has been spent in the calendar
/// month of `reference_date`, and overwrite the stored `spent` with the
/// result.
///
/// The sum covers completed expense transactions referencing this category
/// whose date falls in the same month and year as `reference_date`. This is
/// a full replacement, not an incremental delta: re-running it is idempotent.
///
/// A category that does not exist for this user is logged and skipped, and
/// `Ok(None)` is returned; the triggering transaction write has already
/// succeeded and must not be affected.
///
/// # Errors
/// This function will return an [Error::SqlError] if the ledger cannot be
/// read or the category cannot be updated.
pub fn recompute_budget_spent(
    user_id: UserId,
    budget_category_id: BudgetCategoryId,
    reference_date: Date,
    connection: &Connection,
) -> Result<Option<i64>, Error> {
    match get_budget_category(user_id, budget_category_id, connection) {
        Ok(_) => {}
        Err(Error::NotFound) => {
            tracing::warn!(
                user_id,
                budget_category_id,
                "skipping budget recomputation: category not found for user"
            );
            return Ok(None);
        }
        Err(error) => return Err(error),
    }

    let transactions =
        get_transactions_by_budget_category(user_id, budget_category_id, connection)?;

    let spent: i64 = transactions
        .iter()
        .filter(|transaction| {
            transaction.transaction_type == TransactionType::Expense
                && transaction.status == TransactionStatus::Completed
                && transaction.date.year() == reference_date.year()
                && transaction.date.month() == reference_date.month()
        })
        .map(|transaction| transaction.amount)
        .sum();

    update_budget_spent(user_id, budget_category_id, spent, connection)?;

    Ok(Some(spent))
}

/// Retrieve all of a user's budget categories with `spent` freshly derived
/// for the month of `reference_date`.
///
/// The read-path consistency backstop for the budget list.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn list_budget_categories_with_spent(
    user_id: UserId,
    reference_date: Date,
    connection: &Connection,
) -> Result<Vec<BudgetCategory>, Error> {
    let mut categories = list_budget_categories(user_id, connection)?;

    for category in &mut categories {
        if let Some(spent) =
            recompute_budget_spent(user_id, category.id, reference_date, connection)?
        {
            category.spent = spent;
        }
    }

    Ok(categories)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod spent_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        budget::{NewBudgetCategory, create_budget_category, get_budget_category},
        db::initialize,
        ledger::{Transaction, TransactionStatus, TransactionType, append_transaction},
    };

    use super::{list_budget_categories_with_spent, recompute_budget_spent};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn groceries(conn: &Connection) -> i64 {
        create_budget_category(
            NewBudgetCategory {
                name: "Groceries".to_owned(),
                budget: 60_000,
                icon: String::new(),
                color: String::new(),
            },
            1,
            conn,
        )
        .unwrap()
        .id
    }

    fn expense(
        amount: i64,
        date: time::Date,
        budget_category_id: i64,
        conn: &Connection,
    ) -> Transaction {
        append_transaction(
            Transaction::build(1, "Supermarket", amount, date, TransactionType::Expense)
                .budget_category_id(Some(budget_category_id)),
            conn,
        )
        .unwrap()
    }

    #[test]
    fn spent_is_scoped_to_reference_month() {
        let conn = get_test_connection();
        let category_id = groceries(&conn);
        expense(1000, date!(2025 - 05 - 03), category_id, &conn);
        expense(1000, date!(2025 - 05 - 21), category_id, &conn);
        expense(5000, date!(2025 - 04 - 28), category_id, &conn);

        let spent = recompute_budget_spent(1, category_id, date!(2025 - 05 - 15), &conn).unwrap();

        assert_eq!(spent, Some(2000));
    }

    #[test]
    fn spent_excludes_income_and_unsettled_transactions() {
        let conn = get_test_connection();
        let category_id = groceries(&conn);
        expense(1000, date!(2025 - 05 - 03), category_id, &conn);
        append_transaction(
            Transaction::build(
                1,
                "Refund",
                700,
                date!(2025 - 05 - 04),
                TransactionType::Income,
            )
            .budget_category_id(Some(category_id)),
            &conn,
        )
        .unwrap();
        append_transaction(
            Transaction::build(
                1,
                "Pending Order",
                900,
                date!(2025 - 05 - 05),
                TransactionType::Expense,
            )
            .budget_category_id(Some(category_id))
            .status(TransactionStatus::Pending),
            &conn,
        )
        .unwrap();

        let spent = recompute_budget_spent(1, category_id, date!(2025 - 05 - 15), &conn).unwrap();

        assert_eq!(spent, Some(1000));
    }

    #[test]
    fn spent_is_overwritten_not_accumulated() {
        let conn = get_test_connection();
        let category_id = groceries(&conn);
        expense(1500, date!(2025 - 05 - 03), category_id, &conn);

        recompute_budget_spent(1, category_id, date!(2025 - 05 - 15), &conn).unwrap();
        recompute_budget_spent(1, category_id, date!(2025 - 05 - 15), &conn).unwrap();

        let category = get_budget_category(1, category_id, &conn).unwrap();
        assert_eq!(category.spent, 1500);
    }

    #[test]
    fn missing_category_is_skipped() {
        let conn = get_test_connection();

        let spent = recompute_budget_spent(1, 404, date!(2025 - 05 - 15), &conn).unwrap();

        assert_eq!(spent, None);
    }

    #[test]
    fn list_refreshes_every_category() {
        let conn = get_test_connection();
        let groceries_id = groceries(&conn);
        let transport_id = create_budget_category(
            NewBudgetCategory {
                name: "Transport".to_owned(),
                budget: 20_000,
                icon: String::new(),
                color: String::new(),
            },
            1,
            &conn,
        )
        .unwrap()
        .id;
        expense(2500, date!(2025 - 05 - 10), groceries_id, &conn);
        expense(320, date!(2025 - 05 - 11), transport_id, &conn);

        let categories =
            list_budget_categories_with_spent(1, date!(2025 - 05 - 15), &conn).unwrap();

        let spent: Vec<_> = categories
            .iter()
            .map(|category| (category.name.as_str(), category.spent))
            .collect();
        assert!(spent.contains(&("Groceries", 2500)));
        assert!(spent.contains(&("Transport", 320)));
    }
}
