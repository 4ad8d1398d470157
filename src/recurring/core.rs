//! Defines the core data model and database queries for recurring bills.

use std::fmt;
use std::str::FromStr;

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, Month};

use crate::{
    Error,
    database_id::{BudgetCategoryId, RecurringBillId, UserId},
};

// ============================================================================
// MODELS
// ============================================================================

/// How often a recurring bill comes due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    /// Every 7 days.
    Weekly,
    /// Every 14 days.
    Biweekly,
    /// Every calendar month.
    Monthly,
    /// Every 3 calendar months.
    Quarterly,
    /// Every 12 calendar months.
    Yearly,
}

impl Frequency {
    /// The lowercase text form stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Weekly => "weekly",
            Frequency::Biweekly => "biweekly",
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
            Frequency::Yearly => "yearly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text {
            "weekly" => Ok(Frequency::Weekly),
            "biweekly" => Ok(Frequency::Biweekly),
            "monthly" => Ok(Frequency::Monthly),
            "quarterly" => Ok(Frequency::Quarterly),
            "yearly" => Ok(Frequency::Yearly),
            other => Err(format!("unknown frequency '{other}'")),
        }
    }
}

impl ToSql for Frequency {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Frequency {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()
            .and_then(|text| text.parse().map_err(|_| FromSqlError::InvalidType))
    }
}

/// A bill that comes due on a regular schedule, e.g. rent or a subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringBill {
    /// The ID of the bill, unique per user.
    pub id: RecurringBillId,
    /// The ID of the user that owns this bill.
    pub user_id: UserId,
    /// The display name, e.g. "Rent".
    pub name: String,
    /// The amount due each period, in minor units.
    pub amount: i64,
    /// How often the bill comes due.
    pub frequency: Frequency,
    /// When the bill is next due.
    pub next_due_date: Date,
    /// A free-form category label.
    pub category: String,
    /// The budget category payments draw from, if any.
    pub budget_category_id: Option<BudgetCategoryId>,
    /// When the bill was last paid.
    pub last_paid_date: Option<Date>,
}

/// The client-supplied fields for creating a [RecurringBill].
#[derive(Debug, Clone, Deserialize)]
pub struct NewRecurringBill {
    /// The display name.
    pub name: String,
    /// The amount due each period, in minor units.
    pub amount: i64,
    /// How often the bill comes due.
    pub frequency: Frequency,
    /// When the bill is first due.
    pub next_due_date: Date,
    /// A free-form category label.
    #[serde(default)]
    pub category: String,
    /// The budget category payments draw from.
    pub budget_category_id: Option<BudgetCategoryId>,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the recurring bill table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_recurring_bill_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS recurring_bill (
                id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                amount INTEGER NOT NULL,
                frequency TEXT NOT NULL,
                next_due_date TEXT NOT NULL,
                category TEXT NOT NULL DEFAULT '',
                budget_category_id INTEGER,
                last_paid_date TEXT,
                PRIMARY KEY (user_id, id)
                )",
        (),
    )?;

    Ok(())
}

/// Create a new recurring bill for `user_id`.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn create_recurring_bill(
    new_bill: NewRecurringBill,
    user_id: UserId,
    connection: &Connection,
) -> Result<RecurringBill, Error> {
    let id: RecurringBillId = connection
        .prepare("SELECT COALESCE(MAX(id), 0) + 1 FROM recurring_bill WHERE user_id = :user_id")?
        .query_row(&[(":user_id", &user_id)], |row| row.get(0))?;

    let bill = connection
        .prepare(
            "INSERT INTO recurring_bill
             (id, user_id, name, amount, frequency, next_due_date, category, budget_category_id, last_paid_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL)
             RETURNING id, user_id, name, amount, frequency, next_due_date, category, budget_category_id, last_paid_date",
        )?
        .query_row(
            (
                id,
                user_id,
                new_bill.name.trim(),
                new_bill.amount,
                new_bill.frequency,
                new_bill.next_due_date,
                new_bill.category,
                new_bill.budget_category_id,
            ),
            map_recurring_bill_row,
        )?;

    Ok(bill)
}

/// Retrieve a recurring bill by `(user_id, recurring_bill_id)`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the bill does not exist for this user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_recurring_bill(
    user_id: UserId,
    recurring_bill_id: RecurringBillId,
    connection: &Connection,
) -> Result<RecurringBill, Error> {
    let bill = connection
        .prepare(
            "SELECT id, user_id, name, amount, frequency, next_due_date, category, budget_category_id, last_paid_date
             FROM recurring_bill WHERE user_id = :user_id AND id = :id",
        )?
        .query_one(
            &[(":user_id", &user_id), (":id", &recurring_bill_id)],
            map_recurring_bill_row,
        )?;

    Ok(bill)
}

/// Retrieve all recurring bills belonging to `user_id`.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn list_recurring_bills(
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<RecurringBill>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, amount, frequency, next_due_date, category, budget_category_id, last_paid_date
             FROM recurring_bill WHERE user_id = :user_id",
        )?
        .query_map(&[(":user_id", &user_id)], map_recurring_bill_row)?
        .map(|row| row.map_err(Error::from))
        .collect()
}

/// Record that a bill was paid on `paid_on` and advance its due date by one
/// frequency period.
///
/// The due date advances from the bill's current `next_due_date`, not from
/// the payment date, so paying early or late does not shift the schedule.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the bill does not exist for this user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn mark_bill_paid(
    user_id: UserId,
    recurring_bill_id: RecurringBillId,
    paid_on: Date,
    connection: &Connection,
) -> Result<RecurringBill, Error> {
    let bill = get_recurring_bill(user_id, recurring_bill_id, connection)?;
    let next_due_date = advance_due_date(bill.next_due_date, bill.frequency);

    connection.execute(
        "UPDATE recurring_bill SET next_due_date = :next_due_date, last_paid_date = :last_paid_date
         WHERE user_id = :user_id AND id = :id",
        rusqlite::named_params! {
            ":next_due_date": next_due_date,
            ":last_paid_date": paid_on,
            ":user_id": user_id,
            ":id": recurring_bill_id,
        },
    )?;

    get_recurring_bill(user_id, recurring_bill_id, connection)
}

/// Map a database row to a [RecurringBill].
pub fn map_recurring_bill_row(row: &Row) -> Result<RecurringBill, rusqlite::Error> {
    Ok(RecurringBill {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        amount: row.get(3)?,
        frequency: row.get(4)?,
        next_due_date: row.get(5)?,
        category: row.get(6)?,
        budget_category_id: row.get(7)?,
        last_paid_date: row.get(8)?,
    })
}

fn advance_due_date(due_date: Date, frequency: Frequency) -> Date {
    match frequency {
        Frequency::Weekly => due_date.saturating_add(time::Duration::days(7)),
        Frequency::Biweekly => due_date.saturating_add(time::Duration::days(14)),
        Frequency::Monthly => add_months(due_date, 1),
        Frequency::Quarterly => add_months(due_date, 3),
        Frequency::Yearly => add_months(due_date, 12),
    }
}

/// Add calendar months to a date, clamping the day to the end of the target
/// month (Jan 31 + 1 month = Feb 28/29).
fn add_months(date: Date, months: i32) -> Date {
    let zero_based = date.year() * 12 + (date.month() as i32 - 1) + months;
    let year = zero_based.div_euclid(12);
    let month =
        Month::try_from((zero_based.rem_euclid(12) + 1) as u8).expect("month index is in 1..=12");
    let day = date.day().min(month.length(year));

    Date::from_calendar_date(year, month, day).expect("day is clamped to the month length")
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{Error, db::initialize};

    use super::{
        Frequency, NewRecurringBill, add_months, create_recurring_bill, mark_bill_paid,
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn rent(frequency: Frequency, conn: &Connection) -> super::RecurringBill {
        create_recurring_bill(
            NewRecurringBill {
                name: "Rent".to_owned(),
                amount: 180_000,
                frequency,
                next_due_date: date!(2025 - 01 - 31),
                category: "Housing".to_owned(),
                budget_category_id: None,
            },
            1,
            conn,
        )
        .unwrap()
    }

    #[test]
    fn mark_paid_advances_monthly_bill_with_day_clamping() {
        let conn = get_test_connection();
        let bill = rent(Frequency::Monthly, &conn);

        let bill = mark_bill_paid(1, bill.id, date!(2025 - 01 - 29), &conn).unwrap();

        assert_eq!(bill.next_due_date, date!(2025 - 02 - 28));
        assert_eq!(bill.last_paid_date, Some(date!(2025 - 01 - 29)));
    }

    #[test]
    fn mark_paid_advances_weekly_bill_by_seven_days() {
        let conn = get_test_connection();
        let bill = create_recurring_bill(
            NewRecurringBill {
                name: "Cleaner".to_owned(),
                amount: 6000,
                frequency: Frequency::Weekly,
                next_due_date: date!(2025 - 03 - 03),
                category: String::new(),
                budget_category_id: None,
            },
            1,
            &conn,
        )
        .unwrap();

        let bill = mark_bill_paid(1, bill.id, date!(2025 - 03 - 03), &conn).unwrap();

        assert_eq!(bill.next_due_date, date!(2025 - 03 - 10));
    }

    #[test]
    fn mark_paid_fails_on_missing_bill() {
        let conn = get_test_connection();

        let result = mark_bill_paid(1, 13, date!(2025 - 03 - 03), &conn);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn add_months_crosses_year_boundaries() {
        assert_eq!(add_months(date!(2025 - 11 - 15), 3), date!(2026 - 02 - 15));
        assert_eq!(add_months(date!(2025 - 02 - 28), 12), date!(2026 - 02 - 28));
    }

    #[test]
    fn add_months_clamps_leap_day() {
        assert_eq!(add_months(date!(2024 - 02 - 29), 12), date!(2025 - 02 - 28));
    }
}
