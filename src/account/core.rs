//! Defines the core data model and database queries for accounts.

use std::fmt;
use std::str::FromStr;

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    database_id::{AccountId, UserId},
};

// ============================================================================
// MODELS
// ============================================================================

/// The kind of account, which determines the sign convention for its balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    /// An everyday bank account.
    Checking,
    /// A savings account.
    Savings,
    /// A credit card. The balance is a debt magnitude, not an asset value.
    CreditCard,
    /// An investment account.
    Investment,
    /// A loan.
    Loan,
    /// Anything else.
    Other,
}

impl AccountType {
    /// The lowercase text form stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Checking => "checking",
            AccountType::Savings => "savings",
            AccountType::CreditCard => "credit_card",
            AccountType::Investment => "investment",
            AccountType::Loan => "loan",
            AccountType::Other => "other",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = String;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text {
            "checking" => Ok(AccountType::Checking),
            "savings" => Ok(AccountType::Savings),
            "credit_card" => Ok(AccountType::CreditCard),
            "investment" => Ok(AccountType::Investment),
            "loan" => Ok(AccountType::Loan),
            "other" => Ok(AccountType::Other),
            other => Err(format!("unknown account type '{other}'")),
        }
    }
}

impl ToSql for AccountType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for AccountType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()
            .and_then(|text| text.parse().map_err(|_| FromSqlError::InvalidType))
    }
}

/// A bank account, credit card, or other pool of money that transactions
/// settle against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// The ID of the account, unique per user.
    pub id: AccountId,
    /// The ID of the user that owns this account.
    pub user_id: UserId,
    /// The display name of the account.
    pub name: String,
    /// The kind of account.
    pub account_type: AccountType,
    /// The stored balance in minor currency units.
    ///
    /// This is the baseline: it is only authoritative while no ledger
    /// transaction references the account. Once transactions exist, the
    /// ledger-derived balance supersedes it for display and is written back
    /// here best-effort.
    pub balance: i64,
    /// The credit limit, for credit cards.
    pub credit_limit: Option<i64>,
    /// The ISO currency code, e.g. "USD".
    pub currency: String,
    /// Whether the account is still in use.
    pub is_active: bool,
}

/// The client-supplied fields for creating an [Account].
#[derive(Debug, Clone, Deserialize)]
pub struct NewAccount {
    /// The display name of the account.
    pub name: String,
    /// The kind of account.
    #[serde(rename = "type")]
    pub account_type: AccountType,
    /// The opening balance in minor units. Ignored for credit cards.
    #[serde(default)]
    pub balance: i64,
    /// The credit limit, for credit cards.
    pub credit_limit: Option<i64>,
    /// The ISO currency code. Defaults to "USD".
    pub currency: Option<String>,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the account table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
                id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                account_type TEXT NOT NULL,
                balance INTEGER NOT NULL,
                credit_limit INTEGER,
                currency TEXT NOT NULL DEFAULT 'USD',
                is_active INTEGER NOT NULL DEFAULT 1,
                PRIMARY KEY (user_id, id)
                )",
        (),
    )?;

    Ok(())
}

/// Create a new account for `user_id`.
///
/// Credit cards always open with a balance of zero regardless of any
/// client-supplied opening balance; their debt is tracked from the ledger
/// alone.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn create_account(
    new_account: NewAccount,
    user_id: UserId,
    connection: &Connection,
) -> Result<Account, Error> {
    let opening_balance = match new_account.account_type {
        AccountType::CreditCard => 0,
        _ => new_account.balance,
    };
    let id: AccountId = connection
        .prepare("SELECT COALESCE(MAX(id), 0) + 1 FROM account WHERE user_id = :user_id")?
        .query_row(&[(":user_id", &user_id)], |row| row.get(0))?;

    let account = connection
        .prepare(
            "INSERT INTO account (id, user_id, name, account_type, balance, credit_limit, currency, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1)
             RETURNING id, user_id, name, account_type, balance, credit_limit, currency, is_active",
        )?
        .query_row(
            (
                id,
                user_id,
                new_account.name.trim(),
                new_account.account_type,
                opening_balance,
                new_account.credit_limit,
                new_account.currency.as_deref().unwrap_or("USD"),
            ),
            map_account_row,
        )?;

    Ok(account)
}

/// Retrieve an account by `(user_id, account_id)`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the account does not exist for this user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_account(
    user_id: UserId,
    account_id: AccountId,
    connection: &Connection,
) -> Result<Account, Error> {
    let account = connection
        .prepare(
            "SELECT id, user_id, name, account_type, balance, credit_limit, currency, is_active
             FROM account WHERE user_id = :user_id AND id = :id",
        )?
        .query_one(
            &[(":user_id", &user_id), (":id", &account_id)],
            map_account_row,
        )?;

    Ok(account)
}

/// Retrieve all accounts belonging to `user_id`, with their stored baseline
/// balances.
///
/// For ledger-derived balances, use
/// [super::list_accounts_with_balances].
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn list_accounts(user_id: UserId, connection: &Connection) -> Result<Vec<Account>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, account_type, balance, credit_limit, currency, is_active
             FROM account WHERE user_id = :user_id",
        )?
        .query_map(&[(":user_id", &user_id)], map_account_row)?
        .map(|row| row.map_err(Error::from))
        .collect()
}

/// Overwrite the stored balance of an account.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the account does not exist for this user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_account_balance(
    user_id: UserId,
    account_id: AccountId,
    balance: i64,
    connection: &Connection,
) -> Result<(), Error> {
    let modified = connection.execute(
        "UPDATE account SET balance = :balance WHERE user_id = :user_id AND id = :id",
        rusqlite::named_params! {
            ":balance": balance,
            ":user_id": user_id,
            ":id": account_id,
        },
    )?;

    if modified == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Map a database row to an [Account].
pub fn map_account_row(row: &Row) -> Result<Account, rusqlite::Error> {
    Ok(Account {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        account_type: row.get(3)?,
        balance: row.get(4)?,
        credit_limit: row.get(5)?,
        currency: row.get(6)?,
        is_active: row.get(7)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;

    use crate::{Error, db::initialize};

    use super::{AccountType, NewAccount, create_account, get_account, update_account_balance};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn checking(name: &str, balance: i64) -> NewAccount {
        NewAccount {
            name: name.to_owned(),
            account_type: AccountType::Checking,
            balance,
            credit_limit: None,
            currency: None,
        }
    }

    #[test]
    fn create_keeps_opening_balance() {
        let conn = get_test_connection();

        let account = create_account(checking("Everyday", 15_000), 1, &conn).unwrap();

        assert_eq!(account.balance, 15_000);
        assert_eq!(account.currency, "USD");
        assert!(account.is_active);
    }

    #[test]
    fn create_zeroes_credit_card_opening_balance() {
        let conn = get_test_connection();

        let account = create_account(
            NewAccount {
                name: "Visa".to_owned(),
                account_type: AccountType::CreditCard,
                balance: 99_999,
                credit_limit: Some(500_000),
                currency: None,
            },
            1,
            &conn,
        )
        .unwrap();

        assert_eq!(account.balance, 0);
        assert_eq!(account.credit_limit, Some(500_000));
    }

    #[test]
    fn get_account_is_scoped_to_user() {
        let conn = get_test_connection();
        let account = create_account(checking("Everyday", 0), 1, &conn).unwrap();

        let result = get_account(2, account.id, &conn);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn update_balance_fails_on_missing_account() {
        let conn = get_test_connection();

        let result = update_account_balance(1, 42, 1000, &conn);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn update_balance_overwrites_stored_value() {
        let conn = get_test_connection();
        let account = create_account(checking("Everyday", 500), 1, &conn).unwrap();

        update_account_balance(1, account.id, -2500, &conn).unwrap();

        let account = get_account(1, account.id, &conn).unwrap();
        assert_eq!(account.balance, -2500);
    }
}
