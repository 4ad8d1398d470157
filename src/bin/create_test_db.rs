use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::macros::date;

use pocketbook::{
    account::{AccountType, NewAccount, create_account},
    budget::{NewBudgetCategory, create_budget_category},
    db::initialize,
    ledger::{TransactionStatus, TransactionType},
    recurring::{Frequency, NewRecurringBill, create_recurring_bill},
    savings::{NewSavingsGoal, create_savings_goal},
    service::{NewTransaction, create_transaction},
};

/// A utility for creating a seeded test database for pocketbook.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize(&conn)?;

    println!("Seeding test data for user 1...");
    let user_id = 1;

    let checking = create_account(
        NewAccount {
            name: "Everyday Checking".to_owned(),
            account_type: AccountType::Checking,
            balance: 250_000,
            credit_limit: None,
            currency: None,
        },
        user_id,
        &conn,
    )?;
    let visa = create_account(
        NewAccount {
            name: "Visa".to_owned(),
            account_type: AccountType::CreditCard,
            balance: 0,
            credit_limit: Some(500_000),
            currency: None,
        },
        user_id,
        &conn,
    )?;

    let groceries = create_budget_category(
        NewBudgetCategory {
            name: "Groceries".to_owned(),
            budget: 60_000,
            icon: "cart".to_owned(),
            color: "#4caf50".to_owned(),
        },
        user_id,
        &conn,
    )?;

    create_savings_goal(
        NewSavingsGoal {
            name: "Holiday".to_owned(),
            current: 250,
            target: 3000,
            monthly_contribution: 150,
            due_date: Some(date!(2026 - 12 - 01)),
        },
        user_id,
        &conn,
    )?;

    create_recurring_bill(
        NewRecurringBill {
            name: "Rent".to_owned(),
            amount: 180_000,
            frequency: Frequency::Monthly,
            next_due_date: date!(2025 - 07 - 01),
            category: "Housing".to_owned(),
            budget_category_id: None,
        },
        user_id,
        &conn,
    )?;

    let seed_transactions = [
        ("Payday", 250_000, TransactionType::Income, None, None),
        (
            "Supermarket",
            8_540,
            TransactionType::Expense,
            Some(checking.id),
            Some(groceries.id),
        ),
        (
            "Petrol",
            6_200,
            TransactionType::Expense,
            Some(visa.id),
            None,
        ),
        (
            "Corner Dairy",
            450,
            TransactionType::Expense,
            Some(checking.id),
            Some(groceries.id),
        ),
    ];

    for (name, amount, transaction_type, account_id, budget_category_id) in seed_transactions {
        create_transaction(
            NewTransaction {
                name: Some(name.to_owned()),
                category: Some("Seeded".to_owned()),
                date: Some(date!(2025 - 06 - 15)),
                amount: Some(amount),
                transaction_type: Some(transaction_type),
                status: Some(TransactionStatus::Completed),
                account_id,
                budget_category_id,
                ..NewTransaction::default()
            },
            user_id,
            &conn,
        )?;
    }

    println!("Success!");

    Ok(())
}
