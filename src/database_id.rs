//! Type aliases for database row identifiers.
//!
//! Every entity is keyed by `(user_id, id)` where the id is unique per user
//! per entity type, not globally unique.

/// The integer type used for database row IDs.
pub type DatabaseId = i64;

/// The ID of the user that owns a row.
pub type UserId = DatabaseId;

/// The ID of a transaction in the ledger.
pub type TransactionId = DatabaseId;

/// The ID of an account.
pub type AccountId = DatabaseId;

/// The ID of a budget category.
pub type BudgetCategoryId = DatabaseId;

/// The ID of a savings goal.
pub type SavingsGoalId = DatabaseId;

/// The ID of a recurring bill.
pub type RecurringBillId = DatabaseId;
