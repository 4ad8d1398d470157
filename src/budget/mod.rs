//! Budget categories and the spending half of the aggregate engine.

mod aggregate;
mod core;

pub use aggregate::{list_budget_categories_with_spent, recompute_budget_spent};
pub use core::{
    BudgetCategory, NewBudgetCategory, create_budget_category, create_budget_category_table,
    get_budget_category, list_budget_categories, map_budget_category_row, update_budget_spent,
};
