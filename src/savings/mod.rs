//! Savings goals.

mod core;

pub use core::{
    NewSavingsGoal, SavingsGoal, add_contribution, create_savings_goal, create_savings_goal_table,
    get_savings_goal, list_savings_goals, map_savings_goal_row,
};
