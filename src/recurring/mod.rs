//! Recurring bills: schedule metadata, not part of the aggregate engine.

mod core;

pub use core::{
    Frequency, NewRecurringBill, RecurringBill, create_recurring_bill,
    create_recurring_bill_table, get_recurring_bill, list_recurring_bills, map_recurring_bill_row,
    mark_bill_paid,
};
