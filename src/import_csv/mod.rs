//! Parses extracted transaction candidates into importable records.
//!
//! The statement-extraction pipeline hands over its results as CSV with the
//! columns `name, category, date, time, amount, type, account_id,
//! budget_category_id` (header row required, amounts as decimal strings in
//! major units, dates as `YYYY-MM-DD`). This module turns that file into
//! [NewTransaction] values ready for
//! [crate::service::import_transactions].

use serde::Deserialize;
use time::{Date, macros::format_description};

use crate::{Error, service::NewTransaction};

#[derive(Debug, Deserialize)]
struct CandidateRecord {
    name: String,
    #[serde(default)]
    category: Option<String>,
    date: String,
    #[serde(default)]
    time: Option<String>,
    amount: String,
    #[serde(rename = "type")]
    transaction_type: String,
    #[serde(default)]
    account_id: Option<i64>,
    #[serde(default)]
    budget_category_id: Option<i64>,
}

/// Parse a candidate CSV file into a batch of [NewTransaction] values.
///
/// The whole file must parse: one malformed row rejects the file, matching
/// the all-or-nothing contract of the import it feeds.
///
/// # Errors
/// This function will return an [Error::InvalidCandidateFile] naming the
/// first row that could not be parsed.
pub fn parse_candidates(csv_text: &str) -> Result<Vec<NewTransaction>, Error> {
    let mut reader = csv::Reader::from_reader(csv_text.as_bytes());
    let mut candidates = Vec::new();

    for (index, result) in reader.deserialize::<CandidateRecord>().enumerate() {
        // Row numbers are 1-based and skip the header.
        let row = index + 2;
        let record =
            result.map_err(|error| Error::InvalidCandidateFile(format!("row {row}: {error}")))?;

        let date = Date::parse(
            record.date.trim(),
            format_description!("[year]-[month]-[day]"),
        )
        .map_err(|_| {
            Error::InvalidCandidateFile(format!("row {row}: invalid date '{}'", record.date))
        })?;

        let amount = parse_minor_units(&record.amount).ok_or_else(|| {
            Error::InvalidCandidateFile(format!("row {row}: invalid amount '{}'", record.amount))
        })?;

        let transaction_type = record.transaction_type.trim().parse().map_err(|_| {
            Error::InvalidCandidateFile(format!(
                "row {row}: invalid transaction type '{}'",
                record.transaction_type
            ))
        })?;

        candidates.push(NewTransaction {
            name: Some(record.name),
            category: record.category.filter(|category| !category.trim().is_empty()),
            date: Some(date),
            time: record.time.filter(|time| !time.trim().is_empty()),
            amount: Some(amount),
            transaction_type: Some(transaction_type),
            account_id: record.account_id,
            budget_category_id: record.budget_category_id,
            ..NewTransaction::default()
        });
    }

    Ok(candidates)
}

/// Parse a non-negative decimal string in major units ("12.34", "12.5",
/// "12") into minor units, with integer arithmetic only. More than two
/// decimal places is rejected rather than rounded.
fn parse_minor_units(text: &str) -> Option<i64> {
    let text = text.trim();
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (text, ""),
    };

    if whole.is_empty() || !whole.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    if fraction.len() > 2 || !fraction.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }

    let whole: i64 = whole.parse().ok()?;
    let cents: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().ok()? * 10,
        _ => fraction.parse().ok()?,
    };

    whole.checked_mul(100)?.checked_add(cents)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod parse_tests {
    use time::macros::date;

    use crate::{Error, ledger::TransactionType};

    use super::{parse_candidates, parse_minor_units};

    const VALID_CSV: &str = "\
name,category,date,time,amount,type,account_id,budget_category_id
Corner Dairy,Food,2025-06-01,09:15,4.50,expense,1,
Payday,,2025-06-02,,2500,income,,
Bus Fare,Transport,2025-06-03,,3.2,expense,,2
";

    #[test]
    fn parses_valid_candidates() {
        let candidates = parse_candidates(VALID_CSV).unwrap();

        assert_eq!(candidates.len(), 3);

        assert_eq!(candidates[0].name.as_deref(), Some("Corner Dairy"));
        assert_eq!(candidates[0].category.as_deref(), Some("Food"));
        assert_eq!(candidates[0].date, Some(date!(2025 - 06 - 01)));
        assert_eq!(candidates[0].time.as_deref(), Some("09:15"));
        assert_eq!(candidates[0].amount, Some(450));
        assert_eq!(
            candidates[0].transaction_type,
            Some(TransactionType::Expense)
        );
        assert_eq!(candidates[0].account_id, Some(1));

        assert_eq!(candidates[1].category, None);
        assert_eq!(candidates[1].amount, Some(250_000));
        assert_eq!(candidates[1].transaction_type, Some(TransactionType::Income));

        assert_eq!(candidates[2].amount, Some(320));
        assert_eq!(candidates[2].budget_category_id, Some(2));
    }

    #[test]
    fn rejects_file_with_bad_date() {
        let csv_text = "\
name,category,date,time,amount,type,account_id,budget_category_id
Corner Dairy,Food,junk,,4.50,expense,,
";

        let result = parse_candidates(csv_text);

        assert!(matches!(result, Err(Error::InvalidCandidateFile(_))));
    }

    #[test]
    fn rejects_file_with_bad_transaction_type() {
        let csv_text = "\
name,category,date,time,amount,type,account_id,budget_category_id
Corner Dairy,Food,2025-06-01,,4.50,transfer,,
";

        let result = parse_candidates(csv_text);

        assert!(matches!(result, Err(Error::InvalidCandidateFile(_))));
    }

    #[test]
    fn minor_unit_parsing_is_integer_only() {
        assert_eq!(parse_minor_units("12.34"), Some(1234));
        assert_eq!(parse_minor_units("12.3"), Some(1230));
        assert_eq!(parse_minor_units("12"), Some(1200));
        assert_eq!(parse_minor_units("0.05"), Some(5));
        assert_eq!(parse_minor_units("12.345"), None);
        assert_eq!(parse_minor_units("-1.00"), None);
        assert_eq!(parse_minor_units(""), None);
        assert_eq!(parse_minor_units("1,000"), None);
    }

    #[test]
    fn minor_unit_parsing_rejects_amount_too_large_to_represent() {
        assert_eq!(parse_minor_units("92233720368547758.07"), Some(i64::MAX));
        assert_eq!(parse_minor_units("92233720368547758.08"), None);
        assert_eq!(parse_minor_units("99999999999999999999"), None);
    }
}
