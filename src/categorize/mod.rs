//! Suggests a category for a new or uncategorised transaction by fuzzy
//! name-similarity over the user's transaction history.
//!
//! The matching is deliberately cheap: lowercase the names, look for exact
//! matches, shared significant words, or whole-name containment, then tally
//! the categories of whatever matched. No external index and no state; the
//! functions here are pure over the history slice they are given.

use rusqlite::Connection;

use crate::{
    Error,
    database_id::UserId,
    ledger::{Transaction, get_transactions_by_user},
};

/// The default confidence a category must reach before it is suggested.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.6;

/// A candidate category for a transaction name, with the evidence behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySuggestion {
    /// The suggested category label.
    pub category: String,
    /// The share of similar history entries carrying this category, in
    /// `0.0..=1.0`.
    pub confidence: f64,
    /// How many similar history entries carried this category.
    pub count: usize,
}

/// Suggest the most likely category for `name`, or `None` when the history
/// holds nothing similar enough.
///
/// Returns the most frequent category among similar history entries iff its
/// share of the similar entries reaches `min_confidence`
/// ([DEFAULT_MIN_CONFIDENCE] is the usual threshold). Ties go to the
/// category encountered first in `history` order, deterministically for a
/// fixed input ordering.
pub fn suggest_category(
    name: &str,
    history: &[Transaction],
    min_confidence: f64,
) -> Option<String> {
    let ranked = suggest_categories(name, history);

    ranked
        .into_iter()
        .next()
        .filter(|suggestion| suggestion.confidence >= min_confidence)
        .map(|suggestion| suggestion.category)
}

/// Rank every category found among history entries similar to `name`.
///
/// Each suggestion carries its confidence (share of similar entries) and raw
/// count. The result is sorted descending by confidence with a stable sort:
/// equal-confidence categories keep their first-encountered order rather
/// than being re-sorted alphabetically. Returns an empty vector when `name`
/// is blank, the history is empty, or nothing is similar.
pub fn suggest_categories(name: &str, history: &[Transaction]) -> Vec<CategorySuggestion> {
    let candidate = name.trim().to_lowercase();
    if candidate.is_empty() || history.is_empty() {
        return Vec::new();
    }
    let candidate_words = significant_words(&candidate);

    let similar: Vec<&Transaction> = history
        .iter()
        .filter(|entry| is_similar(&candidate, &candidate_words, &entry.name))
        .collect();
    if similar.is_empty() {
        return Vec::new();
    }

    // Uncategorised entries count toward the denominator but are never
    // suggested.
    let mut tally: Vec<(String, usize)> = Vec::new();
    for entry in &similar {
        let category = entry.category.trim();
        if category.is_empty() {
            continue;
        }
        match tally.iter_mut().find(|(name, _)| name == category) {
            Some((_, count)) => *count += 1,
            None => tally.push((category.to_owned(), 1)),
        }
    }

    let total = similar.len();
    let mut suggestions: Vec<CategorySuggestion> = tally
        .into_iter()
        .map(|(category, count)| CategorySuggestion {
            category,
            confidence: count as f64 / total as f64,
            count,
        })
        .collect();

    // sort_by is stable, so ties keep their tally (first-encounter) order.
    suggestions.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    suggestions
}

/// Suggest a category for `name` from the user's whole ledger history, using
/// the default confidence threshold.
///
/// # Errors
/// This function will return an [Error::SqlError] if the history cannot be
/// read.
pub fn suggest_for_user(
    name: &str,
    user_id: UserId,
    connection: &Connection,
) -> Result<Option<String>, Error> {
    let history = get_transactions_by_user(user_id, connection)?;

    Ok(suggest_category(name, &history, DEFAULT_MIN_CONFIDENCE))
}

/// A history entry is similar when the names match exactly, share a
/// significant word (substring containment either direction), or one full
/// name contains the other.
fn is_similar(candidate: &str, candidate_words: &[&str], entry_name: &str) -> bool {
    let entry = entry_name.trim().to_lowercase();
    if entry.is_empty() {
        return false;
    }

    if entry == candidate {
        return true;
    }

    let entry_words = significant_words(&entry);
    let words_overlap = candidate_words.iter().any(|candidate_word| {
        entry_words
            .iter()
            .any(|entry_word| candidate_word.contains(entry_word) || entry_word.contains(candidate_word))
    });
    if words_overlap {
        return true;
    }

    candidate.contains(&entry) || entry.contains(candidate)
}

/// Whitespace-delimited tokens longer than 2 characters.
fn significant_words(text: &str) -> Vec<&str> {
    text.split_whitespace().filter(|word| word.len() > 2).collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod suggestion_tests {
    use time::macros::date;

    use crate::ledger::{Transaction, TransactionStatus, TransactionType};

    use super::{DEFAULT_MIN_CONFIDENCE, suggest_categories, suggest_category};

    fn entry(name: &str, category: &str) -> Transaction {
        Transaction {
            id: 1,
            user_id: 1,
            name: name.to_owned(),
            category: category.to_owned(),
            date: date!(2025 - 01 - 15),
            time: "00:00".to_owned(),
            amount: 1000,
            transaction_type: TransactionType::Expense,
            status: TransactionStatus::Completed,
            account_id: None,
            budget_category_id: None,
            savings_goal_id: None,
            savings_amount: None,
            recurring_bill_id: None,
        }
    }

    fn grocery_history() -> Vec<Transaction> {
        vec![
            entry("Grocery Store", "Food"),
            entry("Grocery Shopping", "Food"),
            entry("Walmart Grocery", "Food"),
        ]
    }

    #[test]
    fn suggests_dominant_category_of_similar_entries() {
        let suggestion =
            suggest_category("Grocery Run", &grocery_history(), DEFAULT_MIN_CONFIDENCE);

        assert_eq!(suggestion, Some("Food".to_owned()));
    }

    #[test]
    fn returns_none_when_nothing_is_similar() {
        let suggestion = suggest_category(
            "Totally Unrelated Zzzqx",
            &grocery_history(),
            DEFAULT_MIN_CONFIDENCE,
        );

        assert_eq!(suggestion, None);
    }

    #[test]
    fn returns_none_for_blank_name_or_empty_history() {
        assert_eq!(
            suggest_category("   ", &grocery_history(), DEFAULT_MIN_CONFIDENCE),
            None
        );
        assert_eq!(suggest_category("Grocery Run", &[], DEFAULT_MIN_CONFIDENCE), None);
    }

    #[test]
    fn returns_none_below_confidence_threshold() {
        let history = vec![
            entry("Grocery Store", "Food"),
            entry("Grocery Gadgets", "Electronics"),
        ];

        // Both categories sit at 0.5, under the 0.6 default.
        let suggestion = suggest_category("Grocery Run", &history, DEFAULT_MIN_CONFIDENCE);

        assert_eq!(suggestion, None);
    }

    #[test]
    fn exact_match_is_similar_without_shared_significant_words() {
        let history = vec![entry("KF", "Takeaways")];

        let suggestion = suggest_category("kf", &history, DEFAULT_MIN_CONFIDENCE);

        assert_eq!(suggestion, Some("Takeaways".to_owned()));
    }

    #[test]
    fn full_name_containment_is_similar() {
        let history = vec![entry("Go!", "Transport")];

        // "go" is too short to be a significant word, so only the whole-name
        // containment clause can match here.
        let suggestion = suggest_category("Go", &history, DEFAULT_MIN_CONFIDENCE);

        assert_eq!(suggestion, Some("Transport".to_owned()));
    }

    #[test]
    fn ranked_suggestions_cover_all_categories() {
        let history = vec![
            entry("Grocery Store", "Food"),
            entry("Grocery Shopping", "Food"),
            entry("Grocery Gadgets", "Electronics"),
        ];

        let ranked = suggest_categories("Grocery Run", &history);

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].category, "Food");
        assert_eq!(ranked[0].count, 2);
        assert!((ranked[0].confidence - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(ranked[1].category, "Electronics");
        assert_eq!(ranked[1].count, 1);
    }

    #[test]
    fn equal_confidence_keeps_first_encountered_order() {
        let history = vec![
            entry("Grocery One", "Zebra"),
            entry("Grocery Two", "Apple"),
            entry("Grocery Three", "Zebra"),
            entry("Grocery Four", "Apple"),
        ];

        let ranked = suggest_categories("Grocery Run", &history);

        // "Zebra" was encountered first and must stay ahead of "Apple"
        // despite sorting after it alphabetically.
        assert_eq!(ranked[0].category, "Zebra");
        assert_eq!(ranked[1].category, "Apple");
        assert_eq!(ranked[0].confidence, ranked[1].confidence);
    }

    #[test]
    fn uncategorised_entries_dilute_confidence() {
        let history = vec![
            entry("Grocery Store", "Food"),
            entry("Grocery Shopping", ""),
        ];

        let ranked = suggest_categories("Grocery Run", &history);

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].category, "Food");
        assert!((ranked[0].confidence - 0.5).abs() < 1e-9);
    }

    #[test]
    fn ranked_suggestions_empty_when_nothing_similar() {
        let ranked = suggest_categories("Totally Unrelated Zzzqx", &grocery_history());

        assert!(ranked.is_empty());
    }
}
