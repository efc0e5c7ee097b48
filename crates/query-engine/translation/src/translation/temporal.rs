//! Decide whether a question needs the current date as context.
//!
//! Relative date words ("last week", "yesterday", "latest") only make sense
//! to the model if it knows what day it is. Numeric thresholds on the other
//! hand ("humidity less than 70") are easily mistaken for date literals once a
//! date appears in the prompt, so any numeric comparison suppresses the clause.

use once_cell::sync::Lazy;
use regex::Regex;

static TEMPORAL_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?xi)
        \b(?:
            today | tonight | yesterday | tomorrow
          | recent | recently | latest | newest | current | currently | now | ago
          | (?:mon|tues|wednes|thurs|fri|satur|sun)days?
          | (?:this|last|past|previous|next)\s+(?:day|night|week|weekend|month|quarter|year)
          | (?:last|past|previous|next)\s+\d+\s+(?:hours?|days?|weeks?|months?|quarters?|years?)
          | ytd | mtd | qtd
          | (?:year|month|quarter)[\s-]to[\s-]date
        )\b",
    )
    .expect("temporal reference pattern is valid")
});

static NUMERIC_COMPARISON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?xi)
            (?:<=|>=|<>|!=|==|<|>|=)\s*[-+$]?\d
          | \d\s*(?:<=|>=|<>|!=|<|>)
          | \b(?:
                (?:less|greater|more|fewer|higher|lower|bigger|smaller|larger)\s+than
              | at\s+(?:least|most)
              | above | below | over | under | exceeding | exceeds | between
              | equal\s+to | equals
            )
            \s+(?:or\s+equal\s+to\s+)?[-+$]?\d",
    )
    .expect("numeric comparison pattern is valid")
});

/// Does the text refer to a point in time relative to today?
pub fn has_temporal_reference(text: &str) -> bool {
    TEMPORAL_REFERENCE.is_match(text)
}

/// Does the text compare a quantity against a number?
pub fn has_numeric_comparison(text: &str) -> bool {
    NUMERIC_COMPARISON.is_match(text)
}

/// Should the current date be appended to this text?
///
/// True iff the text contains a relative time reference and no numeric
/// comparison.
pub fn needs_date_context(text: &str) -> bool {
    has_temporal_reference(text) && !has_numeric_comparison(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_date_words_need_context() {
        for text in [
            "devices from last week",
            "show the latest readings",
            "orders placed yesterday",
            "sales on monday",
            "revenue in the past 30 days",
            "what happened this quarter",
            "events from 3 days ago",
            "ytd revenue by region",
            "RECENT alerts",
        ] {
            assert!(needs_date_context(text), "expected date context for {text:?}");
        }
    }

    #[test]
    fn numeric_comparisons_do_not_need_context() {
        for text in [
            "records with humidity less than 70",
            "temperature >= 30",
            "orders with total > 100",
            "customers with at least 5 orders",
            "readings between 10 and 20",
            "prices less than or equal to 9.99",
            "amount over $500",
        ] {
            assert!(!needs_date_context(text), "unexpected date context for {text:?}");
        }
    }

    #[test]
    fn numeric_comparison_wins_over_temporal_words() {
        let text = "devices with more than 5 errors in the last week";
        assert!(has_temporal_reference(text));
        assert!(has_numeric_comparison(text));
        assert!(!needs_date_context(text));
    }

    #[test]
    fn words_that_merely_contain_temporal_terms_are_ignored() {
        for text in [
            "list the last name of every customer",
            "how many orders are there?",
            "q3 revenue",
            "nowhere to be found",
            "sundays_table rows",
        ] {
            assert!(!has_temporal_reference(text), "unexpected temporal match in {text:?}");
        }
    }

    #[test]
    fn comparison_words_without_numbers_are_not_numeric() {
        assert!(!has_numeric_comparison("devices over the last week"));
        assert!(!has_numeric_comparison("readings below freezing"));
    }
}
