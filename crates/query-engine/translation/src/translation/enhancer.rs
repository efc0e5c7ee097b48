//! Deterministic rewriting of a question into a model-ready form.

use chrono::NaiveDate;
use serde::Serialize;

use super::question::Question;
use super::temporal;

/// Abbreviations expanded before the question reaches the model.
pub const ABBREVIATIONS: &[(&str, &str)] = &[
    ("rev", "revenue"),
    ("qty", "quantity"),
    ("avg", "average"),
    ("amt", "amount"),
    ("cust", "customer"),
];

/// Punctuation that may trail a token without preventing its expansion.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', '?', '!', ';', ':'];

/// The question after normalization, with the current date appended when the
/// question talks about relative time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedQuery {
    normalized: String,
    date_context: Option<NaiveDate>,
    text: String,
}

impl EnhancedQuery {
    /// The text sent to the prompt builder.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The normalized and expanded question, without any date clause.
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// The date stated in the context clause, if one was appended.
    pub fn date_context(&self) -> Option<NaiveDate> {
        self.date_context
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl std::fmt::Display for EnhancedQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Enhance a question, treating `today` as the current date.
pub fn enhance(question: &Question, today: NaiveDate) -> EnhancedQuery {
    let normalized = normalize(question.as_str());

    let date_context = temporal::needs_date_context(&normalized).then_some(today);

    let text = match date_context {
        Some(date) if normalized.ends_with(['.', '?', '!']) => {
            format!("{normalized} Assume current date is {date}.")
        }
        Some(date) => format!("{normalized}. Assume current date is {date}."),
        None => normalized.clone(),
    };

    EnhancedQuery {
        normalized,
        date_context,
        text,
    }
}

/// Enhance a question using the local calendar date.
pub fn enhance_now(question: &Question) -> EnhancedQuery {
    enhance(question, chrono::Local::now().date_naive())
}

/// Trim, lowercase, collapse whitespace and expand abbreviations.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .map(expand_token)
        .collect::<Vec<_>>()
        .join(" ")
}

fn expand_token(token: &str) -> String {
    let word = token.trim_end_matches(TRAILING_PUNCTUATION);
    let punctuation = &token[word.len()..];

    match ABBREVIATIONS
        .iter()
        .find(|(abbreviation, _)| *abbreviation == word)
    {
        Some((_, expansion)) => format!("{expansion}{punctuation}"),
        None => token.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    fn enhanced(text: &str) -> EnhancedQuery {
        enhance(&Question::new(text).unwrap(), today())
    }

    #[test]
    fn whitespace_and_case_are_normalized() {
        let result = enhanced("  Show   ALL\tOrders\n ");
        assert_eq!(result.as_str(), "show all orders");
        assert_eq!(result.date_context(), None);
    }

    #[test]
    fn abbreviations_are_expanded() {
        let result = enhanced("Avg rev and qty per cust");
        assert_eq!(result.as_str(), "average revenue and quantity per customer");
    }

    #[test]
    fn abbreviations_keep_trailing_punctuation() {
        assert_eq!(enhanced("total rev?").as_str(), "total revenue?");
    }

    #[test]
    fn unknown_tokens_pass_through() {
        assert_eq!(enhanced("revenue reversal").as_str(), "revenue reversal");
    }

    #[test]
    fn temporal_questions_get_the_current_date() {
        let result = enhanced("devices from last week");
        assert_eq!(
            result.as_str(),
            "devices from last week. Assume current date is 2024-05-01."
        );
        assert_eq!(result.normalized(), "devices from last week");
        assert_eq!(result.date_context(), Some(today()));
    }

    #[test]
    fn trailing_punctuation_is_not_doubled() {
        assert_eq!(
            enhanced("What sold yesterday?").as_str(),
            "what sold yesterday? Assume current date is 2024-05-01."
        );
    }

    #[test]
    fn numeric_comparisons_are_left_alone() {
        let result = enhanced("records with humidity less than 70");
        assert_eq!(result.as_str(), "records with humidity less than 70");
        assert_eq!(result.as_str(), normalize("records with humidity less than 70"));
        assert_eq!(result.date_context(), None);
    }

    #[test]
    fn any_non_empty_question_enhances_to_non_empty_text() {
        for text in ["x", "?", " a ", "avg", "LAST WEEK", "> 5"] {
            assert!(!enhanced(text).as_str().is_empty(), "{text:?}");
        }
    }
}
