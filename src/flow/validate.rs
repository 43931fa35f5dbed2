//! Pure input validators.
//!
//! Each validator turns raw text into a parsed value or a [`Reject`] the
//! dispatcher renders as a local re-prompt. Rejections never change session
//! state and never propagate past the dispatcher.

use super::answers::AnswerValue;

/// Why an input was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reject {
    NotANumber,
    TooShort { min: usize },
    NoCategoriesSelected,
}

impl std::fmt::Display for Reject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotANumber => {
                write!(f, "Enter the amount as a plain number, without extra symbols.")
            }
            Self::TooShort { min } => {
                write!(f, "Tell me a bit more — at least {min} characters.")
            }
            Self::NoCategoriesSelected => write!(f, "Pick at least one category first!"),
        }
    }
}

/// Parse a non-negative integer amount, ignoring embedded whitespace
/// ("80 000" is accepted). No upper bound.
pub fn parse_amount(raw: &str) -> Result<u64, Reject> {
    let cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return Err(Reject::NotANumber);
    }
    cleaned.parse::<u64>().map_err(|_| Reject::NotANumber)
}

/// Accept any trimmed string of at least `min_len` characters.
pub fn parse_free_text(raw: &str, min_len: usize) -> Result<String, Reject> {
    let trimmed = raw.trim();
    let min = min_len.max(1);
    if trimmed.chars().count() < min {
        return Err(Reject::TooShort { min });
    }
    Ok(trimmed.to_string())
}

/// Accept a duration as an integer count of months, or anything else
/// verbatim (a date-like string such as "12.2025"). Intentionally loose.
pub fn parse_duration(raw: &str) -> AnswerValue {
    let trimmed = raw.trim();
    match trimmed.parse::<u64>() {
        Ok(months) => AnswerValue::Amount(months),
        Err(_) => AnswerValue::Text(trimmed.to_string()),
    }
}
