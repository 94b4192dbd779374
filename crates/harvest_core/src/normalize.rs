//! Field normalization for raw listing cell text.
//!
//! Every function here is pure and idempotent: feeding a normalized value back
//! in yields the same value.

use std::sync::OnceLock;

use regex::Regex;

fn count_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d[\d,]*").expect("valid count pattern"))
}

/// A day unit directly after a digit or a space; words like "Sunday" never match.
fn day_suffix_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)[\d\s](?:days?|일)$").expect("valid day suffix pattern"))
}

fn year_registration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\[\s*(\d{4})\s*\](?:\s*,?\s*(\d{4})(?:\s*\.\s*(\d{1,2}))?)?")
            .expect("valid year/registration pattern")
    })
}

/// Trim surrounding whitespace and collapse internal whitespace runs to one space.
pub fn clean_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip trailing day-unit suffixes ("3 days", "12일") from an elapsed-days cell.
pub fn strip_day_suffix(raw: &str) -> String {
    let mut text = clean_text(raw);
    while let Some(found) = day_suffix_pattern().find(&text) {
        let boundary = text[found.start()..]
            .chars()
            .next()
            .map_or(0, char::len_utf8);
        text = text[..found.start() + boundary].trim_end().to_string();
    }
    text
}

/// Parse the first run of digits and grouping separators as an integer.
///
/// Returns `None` when the cell has no digits; zero is a real value and is
/// never used to mean "absent".
pub fn parse_count(raw: &str) -> Option<u64> {
    let found = count_pattern().find(raw)?;
    let digits: String = found.as_str().chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// Render [`parse_count`] back to cell text: the integer, or blank when absent.
pub fn normalize_count(raw: &str) -> String {
    parse_count(raw).map(|n| n.to_string()).unwrap_or_default()
}

/// Split the combined `[YYYY] , YYYY.MM` cell into model year and registration date.
///
/// The registration date is only filled when both its year and month are present,
/// and the month is zero-padded (`2019.5` becomes `2019.05`).
pub fn split_model_year(raw: &str) -> (String, String) {
    let text = clean_text(raw);
    let Some(caps) = year_registration_pattern().captures(&text) else {
        return (String::new(), String::new());
    };
    let model_year = caps
        .get(1)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();
    let registration = match (caps.get(2), caps.get(3)) {
        (Some(year), Some(month)) => format!("{}.{:0>2}", year.as_str(), month.as_str()),
        _ => String::new(),
    };
    (model_year, registration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_suffix_is_stripped_repeatedly() {
        assert_eq!(strip_day_suffix("3 days"), "3");
        assert_eq!(strip_day_suffix("1 Day"), "1");
        assert_eq!(strip_day_suffix("12일"), "12");
        assert_eq!(strip_day_suffix("5 days days"), "5");
        assert_eq!(strip_day_suffix("   "), "");
    }

    #[test]
    fn count_ignores_trailing_units() {
        assert_eq!(parse_count("1,250만원"), Some(1250));
        assert_eq!(parse_count("0 km"), Some(0));
        assert_eq!(parse_count("문의"), None);
    }
}
