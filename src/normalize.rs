//! Pure value repair for business-identifier codes.

use std::sync::OnceLock;

use regex::Regex;

fn scientific_notation() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)e\+?\d+").expect("valid pattern"))
}

/// Repairs identifier codes that spreadsheet round-trips corrupted into
/// scientific notation.
///
/// Empty input stays empty (the caller decides on fallback synthesis).
/// The value is trimmed and one decimal comma becomes a decimal point;
/// if the result carries an exponent marker it is parsed and reformatted
/// with zero decimals. Anything else, including an exponent-looking value
/// that fails the float parse, passes through unchanged. Thousands
/// separators and currency notation are out of scope.
pub fn normalize_identifier_code(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let normalized = trimmed.replacen(',', ".", 1);
    if scientific_notation().is_match(&normalized) {
        if let Ok(value) = normalized.parse::<f64>() {
            return format!("{value:.0}");
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repairs_scientific_notation() {
        assert_eq!(normalize_identifier_code("1.23456789E+11"), "123456789000");
        assert_eq!(normalize_identifier_code("8.7052E+11"), "870520000000");
    }

    #[test]
    fn decimal_comma_is_locale_noise() {
        assert_eq!(normalize_identifier_code("1,23456789e+11"), "123456789000");
    }

    #[test]
    fn plain_codes_pass_through_trimmed() {
        assert_eq!(
            normalize_identifier_code("  870524301210  "),
            "870524301210"
        );
        assert_eq!(normalize_identifier_code(""), "");
        assert_eq!(normalize_identifier_code("   "), "");
    }

    #[test]
    fn unparseable_exponent_text_is_left_alone() {
        assert_eq!(normalize_identifier_code("ref e+12 pending"), "ref e+12 pending");
    }

    #[test]
    fn negative_exponents_are_not_repaired() {
        assert_eq!(normalize_identifier_code("1.2e-5"), "1.2e-5");
    }
}
