//! Small text utilities shared by the scanner, the joins and the exporters.

/// Returns true if the value is empty or whitespace only.
#[inline]
pub(crate) fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Converts a raw cell value into a dataset value: blanks become null.
pub(crate) fn to_value(raw: &str) -> Option<String> {
    if is_blank(raw) {
        None
    } else {
        Some(raw.to_owned())
    }
}

/// Normalises a join key according to the lookup options.
pub(crate) fn normalize_key(key: &str, case_sensitive: bool, strip_spaces: bool) -> String {
    let key = if strip_spaces { key.trim() } else { key };
    if case_sensitive {
        key.to_owned()
    } else {
        key.to_lowercase()
    }
}

/// Case-insensitive substring test.
pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Renders a float the way spreadsheet users expect: integral values have no
/// fractional part, everything else uses the shortest round-trip form.
pub(crate) fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Parses loosely formatted numbers: any whitespace (including non-breaking
/// spaces used as thousands separators) is dropped and a decimal comma is accepted.
pub(crate) fn parse_number(value: &str) -> Option<f64> {
    let compact: String = value
        .chars()
        .filter(|character| !character.is_whitespace())
        .map(|character| if character == ',' { '.' } else { character })
        .collect();
    if compact.is_empty() {
        None
    } else {
        compact.parse::<f64>().ok().filter(|number| number.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values() {
        assert!(is_blank(""));
        assert!(is_blank(" \t"));
        assert!(!is_blank(" x "));
        assert_eq!(to_value("  "), None);
        assert_eq!(to_value("A"), Some("A".to_owned()));
    }

    #[test]
    fn normalize_keys() {
        assert_eq!(normalize_key("  AbC ", false, true), "abc");
        assert_eq!(normalize_key("  AbC ", true, true), "AbC");
        assert_eq!(normalize_key(" Ab ", false, false), " ab ");
    }

    #[test]
    fn contains_cyrillic_ignore_case() {
        assert!(contains_ignore_case("Продавец: ООО Ромашка", "продавец:"));
        assert!(contains_ignore_case("ТОТ ЖЕ", "тот"));
        assert!(!contains_ignore_case("ИНН/КПП продавца", "продавец"));
    }

    #[test]
    fn format_numbers() {
        assert_eq!(format_number(1.0), "1");
        assert_eq!(format_number(-42.0), "-42");
        assert_eq!(format_number(12.5), "12.5");
        assert_eq!(format_number(0.1), "0.1");
    }

    #[test]
    fn parse_numbers() {
        assert_eq!(parse_number("1 234,50"), Some(1234.5));
        assert_eq!(parse_number("1\u{a0}000"), Some(1000.0));
        assert_eq!(parse_number(" 7 "), Some(7.0));
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number(""), None);
    }
}
