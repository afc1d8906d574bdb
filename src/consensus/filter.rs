//! Token validation and normalization
//!
//! Decides which raw OCR strings are trustworthy enough to enter history and
//! which tokens may take part in a numeric vote.

/// Captions that open a scrollbar's token list
pub const START_UNITS: [&str; 3] = ["v", "p", "t"];

/// Captions that close a scrollbar's token list
pub const END_UNITS: [&str; 4] = ["cm", "bar", "m/s", "s"];

/// Comparison form of an observation: trimmed and lowercased
pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Whether the string carries a decimal separator
pub fn has_decimal_separator(raw: &str) -> bool {
    raw.contains(',') || raw.contains('.')
}

/// Whether the string reads as a boolean
pub fn is_boolean_like(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.eq_ignore_ascii_case("true") || trimmed.eq_ignore_ascii_case("false")
}

/// First unit keyword contained in the lowercase form of `raw`
pub fn detect_unit(raw: &str, units: &[&'static str]) -> Option<&'static str> {
    let lower = raw.to_lowercase();
    units.iter().copied().find(|unit| lower.contains(unit))
}

/// Whether the string reads as a scrollbar start or end caption
pub fn is_unit_caption(raw: &str) -> bool {
    detect_unit(raw, &START_UNITS).is_some() || detect_unit(raw, &END_UNITS).is_some()
}

/// Numeric token check: optional sign, digits, at most one `.`/`,` followed
/// by digits. Whitespace is ignored and letters are never allowed.
pub fn is_numeric_token(token: &str) -> bool {
    let compact: String = token.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() || compact.chars().any(|c| c.is_alphabetic()) {
        return false;
    }

    let unsigned = compact
        .strip_prefix('+')
        .or_else(|| compact.strip_prefix('-'))
        .unwrap_or(&compact);

    let mut parts = unsigned.splitn(2, |c: char| c == '.' || c == ',');
    let int_part = parts.next().unwrap_or_default();
    let all_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());

    match parts.next() {
        Some(frac_part) => all_digits(int_part) && all_digits(frac_part),
        None => all_digits(int_part),
    }
}

/// Admission rule applied before an observation is retained
#[derive(Debug, Clone, Copy)]
pub struct AdmissionFilter {
    comma_required: bool,
}

impl AdmissionFilter {
    /// Filter that requires a decimal separator when `comma_required` is set
    pub fn new(comma_required: bool) -> Self {
        Self { comma_required }
    }

    /// Whether the raw string may enter history. Unit captions pass only
    /// when `captions_allowed` is set, i.e. for scrollbar boxes and legacy
    /// readings that carry no kind.
    pub fn admits(&self, raw: &str, captions_allowed: bool) -> bool {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return false;
        }
        if !self.comma_required || is_boolean_like(trimmed) {
            return true;
        }
        has_decimal_separator(trimmed) || (captions_allowed && is_unit_caption(trimmed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_token() {
        assert!(is_numeric_token("12,3"));
        assert!(is_numeric_token("12.3"));
        assert!(is_numeric_token("-0,5"));
        assert!(is_numeric_token("123"));
        assert!(is_numeric_token(" 1 2,3 "));
        assert!(!is_numeric_token(""));
        assert!(!is_numeric_token("12,3a"));
        assert!(!is_numeric_token("1,2,3"));
        assert!(!is_numeric_token(",5"));
        assert!(!is_numeric_token("5,"));
        assert!(!is_numeric_token("bar"));
    }

    #[test]
    fn test_admission_requires_separator() {
        let filter = AdmissionFilter::new(true);
        assert!(!filter.admits("123", true));
        assert!(filter.admits("12,3", false));
        assert!(filter.admits("12.3", true));
        assert!(!filter.admits("   ", true));
    }

    #[test]
    fn test_admission_booleans_and_units() {
        let filter = AdmissionFilter::new(true);
        assert!(filter.admits("true", false));
        assert!(filter.admits("FALSE", false));
        assert!(filter.admits("V", true));
        assert!(filter.admits("bar", true));
        assert!(filter.admits("m/s", true));
        assert!(!filter.admits("42", true));
    }

    #[test]
    fn test_unit_captions_need_caption_context() {
        let filter = AdmissionFilter::new(true);
        assert!(!filter.admits("Stop", false));
        assert!(!filter.admits("85 bar", false));
        assert!(!filter.admits("V", false));
        assert!(filter.admits("85 bar", true));
    }

    #[test]
    fn test_admission_without_separator_requirement() {
        let filter = AdmissionFilter::new(false);
        assert!(filter.admits("123", false));
        assert!(filter.admits("abc", false));
        assert!(!filter.admits("", true));
    }

    #[test]
    fn test_detect_unit_order() {
        assert_eq!(detect_unit("CM", &END_UNITS), Some("cm"));
        assert_eq!(detect_unit("m/s", &END_UNITS), Some("m/s"));
        assert_eq!(detect_unit("Bar", &END_UNITS), Some("bar"));
        assert_eq!(detect_unit("12,3", &END_UNITS), None);
        assert_eq!(detect_unit("P", &START_UNITS), Some("p"));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  TRUE "), "true");
        assert_eq!(normalize("12,3"), "12,3");
    }
}
