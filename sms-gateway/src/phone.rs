//! Phone number normalization (§6).
//!
//! Strips everything but digits and a leading `+`, then rewrites a handful of
//! common local dialing conventions into the `+98…` international form.

/// Normalize `raw` into an E.164-ish string.
///
/// Rules, applied in order once non-digit/non-`+` characters are stripped:
/// - `00XXX` -> `+XXX`
/// - 11 digits starting with `0` -> `+98` + remaining 10 digits
/// - 10 digits starting with `9` -> `+98` + those 10 digits
/// - starts with `98` -> `+98…`
/// - otherwise returned as-is (still stripped).
pub fn normalize(raw: &str) -> String {
    let stripped: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();

    if let Some(rest) = stripped.strip_prefix("00") {
        return format!("+{rest}");
    }
    if stripped.starts_with('0') && stripped.chars().count() == 11 {
        return format!("+98{}", &stripped[1..]);
    }
    if stripped.starts_with('9') && stripped.chars().count() == 10 {
        return format!("+98{stripped}");
    }
    if stripped.starts_with("98") {
        return format!("+{stripped}");
    }
    stripped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_punctuation() {
        assert_eq!(normalize(" (98) 912-345-6789 "), "+989123456789");
    }

    #[test]
    fn zero_zero_prefix_becomes_plus() {
        assert_eq!(normalize("0098912345678"), "+98912345678");
    }

    #[test]
    fn leading_zero_eleven_digits_becomes_98() {
        assert_eq!(normalize("09123456789"), "+989123456789");
    }

    #[test]
    fn leading_nine_ten_digits_becomes_98() {
        assert_eq!(normalize("9123456789"), "+989123456789");
    }

    #[test]
    fn bare_98_prefix_gets_plus() {
        assert_eq!(normalize("989123456789"), "+989123456789");
    }

    #[test]
    fn already_international_passes_through() {
        assert_eq!(normalize("+989123456789"), "+989123456789");
    }

    #[test]
    fn empty_input_normalizes_to_empty() {
        assert_eq!(normalize("   "), "");
    }
}
