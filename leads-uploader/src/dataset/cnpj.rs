//! CNPJ normalization.

use leads_indexer_shared::CNPJ_WIDTH;

/// Left-pad a CNPJ with zeros to 14 characters.
///
/// Behaves like a zero fill: a leading sign stays in front of the padding, and values
/// that are already 14 characters or longer are returned unchanged. Surrounding
/// whitespace is dropped.
///
/// # Example
///
/// ```
/// use leads_uploader::dataset::format_cnpj;
///
/// assert_eq!(format_cnpj("191"), "00000000000191");
/// assert_eq!(format_cnpj("12345678000195"), "12345678000195");
/// ```
pub fn format_cnpj(raw: &str) -> String {
    let raw = raw.trim();
    let len = raw.chars().count();
    if len >= CNPJ_WIDTH {
        return raw.to_string();
    }

    let padding = "0".repeat(CNPJ_WIDTH - len);
    match raw.chars().next() {
        Some(sign @ ('+' | '-')) => format!("{}{}{}", sign, padding, &raw[1..]),
        _ => format!("{}{}", padding, raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pads_short_values() {
        assert_eq!(format_cnpj("111"), "00000000000111");
        assert_eq!(format_cnpj(" 222 "), "00000000000222");
        assert_eq!(format_cnpj(""), "00000000000000");
    }

    #[test]
    fn test_keeps_full_and_long_values() {
        assert_eq!(format_cnpj("12345678000195"), "12345678000195");
        assert_eq!(format_cnpj("12.345.678/0001-95"), "12.345.678/0001-95");
    }

    #[test]
    fn test_sign_stays_in_front() {
        assert_eq!(format_cnpj("-42"), "-0000000000042");
    }
}
