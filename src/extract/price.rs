//! Price and number normalization
//!
//! The site renders prices in German conventions: `€ 1.234,56` uses dots
//! for grouping and a comma as the decimal separator. Normalization never
//! fails; text that does not contain a parseable number yields None.

/// Parses a price string into a number
///
/// Everything except digits, commas and dots is stripped. When a comma is
/// present it is taken as the decimal separator and any dots are grouping
/// separators; otherwise the remainder is parsed as-is.
///
/// # Examples
///
/// ```
/// use pfennigfuchs::extract::parse_price;
///
/// assert_eq!(parse_price("€ 1.234,56"), Some(1234.56));
/// assert_eq!(parse_price("549,90 €"), Some(549.9));
/// assert_eq!(parse_price("kein Preis"), None);
/// ```
pub fn parse_price(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    let normalized = if cleaned.contains(',') {
        // Comma decimal: dots are grouping separators
        cleaned.replace('.', "").replace(',', ".")
    } else {
        cleaned
    };

    normalized.parse::<f64>().ok()
}

/// Parses a decimal from the start of a string, accepting a comma separator
///
/// Used for rating values, which may carry trailing text (`"4,5 von 5"`).
pub fn parse_decimal(text: &str) -> Option<f64> {
    let prefix: String = text
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();

    if prefix.is_empty() {
        return None;
    }

    prefix.replace(',', ".").parse::<f64>().ok()
}

/// Parses a count by keeping only the digits
///
/// Used for review counts rendered as `"1.234 Bewertungen"`.
pub fn parse_count(text: &str) -> Option<u64> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.is_empty() {
        return None;
    }

    digits.parse::<u64>().ok()
}
