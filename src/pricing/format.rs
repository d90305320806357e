//! Display formatting and text-input parsing helpers
//!
//! Category fee labels arrive as free text ("2.5%", "2,5%"). Parsing never
//! fails: a label without a number yields 0, which callers should read as
//! "no category selected".

/// Currency suffix, separated by a no-break space as in vi-VN formatting
const CURRENCY_SUFFIX: &str = "\u{a0}₫";

/// Format an amount as whole currency units with `.` thousands separators,
/// e.g. `150364.96` -> `"150.365 ₫"`
pub fn format_currency(amount: f64) -> String {
    if !amount.is_finite() {
        return format!("{}{}", amount, CURRENCY_SUFFIX);
    }

    let rounded = amount.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{}{}{}", sign, grouped, CURRENCY_SUFFIX)
}

/// Two-decimal percentage, e.g. `20.0` -> `"20.00 %"`
pub fn format_percentage(value: f64) -> String {
    format!("{:.2} %", value)
}

/// Extract the first decimal number from a fee label. A comma decimal
/// separator is treated as a period. Returns 0 when no number is present.
pub fn parse_fee_label(label: &str) -> f64 {
    let normalized = label.replace(',', ".");
    let bytes = normalized.as_bytes();

    let Some(start) = bytes.iter().position(|b| b.is_ascii_digit()) else {
        return 0.0;
    };

    let mut end = start;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    // Fraction only counts when at least one digit follows the separator
    if end + 1 < bytes.len() && bytes[end] == b'.' && bytes[end + 1].is_ascii_digit() {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }

    normalized[start..end].parse::<f64>().unwrap_or(0.0)
}

/// Leading-number parse of user text after dropping everything except
/// digits, `.` and `-`. `None` when no number can be read.
pub fn parse_numeric_input(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    let bytes = cleaned.as_bytes();

    let mut end = 0;
    if bytes.first() == Some(&b'-') {
        end = 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut has_digits = end > int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > frac_start {
            has_digits = true;
            end = frac_end;
        }
    }

    if !has_digits {
        return None;
    }
    cleaned[..end].parse::<f64>().ok()
}

/// Accepts text holding a non-negative amount
pub fn validate_currency_input(text: &str) -> bool {
    matches!(parse_numeric_input(text), Some(v) if v >= 0.0)
}

/// Accepts text holding a percentage in [0, 100]
pub fn validate_percentage_input(text: &str) -> bool {
    matches!(parse_numeric_input(text), Some(v) if (0.0..=100.0).contains(&v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_groups_thousands() {
        assert_eq!(format_currency(150_364.96), "150.365\u{a0}₫");
        assert_eq!(format_currency(1_000.0), "1.000\u{a0}₫");
        assert_eq!(format_currency(999.4), "999\u{a0}₫");
        assert_eq!(format_currency(0.0), "0\u{a0}₫");
        assert_eq!(format_currency(12_345_678.0), "12.345.678\u{a0}₫");
    }

    #[test]
    fn currency_negative_amounts() {
        assert_eq!(format_currency(-2_500.0), "-2.500\u{a0}₫");
        // rounds to zero, no sign
        assert_eq!(format_currency(-0.2), "0\u{a0}₫");
    }

    #[test]
    fn percentage_has_two_decimals() {
        assert_eq!(format_percentage(20.0), "20.00 %");
        assert_eq!(format_percentage(2.594), "2.59 %");
        assert!(format_percentage(1.0).ends_with('%'));
    }

    #[test]
    fn fee_label_parsing() {
        assert_eq!(parse_fee_label("2.5%"), 2.5);
        assert_eq!(parse_fee_label("2,5%"), 2.5);
        assert_eq!(parse_fee_label("no fee"), 0.0);
        assert_eq!(parse_fee_label(""), 0.0);
        assert_eq!(parse_fee_label("Phí 10%"), 10.0);
        assert_eq!(parse_fee_label("4.91% (max 50k)"), 4.91);
        assert_eq!(parse_fee_label("7.%"), 7.0);
    }

    #[test]
    fn numeric_input_reads_leading_number() {
        assert_eq!(parse_numeric_input("100,000"), Some(100_000.0));
        assert_eq!(parse_numeric_input("12.5 %"), Some(12.5));
        assert_eq!(parse_numeric_input("-.5"), Some(-0.5));
        assert_eq!(parse_numeric_input("1-2"), Some(1.0));
        assert_eq!(parse_numeric_input("abc"), None);
        assert_eq!(parse_numeric_input("-"), None);
        assert_eq!(parse_numeric_input("."), None);
    }

    #[test]
    fn currency_input_validation() {
        assert!(validate_currency_input("150000"));
        assert!(validate_currency_input("0"));
        assert!(!validate_currency_input("-1"));
        assert!(!validate_currency_input("free"));
    }

    #[test]
    fn percentage_input_validation() {
        assert!(validate_percentage_input("0"));
        assert!(validate_percentage_input("100"));
        assert!(validate_percentage_input("2.59%"));
        assert!(!validate_percentage_input("100.01"));
        assert!(!validate_percentage_input("-3"));
        assert!(!validate_percentage_input(""));
    }
}
