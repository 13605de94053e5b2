//! Operator input parsing and peso formatting

use bigdecimal::BigDecimal;
use std::str::FromStr;

/// Parse a declared amount typed into a money field.
///
/// Everything but ASCII digits is dropped, so `"$ 1.234.567"` reads as
/// 1234567. Empty input reads as zero. Pesos have no decimals, so the
/// thousands separator is never ambiguous.
pub fn parse_amount_input(input: &str) -> BigDecimal {
    let digits: String = input.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return BigDecimal::from(0);
    }
    BigDecimal::from_str(&digits).unwrap_or_else(|_| BigDecimal::from(0))
}

/// Parse a denomination quantity typed by the operator.
///
/// Reads an optional sign and the leading run of digits; anything that is
/// not a number reads as zero. Negative results are returned as-is and
/// dropped by [`crate::DenominationCounts::record`].
pub fn parse_quantity_input(input: &str) -> i64 {
    let trimmed = input.trim_start();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return 0;
    }

    let magnitude = digits.parse::<i64>().unwrap_or(i64::MAX);
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

/// Group an unsigned digit string with `.` every three digits
fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    grouped
}

/// Format an amount as Colombian pesos, e.g. `$ 1.234.567` or `-$ 1.000`.
///
/// Rounds to whole pesos.
pub fn format_cop(amount: &BigDecimal) -> String {
    let rounded = amount.round(0).with_scale(0);
    let text = rounded.to_string();
    let (sign, digits) = match text.strip_prefix('-') {
        Some(digits) => ("-", digits),
        None => ("", text.as_str()),
    };

    if digits.chars().all(|c| c == '0') {
        return "$ 0".to_string();
    }

    format!("{sign}$ {}", group_thousands(digits))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_input() {
        assert_eq!(parse_amount_input("$ 1.234.567"), BigDecimal::from(1234567));
        assert_eq!(parse_amount_input("50000"), BigDecimal::from(50000));
        assert_eq!(parse_amount_input("$ "), BigDecimal::from(0));
        assert_eq!(parse_amount_input(""), BigDecimal::from(0));
    }

    #[test]
    fn test_parse_quantity_input() {
        assert_eq!(parse_quantity_input("12"), 12);
        assert_eq!(parse_quantity_input("  7 "), 7);
        assert_eq!(parse_quantity_input("3abc"), 3);
        assert_eq!(parse_quantity_input("abc"), 0);
        assert_eq!(parse_quantity_input(""), 0);
        assert_eq!(parse_quantity_input("-4"), -4);
        assert_eq!(parse_quantity_input("+2"), 2);
    }

    #[test]
    fn test_format_cop() {
        assert_eq!(format_cop(&BigDecimal::from(1234567)), "$ 1.234.567");
        assert_eq!(format_cop(&BigDecimal::from(500)), "$ 500");
        assert_eq!(format_cop(&BigDecimal::from(100000)), "$ 100.000");
        assert_eq!(format_cop(&BigDecimal::from(-1000)), "-$ 1.000");
        assert_eq!(format_cop(&BigDecimal::from(0)), "$ 0");
    }

    #[test]
    fn test_format_cop_rounds_to_whole_pesos() {
        let amount = BigDecimal::from_str("2999.7").unwrap();
        assert_eq!(format_cop(&amount), "$ 3.000");
    }
}
