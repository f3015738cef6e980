use rust_decimal::{Decimal, RoundingStrategy};

/// Formats an amount as US dollars, e.g. `$1,234.50`.
pub fn format_currency(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };

    let digits = format!("{:.2}", rounded.abs());
    let (whole, cents) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{sign}${grouped}.{cents}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_whole_amount() {
        assert_eq!(format_currency(Decimal::new(80, 0)), "$80.00");
    }

    #[test]
    fn test_format_zero() {
        assert_eq!(format_currency(Decimal::ZERO), "$0.00");
    }

    #[test]
    fn test_format_groups_thousands() {
        assert_eq!(format_currency(Decimal::new(123456750, 2)), "$1,234,567.50");
        assert_eq!(format_currency(Decimal::new(1000, 0)), "$1,000.00");
        assert_eq!(format_currency(Decimal::new(999, 0)), "$999.00");
    }

    #[test]
    fn test_format_rounds_to_cents() {
        assert_eq!(format_currency(Decimal::new(10005, 3)), "$10.01");
        assert_eq!(format_currency(Decimal::new(10004, 3)), "$10.00");
    }

    #[test]
    fn test_format_negative() {
        assert_eq!(format_currency(Decimal::new(-150, 2)), "-$1.50");
    }
}
