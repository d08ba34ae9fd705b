use rust_decimal::{Decimal, RoundingStrategy};

/// Balances within one cent of zero are considered settled.
pub const EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

pub const DEFAULT_CURRENCY_SYMBOL: &str = "₹";

/// Largest single expense amount accepted: 10^12.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

/// Rounds to 2 decimal places, ties away from zero.
pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Formats an amount as `₹1,234.56`. Negative amounts keep the sign in front
/// of the symbol.
pub fn format_currency(amount: Decimal, symbol: &str) -> String {
    let rounded = round_cents(amount);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let text = format!("{:.2}", rounded.abs());
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{sign}{symbol}{grouped}.{cents}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_cents(dec!(2.345)), dec!(2.35));
        assert_eq!(round_cents(dec!(2.344)), dec!(2.34));
        assert_eq!(round_cents(dec!(-2.345)), dec!(-2.35));
        assert_eq!(round_cents(dec!(0.005)), dec!(0.01));
    }

    #[test]
    fn epsilon_is_one_cent() {
        assert_eq!(EPSILON, dec!(0.01));
    }

    #[test]
    fn max_amount_is_one_trillion() {
        assert_eq!(MAX_AMOUNT, Decimal::from(1_000_000_000_000u64));
    }

    #[test]
    fn formats_with_thousands_separators() {
        assert_eq!(format_currency(dec!(1234.5), "₹"), "₹1,234.50");
        assert_eq!(format_currency(dec!(1234567.891), "$"), "$1,234,567.89");
        assert_eq!(format_currency(dec!(12), "₹"), "₹12.00");
        assert_eq!(format_currency(dec!(0), "₹"), "₹0.00");
        assert_eq!(format_currency(dec!(-950.2), "€"), "-€950.20");
    }
}
