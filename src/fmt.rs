/// Format an amount as pesos with thousands separators: ₱1,234.56.
///
/// Total over all inputs: amounts are rounded to centavos first and grouped
/// from the integer digits, and non-finite values fall through to plain
/// debug-style text rather than panicking. The loader never emits
/// non-finite amounts, but evidence and summary text must not be able to
/// crash the bot on one either.
pub fn peso(val: f64) -> String {
    if !val.is_finite() {
        return format!("\u{20b1}{val}");
    }
    let centavos = (val.abs() * 100.0).round() as u64;
    let whole = (centavos / 100).to_string();
    let frac = centavos % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if val < 0.0 { "-" } else { "" };
    format!("{sign}\u{20b1}{grouped}.{frac:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peso_groups_thousands() {
        assert_eq!(peso(0.0), "₱0.00");
        assert_eq!(peso(42.1), "₱42.10");
        assert_eq!(peso(999.99), "₱999.99");
        assert_eq!(peso(1234.56), "₱1,234.56");
        assert_eq!(peso(1000000.99), "₱1,000,000.99");
    }

    #[test]
    fn test_peso_rounds_to_centavos() {
        assert_eq!(peso(123.456), "₱123.46");
        assert_eq!(peso(0.999), "₱1.00");
        assert_eq!(peso(0.004), "₱0.00");
    }

    #[test]
    fn test_peso_negative() {
        assert_eq!(peso(-500.0), "-₱500.00");
        assert_eq!(peso(-1234.5), "-₱1,234.50");
    }

    #[test]
    fn test_peso_total_over_non_finite() {
        assert_eq!(peso(f64::INFINITY), "₱inf");
        assert_eq!(peso(f64::NEG_INFINITY), "₱-inf");
        assert_eq!(peso(f64::NAN), "₱NaN");
    }
}
