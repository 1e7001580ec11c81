/// Significant digits used by `%g` when no precision is given.
const PRECISION: i32 = 6;

/// Format a number the way C's `%g` does with the default precision.
///
/// Six significant digits, scientific notation when the exponent is below -4
/// or at least 6, trailing zeros removed.
pub fn format_g(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let scientific = format!("{:.*e}", (PRECISION - 1) as usize, value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => return scientific,
    };

    if exponent < -4 || exponent >= PRECISION {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{}{:02}",
            trim_fraction(mantissa),
            sign,
            exponent.abs()
        )
    } else {
        let decimals = (PRECISION - 1 - exponent) as usize;
        let fixed = format!("{:.*}", decimals, value);
        trim_fraction(&fixed).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_values() {
        assert_eq!(format_g(10.0), "10");
        assert_eq!(format_g(1.5), "1.5");
        assert_eq!(format_g(-10.0), "-10");
        assert_eq!(format_g(0.5), "0.5");
        assert_eq!(format_g(0.0), "0");
        assert_eq!(format_g(1.861936), "1.86194");
        assert_eq!(format_g(123456.0), "123456");
    }

    #[test]
    fn test_small_values() {
        assert_eq!(format_g(0.0001), "0.0001");
        assert_eq!(format_g(0.00001), "1e-05");
        assert_eq!(format_g(0.000012345), "1.2345e-05");
    }

    #[test]
    fn test_large_values() {
        assert_eq!(format_g(1e300), "1e+300");
        assert_eq!(format_g(1234567.0), "1.23457e+06");
        assert_eq!(format_g(999999.5), "1e+06");
    }

    #[test]
    fn test_non_finite() {
        assert_eq!(format_g(f64::NAN), "nan");
        assert_eq!(format_g(f64::INFINITY), "inf");
        assert_eq!(format_g(f64::NEG_INFINITY), "-inf");
    }
}
