#![forbid(unsafe_code)]

//! Helpers exported to page scripts.

/// Insert `,` between groups of three digits in the integer part.
///
/// Anything after the first non-digit (a decimal point, an exponent) is left
/// as-is, as is a leading sign.
#[must_use]
pub fn format_number(raw: &str) -> String {
    let (sign, rest) = match raw.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", raw),
    };
    let split = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let (int, tail) = rest.split_at(split);

    let mut out = String::with_capacity(raw.len() + int.len() / 3);
    out.push_str(sign);
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out.push_str(tail);
    out
}

/// Return on investment in percent, to one decimal place.
///
/// `None` when the investment is zero or either input is not finite.
#[must_use]
pub fn calculate_roi(investment: f64, returns: f64) -> Option<String> {
    if !investment.is_finite() || !returns.is_finite() || investment == 0.0 {
        return None;
    }
    let roi = (returns - investment) / investment * 100.0;
    Some(format!("{roi:.1}"))
}

/// Document-relative scroll target for an element whose viewport-relative top
/// is `rect_top`.
#[must_use]
pub fn scroll_target(rect_top: f64, scroll_top: f64, offset: f64) -> f64 {
    rect_top + scroll_top + offset
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn groups_thousands() {
        assert_eq!(format_number("0"), "0");
        assert_eq!(format_number("999"), "999");
        assert_eq!(format_number("1000"), "1,000");
        assert_eq!(format_number("1234567"), "1,234,567");
        assert_eq!(format_number("-45000"), "-45,000");
    }

    #[test]
    fn fraction_is_untouched() {
        assert_eq!(format_number("1234.5678"), "1,234.5678");
        assert_eq!(format_number(""), "");
    }

    #[test]
    fn roi_to_one_decimal() {
        assert_eq!(calculate_roi(1000.0, 1250.0).as_deref(), Some("25.0"));
        assert_eq!(calculate_roi(300.0, 200.0).as_deref(), Some("-33.3"));
        assert_eq!(calculate_roi(0.0, 10.0), None);
        assert_eq!(calculate_roi(f64::NAN, 10.0), None);
    }

    #[test]
    fn scroll_target_adds_offsets() {
        assert_eq!(scroll_target(120.0, 800.0, -80.0), 840.0);
    }
}
