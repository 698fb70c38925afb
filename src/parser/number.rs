//! Number parsing (§4.4 "Number parsing").
//!
//! `<sign>? digits ('.' digits?)? | <sign>? '.' digits (exponent)? ('(' su-digits ')')?`
//! with at least one digit on either side of the decimal point, and an su
//! suffix that must be the final token content.

use crate::model::Number;

/// Try to read `text` as a complete CIF number.
///
/// Returns `None` if `text` doesn't even look like a numeric attempt (first
/// significant character is neither a sign, digit, nor `.`) — that case is
/// not an error, just a character value. Returns `Some(Err(()))` if the
/// text commits to looking numeric but is malformed (the `InvalidNumber`
/// case in §4.4, §4.4 error taxonomy).
pub fn try_parse(text: &str) -> Option<Result<Number, ()>> {
    let bytes = text.as_bytes();
    if bytes.is_empty() {
        return None;
    }
    let looks_numeric = {
        let mut i = 0;
        if matches!(bytes[i], b'+' | b'-') {
            i += 1;
        }
        bytes.get(i).map(|b| b.is_ascii_digit() || *b == b'.').unwrap_or(false)
    };
    if !looks_numeric {
        return None;
    }
    Some(parse_number(text).ok_or(()))
}

fn parse_number(text: &str) -> Option<Number> {
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    let n = chars.len();

    let sign = if i < n && (chars[i] == '+' || chars[i] == '-') {
        let s = chars[i];
        i += 1;
        s
    } else {
        '+'
    };

    let int_start = i;
    while i < n && chars[i].is_ascii_digit() {
        i += 1;
    }
    let int_digits: String = chars[int_start..i].iter().collect();

    let mut frac_digits = String::new();
    if i < n && chars[i] == '.' {
        i += 1;
        let frac_start = i;
        while i < n && chars[i].is_ascii_digit() {
            i += 1;
        }
        frac_digits = chars[frac_start..i].iter().collect();
    }

    if int_digits.is_empty() && frac_digits.is_empty() {
        return None; // digits required on at least one side of the point
    }

    let mut exponent = 0i32;
    if i < n && (chars[i] == 'e' || chars[i] == 'E') {
        let save = i;
        i += 1;
        let exp_sign = if i < n && (chars[i] == '+' || chars[i] == '-') {
            let s = chars[i];
            i += 1;
            s
        } else {
            '+'
        };
        let exp_start = i;
        while i < n && chars[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            // 'e'/'E' with no following digits: not a valid exponent,
            // backtrack — the whole token is then malformed unless this
            // was trailing garbage, which the caller rejects via the
            // "fully consumed" check below.
            i = save;
        } else {
            let digits: String = chars[exp_start..i].iter().collect();
            let mag: i32 = digits.parse().ok()?;
            exponent = if exp_sign == '-' { -mag } else { mag };
        }
    }

    let mut su: Option<String> = None;
    if i < n && chars[i] == '(' {
        let su_start = i + 1;
        let mut j = su_start;
        while j < n && chars[j].is_ascii_digit() {
            j += 1;
        }
        if j == su_start || j >= n || chars[j] != ')' || j + 1 != n {
            return None; // su must be digits-only and the final token content
        }
        su = Some(chars[su_start..j].iter().collect());
        i = j + 1;
    }

    if i != n {
        return None; // trailing garbage: not a fully-matched number
    }

    let scale = frac_digits.len() as u32;
    let mut mantissa = String::new();
    if sign == '-' {
        mantissa.push('-');
    }
    if int_digits.is_empty() {
        mantissa.push('0');
    } else {
        mantissa.push_str(&int_digits);
    }
    mantissa.push_str(&frac_digits);

    Some(Number::from_parts(mantissa, scale, exponent, su, text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(text: &str) -> Number {
        try_parse(text).unwrap().unwrap()
    }

    #[test]
    fn plain_integer() {
        let n = ok("42");
        assert_eq!(n.to_f64(), 42.0);
        assert_eq!(n.text(), "42");
    }

    #[test]
    fn signed_decimal() {
        let n = ok("-1.5");
        assert!((n.to_f64() + 1.5).abs() < 1e-12);
    }

    #[test]
    fn exponent_form() {
        let n = ok("-1.5e-3");
        assert!((n.to_f64() + 0.0015).abs() < 1e-12);
    }

    #[test]
    fn with_standard_uncertainty() {
        let n = ok("7.470(6)");
        assert!((n.to_f64() - 7.470).abs() < 1e-9);
        assert!((n.su_f64().unwrap() - 0.006).abs() < 1e-9);
        assert_eq!(n.text(), "7.470(6)");
    }

    #[test]
    fn leading_dot_requires_trailing_digits() {
        assert!(ok(".5").to_f64() == 0.5);
        assert!(try_parse(".").unwrap().is_err());
    }

    #[test]
    fn non_numeric_text_is_not_a_number_attempt() {
        assert!(try_parse("hello").is_none());
        assert!(try_parse("N/A").is_none());
    }

    #[test]
    fn malformed_exponent_is_invalid_number() {
        assert!(try_parse("1.2e").unwrap().is_err());
    }

    #[test]
    fn su_with_fractional_part_is_invalid() {
        assert!(try_parse("1.2(3.4)").unwrap().is_err());
    }

    #[test]
    fn su_must_be_final_content() {
        assert!(try_parse("1.2(3)x").unwrap().is_err());
    }

    #[test]
    fn double_decimal_point_is_invalid() {
        assert!(try_parse("1.2.3").unwrap().is_err());
    }
}
