//! Number to string conversions and string to number parsing with
//! ECMAScript semantics.

/// `WhiteSpace` and `LineTerminator` code points.
pub fn is_js_whitespace(c: char) -> bool {
    matches!(
        c,
        '\t' | '\u{b}'
            | '\u{c}'
            | ' '
            | '\u{a0}'
            | '\u{feff}'
            | '\n'
            | '\r'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200a}'
            | '\u{202f}'
            | '\u{205f}'
            | '\u{3000}'
    )
}

/// Significant decimal digits of `x.abs()` and the exponent `n` such that
/// the value is `0.d1d2d3… × 10^n`. Zero yields `("0", 1)`.
fn shortest_digits(x: f64) -> (Vec<u8>, i32) {
    decompose(&format!("{:e}", x.abs()))
}

/// Like [`shortest_digits`] but with the exact decimal expansion.
fn exact_digits(x: f64) -> (Vec<u8>, i32) {
    decompose(&format!("{:.800e}", x.abs()))
}

fn decompose(formatted: &str) -> (Vec<u8>, i32) {
    let (mantissa, exponent) = formatted.split_once('e').unwrap_or((formatted, "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let mut digits: Vec<u8> = mantissa.bytes().filter(u8::is_ascii_digit).collect();
    while digits.len() > 1 && digits.last() == Some(&b'0') {
        digits.pop();
    }
    if digits.iter().all(|&d| d == b'0') {
        return (vec![b'0'], 1);
    }
    (digits, exponent + 1)
}

/// Keeps `keep` leading digits, rounding half up. When rounding carries
/// into a new leading digit the result is one digit longer and the flag
/// is set.
fn round_half_up(digits: &[u8], keep: usize) -> (Vec<u8>, bool) {
    let mut kept: Vec<u8> = (0..keep)
        .map(|i| digits.get(i).copied().unwrap_or(b'0'))
        .collect();
    let round_up = digits.get(keep).is_some_and(|&d| d >= b'5');
    if !round_up {
        return (kept, false);
    }
    for digit in kept.iter_mut().rev() {
        if *digit == b'9' {
            *digit = b'0';
        } else {
            *digit += 1;
            return (kept, false);
        }
    }
    kept.insert(0, b'1');
    (kept, true)
}

fn text(digits: &[u8]) -> &str {
    std::str::from_utf8(digits).unwrap_or("")
}

fn exponent_suffix(e: i32) -> String {
    if e < 0 {
        format!("e-{}", -e)
    } else {
        format!("e+{e}")
    }
}

/// `Number::toString(x)` in radix 10.
pub fn number_to_string(x: f64) -> String {
    if x.is_nan() {
        return "NaN".to_string();
    }
    if x == 0.0 {
        return "0".to_string();
    }
    if x.is_infinite() {
        return if x < 0.0 { "-Infinity" } else { "Infinity" }.to_string();
    }

    let sign = if x < 0.0 { "-" } else { "" };
    let (digits, n) = shortest_digits(x);
    let k = digits.len() as i32;
    let s = text(&digits);

    let body = if k <= n && n <= 21 {
        format!("{s}{}", "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        format!("{}.{}", &s[..n as usize], &s[n as usize..])
    } else if -6 < n && n <= 0 {
        format!("0.{}{s}", "0".repeat((-n) as usize))
    } else if k == 1 {
        format!("{s}{}", exponent_suffix(n - 1))
    } else {
        format!("{}.{}{}", &s[..1], &s[1..], exponent_suffix(n - 1))
    };
    format!("{sign}{body}")
}

/// `Number.prototype.toString(radix)`. Only integral values are supported
/// outside radix 10.
pub fn number_to_radix_string(x: f64, radix: u32) -> Option<String> {
    if radix == 10 || !x.is_finite() {
        return Some(number_to_string(x));
    }
    if x.fract() != 0.0 || x.abs() >= 9_007_199_254_740_992.0 {
        return None;
    }
    Some(integer_to_radix(x as i128, radix))
}

pub fn integer_to_radix(value: i128, radix: u32) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut magnitude = value.unsigned_abs();
    let mut out = Vec::new();
    while magnitude > 0 {
        let digit = (magnitude % radix as u128) as u32;
        out.push(std::char::from_digit(digit, radix).unwrap_or('0'));
        magnitude /= radix as u128;
    }
    if value < 0 {
        out.push('-');
    }
    out.iter().rev().collect()
}

/// `Number.prototype.toFixed`. `fraction_digits` must be in `0..=100`.
pub fn to_fixed(x: f64, fraction_digits: u32) -> String {
    if x.is_nan() {
        return "NaN".to_string();
    }
    if x.abs() >= 1e21 || x.is_infinite() {
        return number_to_string(x);
    }

    let sign = if x < 0.0 { "-" } else { "" };
    let f = fraction_digits as i32;
    let (digits, n) = exact_digits(x);

    let keep = n + f;
    let integer_digits = if keep < 0 {
        Vec::new()
    } else {
        round_half_up(&digits, keep as usize).0
    };

    let mut m = String::from(text(&integer_digits).trim_start_matches('0'));
    if m.is_empty() {
        m.push('0');
    }
    if f == 0 {
        return format!("{sign}{m}");
    }
    if m.len() as i32 <= f {
        m = format!("{}{m}", "0".repeat((f + 1 - m.len() as i32) as usize));
    }
    let split = m.len() - f as usize;
    format!("{sign}{}.{}", &m[..split], &m[split..])
}

/// `Number.prototype.toExponential`. `None` uses as many digits as needed
/// to represent the value uniquely.
pub fn to_exponential(x: f64, fraction_digits: Option<u32>) -> String {
    if !x.is_finite() {
        return number_to_string(x);
    }
    let sign = if x < 0.0 { "-" } else { "" };

    let (digits, e) = if x == 0.0 {
        let len = fraction_digits.map_or(1, |f| f as usize + 1);
        (vec![b'0'; len], 0)
    } else {
        match fraction_digits {
            None => {
                let (digits, n) = shortest_digits(x);
                (digits, n - 1)
            }
            Some(f) => {
                let (digits, n) = exact_digits(x);
                let (mut kept, carried) = round_half_up(&digits, f as usize + 1);
                if carried {
                    kept.pop();
                }
                (kept, if carried { n } else { n - 1 })
            }
        }
    };

    let s = text(&digits);
    let mantissa = if s.len() == 1 {
        s.to_string()
    } else {
        format!("{}.{}", &s[..1], &s[1..])
    };
    format!("{sign}{mantissa}{}", exponent_suffix(e))
}

/// `Number.prototype.toPrecision`. `precision` must be in `1..=100`.
pub fn to_precision(x: f64, precision: u32) -> String {
    if !x.is_finite() {
        return number_to_string(x);
    }
    let sign = if x < 0.0 { "-" } else { "" };
    let p = precision as i32;

    let (digits, e) = if x == 0.0 {
        (vec![b'0'; precision as usize], 0)
    } else {
        let (digits, n) = exact_digits(x);
        let (mut kept, carried) = round_half_up(&digits, precision as usize);
        if carried {
            kept.pop();
        }
        (kept, if carried { n } else { n - 1 })
    };
    let m = text(&digits);

    let body = if e < -6 || e >= p {
        let mantissa = if p == 1 {
            m.to_string()
        } else {
            format!("{}.{}", &m[..1], &m[1..])
        };
        format!("{mantissa}{}", exponent_suffix(e))
    } else if e == p - 1 {
        m.to_string()
    } else if e >= 0 {
        let split = (e + 1) as usize;
        format!("{}.{}", &m[..split], &m[split..])
    } else {
        format!("0.{}{m}", "0".repeat((-(e + 1)) as usize))
    };
    format!("{sign}{body}")
}

fn is_decimal_literal(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;
    let mut digits = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
        digits += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
            digits += 1;
        }
    }
    if digits == 0 {
        return false;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
            i += 1;
        }
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == start {
            return false;
        }
    }
    i == bytes.len()
}

/// Integer value of `digits` in `radix`; `None` once it no longer fits
/// exactly.
fn radix_integer(digits: &str, radix: u32) -> Option<f64> {
    let mut value: u128 = 0;
    for c in digits.chars() {
        let digit = c.to_digit(radix)?;
        value = value.checked_mul(radix as u128)?.checked_add(digit as u128)?;
    }
    Some(value as f64)
}

/// `StringToNumber`. `None` when the value is a non-decimal integer too
/// large to convert exactly.
pub fn string_to_number(s: &str) -> Option<f64> {
    let trimmed = s.trim_matches(is_js_whitespace);
    if trimmed.is_empty() {
        return Some(0.0);
    }

    let lower_prefix = trimmed.get(..2).map(str::to_ascii_lowercase);
    let radix = match lower_prefix.as_deref() {
        Some("0x") => Some(16),
        Some("0o") => Some(8),
        Some("0b") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        let digits = &trimmed[2..];
        if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
            return Some(f64::NAN);
        }
        return radix_integer(digits, radix);
    }

    let (negative, unsigned) = match trimmed.as_bytes()[0] {
        b'+' => (false, &trimmed[1..]),
        b'-' => (true, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let magnitude = if unsigned == "Infinity" {
        f64::INFINITY
    } else if is_decimal_literal(unsigned) {
        unsigned.parse::<f64>().unwrap_or(f64::NAN)
    } else {
        return Some(f64::NAN);
    };
    Some(if negative { -magnitude } else { magnitude })
}

/// Global `parseFloat`.
pub fn parse_float(s: &str) -> f64 {
    let trimmed = s.trim_start_matches(is_js_whitespace);
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'+') => (false, &trimmed[1..]),
        Some(b'-') => (true, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let apply_sign = |v: f64| if negative { -v } else { v };

    if rest.starts_with("Infinity") {
        return apply_sign(f64::INFINITY);
    }

    let bytes = rest.as_bytes();
    let mut end = 0;
    let mut digits = 0;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        digits += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        let mut j = end + 1;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
            digits += 1;
        }
        end = j;
    }
    if digits == 0 {
        return f64::NAN;
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut j = end + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > start {
            end = j;
        }
    }

    let literal = rest[..end].trim_end_matches('.');
    let literal = if literal.starts_with('.') {
        format!("0{literal}")
    } else {
        literal.to_string()
    };
    apply_sign(literal.parse::<f64>().unwrap_or(f64::NAN))
}

/// Global `parseInt` with an already converted `ToInt32(radix)`. `None`
/// when a power-of-two radix integer is too large to convert exactly.
pub fn parse_int(s: &str, radix: i32) -> Option<f64> {
    let trimmed = s.trim_start_matches(is_js_whitespace);
    let (negative, mut rest) = match trimmed.as_bytes().first() {
        Some(b'+') => (false, &trimmed[1..]),
        Some(b'-') => (true, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let mut strip_prefix = true;
    let mut radix = radix;
    if radix != 0 {
        if !(2..=36).contains(&radix) {
            return Some(f64::NAN);
        }
        if radix != 16 {
            strip_prefix = false;
        }
    } else {
        radix = 10;
    }
    if strip_prefix && (rest.starts_with("0x") || rest.starts_with("0X")) {
        rest = &rest[2..];
        radix = 16;
    }

    let radix = radix as u32;
    let end = rest
        .char_indices()
        .find(|(_, c)| !c.is_digit(radix))
        .map_or(rest.len(), |(i, _)| i);
    let digits = &rest[..end];
    if digits.is_empty() {
        return Some(f64::NAN);
    }

    let magnitude = if radix == 10 {
        digits.parse::<f64>().unwrap_or(f64::NAN)
    } else {
        match radix_integer(digits, radix) {
            Some(value) => value,
            None if radix.is_power_of_two() => return None,
            None => digits.chars().fold(0.0, |acc, c| {
                acc * radix as f64 + c.to_digit(radix).unwrap_or(0) as f64
            }),
        }
    };
    Some(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_like_number_to_string() {
        assert_eq!(number_to_string(3.0), "3");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(number_to_string(1e21), "1e+21");
        assert_eq!(number_to_string(123456789012345680000.0), "123456789012345680000");
        assert_eq!(number_to_string(0.000001), "0.000001");
        assert_eq!(number_to_string(1e-7), "1e-7");
        assert_eq!(number_to_string(-1.5e-9), "-1.5e-9");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn formats_in_other_radixes() {
        assert_eq!(number_to_radix_string(123.0, 16).as_deref(), Some("7b"));
        assert_eq!(number_to_radix_string(-8.0, 2).as_deref(), Some("-1000"));
        assert_eq!(number_to_radix_string(0.5, 2), None);
    }

    #[test]
    fn fixed_exponential_and_precision() {
        assert_eq!(to_fixed(123.456, 0), "123");
        assert_eq!(to_fixed(123.456, 1), "123.5");
        assert_eq!(to_fixed(0.5, 0), "1");
        assert_eq!(to_fixed(1.005, 2), "1.00");
        assert_eq!(to_fixed(0.000001, 2), "0.00");
        assert_eq!(to_fixed(-1.5, 0), "-2");
        assert_eq!(to_exponential(123.456, None), "1.23456e+2");
        assert_eq!(to_exponential(123.456, Some(3)), "1.235e+2");
        assert_eq!(to_exponential(0.0, Some(2)), "0.00e+0");
        assert_eq!(to_precision(123.456, 2), "1.2e+2");
        assert_eq!(to_precision(123.456, 4), "123.5");
        assert_eq!(to_precision(0.00001, 1), "0.00001");
        assert_eq!(to_precision(99.99, 3), "100");
    }

    #[test]
    fn parses_numeric_strings() {
        assert_eq!(string_to_number("  42  "), Some(42.0));
        assert_eq!(string_to_number(""), Some(0.0));
        assert_eq!(string_to_number("0x1F"), Some(31.0));
        assert_eq!(string_to_number("-Infinity"), Some(f64::NEG_INFINITY));
        assert!(string_to_number("inf").unwrap().is_nan());
        assert!(string_to_number("-0x1").unwrap().is_nan());
        assert!(string_to_number("1_000").unwrap().is_nan());
        assert_eq!(string_to_number(".5e1"), Some(5.0));
    }

    #[test]
    fn parse_float_and_int_take_prefixes() {
        assert_eq!(parse_float("3.14abc"), 3.14);
        assert_eq!(parse_float("  -.5"), -0.5);
        assert_eq!(parse_float("1e"), 1.0);
        assert!(parse_float("abc").is_nan());
        assert_eq!(parse_int("42px", 0), Some(42.0));
        assert_eq!(parse_int("0x1f", 0), Some(31.0));
        assert_eq!(parse_int("z", 36), Some(35.0));
        assert!(parse_int("12", 1).unwrap().is_nan());
    }
}
