//! Loose conversions over untyped JSON values.
//!
//! KumoMTA log records are produced by user-supplied templates, so numeric
//! fields sometimes arrive as strings. These helpers coerce the way an
//! integer cast in a weakly typed language would.

use serde_json::Value;

/// Look up `key` in `value`, treating JSON `null` as absent.
pub fn present<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.get(key).filter(|v| !v.is_null())
}

/// Coerce a JSON value to an integer.
///
/// `null` yields `None`. Floats truncate toward zero, booleans become 0/1,
/// strings contribute their leading number, truncated (or 0), and containers
/// become 0 when empty and 1 otherwise.
pub fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(i64::from(*b)),
        Value::Number(n) => Some(match n.as_i64() {
            Some(i) => i,
            // `as` saturates for out of range floats
            None => n.as_f64().map(|f| f.trunc() as i64).unwrap_or(i64::MAX),
        }),
        Value::String(s) => Some(leading_number(s)),
        Value::Array(items) => Some(i64::from(!items.is_empty())),
        Value::Object(map) => Some(i64::from(!map.is_empty())),
    }
}

/// Whether the value is an integer JSON number (no coercion needed).
pub fn is_integer(value: &Value) -> bool {
    value.as_i64().is_some() || value.as_u64().is_some()
}

/// Whether the value counts as empty: `""`, `"0"`, zero, `false`, `null`
/// and empty containers.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// Render a value for inclusion in a human-readable reason.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => String::new(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
                    Some(f) => f.to_string(),
                    None => n.to_string(),
                }
            }
        }
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Integer value of the leading numeric prefix of `s`: `"5"`, `"5.9 MB"`
/// and `"0.5e1"` all give 5. Strings without one give 0.
fn leading_number(s: &str) -> i64 {
    let s = s.trim_start_matches(|c: char| matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c'));
    let bytes = s.as_bytes();
    let digits_end = |mut i: usize| {
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        i
    };

    let sign_len = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let mut end = digits_end(sign_len);
    let mut mantissa_digits = end - sign_len;
    let mut integral = true;

    if bytes.get(end) == Some(&b'.') {
        let fraction_end = digits_end(end + 1);
        if fraction_end > end + 1 {
            mantissa_digits += fraction_end - end - 1;
            end = fraction_end;
            integral = false;
        }
    }

    if mantissa_digits == 0 {
        return 0;
    }

    // an exponent only counts when digits follow it
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exponent = end + 1;
        if matches!(bytes.get(exponent), Some(b'+' | b'-')) {
            exponent += 1;
        }
        let exponent_end = digits_end(exponent);
        if exponent_end > exponent {
            end = exponent_end;
            integral = false;
        }
    }

    let prefix = &s[..end];

    if !integral {
        // `as` saturates for out of range floats
        return prefix.parse::<f64>().map(|f| f.trunc() as i64).unwrap_or(0);
    }

    let magnitude = prefix[sign_len..]
        .bytes()
        .fold(0i64, |n, b| n.saturating_mul(10).saturating_add(i64::from(b - b'0')));

    if prefix.starts_with('-') {
        -magnitude
    } else {
        magnitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_present_skips_null() {
        let value = json!({"a": 1, "b": null});
        assert_eq!(present(&value, "a"), Some(&json!(1)));
        assert_eq!(present(&value, "b"), None);
        assert_eq!(present(&value, "c"), None);
    }

    #[test]
    fn test_present_on_non_object() {
        assert_eq!(present(&json!("text"), "a"), None);
        assert_eq!(present(&json!([1, 2]), "a"), None);
    }

    #[test]
    fn test_coerce_int_numbers() {
        assert_eq!(coerce_int(&json!(5)), Some(5));
        assert_eq!(coerce_int(&json!(-4)), Some(-4));
        assert_eq!(coerce_int(&json!(5.9)), Some(5));
        assert_eq!(coerce_int(&json!(-5.9)), Some(-5));
        assert_eq!(coerce_int(&json!(u64::MAX)), Some(i64::MAX));
    }

    #[test]
    fn test_coerce_int_strings() {
        assert_eq!(coerce_int(&json!("5")), Some(5));
        assert_eq!(coerce_int(&json!("  5")), Some(5));
        assert_eq!(coerce_int(&json!("5.1.1")), Some(5));
        assert_eq!(coerce_int(&json!("-3x")), Some(-3));
        assert_eq!(coerce_int(&json!("abc")), Some(0));
        assert_eq!(coerce_int(&json!("")), Some(0));
    }

    #[test]
    fn test_coerce_int_numeric_prefixes() {
        assert_eq!(coerce_int(&json!("0.5e1")), Some(5));
        assert_eq!(coerce_int(&json!("5e0")), Some(5));
        assert_eq!(coerce_int(&json!("1e3")), Some(1000));
        assert_eq!(coerce_int(&json!("5.9")), Some(5));
        assert_eq!(coerce_int(&json!("-2.5")), Some(-2));
        assert_eq!(coerce_int(&json!(".5e1")), Some(5));
        assert_eq!(coerce_int(&json!("5e")), Some(5));
        assert_eq!(coerce_int(&json!("5e+1x")), Some(50));
        assert_eq!(coerce_int(&json!("-")), Some(0));
        assert_eq!(coerce_int(&json!(".e1")), Some(0));
        assert_eq!(coerce_int(&json!("99999999999999999999")), Some(i64::MAX));
    }

    #[test]
    fn test_coerce_int_other() {
        assert_eq!(coerce_int(&Value::Null), None);
        assert_eq!(coerce_int(&json!(true)), Some(1));
        assert_eq!(coerce_int(&json!(false)), Some(0));
        assert_eq!(coerce_int(&json!([])), Some(0));
        assert_eq!(coerce_int(&json!([5])), Some(1));
        assert_eq!(coerce_int(&json!({})), Some(0));
    }

    #[test]
    fn test_is_integer() {
        assert!(is_integer(&json!(5)));
        assert!(!is_integer(&json!(5.0)));
        assert!(!is_integer(&json!("5")));
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(&json!("")));
        assert!(is_blank(&json!("0")));
        assert!(is_blank(&json!(0)));
        assert!(is_blank(&json!(false)));
        assert!(is_blank(&json!([])));
        assert!(!is_blank(&json!("user@example.com")));
        assert!(!is_blank(&json!(" ")));
        assert!(!is_blank(&json!(42)));
    }

    #[test]
    fn test_stringify() {
        assert_eq!(stringify(&json!(551)), "551");
        assert_eq!(stringify(&json!(550.0)), "550");
        assert_eq!(stringify(&json!(4.5)), "4.5");
        assert_eq!(stringify(&json!("MX didn't resolve")), "MX didn't resolve");
        assert_eq!(stringify(&json!(true)), "1");
        assert_eq!(stringify(&json!(false)), "");
        assert_eq!(stringify(&json!(["a"])), r#"["a"]"#);
    }
}
