//! Script-visible values as seen by the binding layer.
//!
//! The scripting engine hands the bindings primitive values only; objects are
//! reduced to primitives by the engine before they reach a setter.

use std::fmt;

/// A primitive script value.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptValue {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    /// A native method living on a shared prototype.
    Function(NativeFunction),
}

/// Reference to a native method exposed on an element prototype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeFunction {
    pub name: &'static str,
}

impl ScriptValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScriptValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            ScriptValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Name of the value's type the way `typeof` would report it.
    pub fn type_name(&self) -> &'static str {
        match self {
            ScriptValue::Undefined => "undefined",
            ScriptValue::Null => "object",
            ScriptValue::Bool(_) => "boolean",
            ScriptValue::Number(_) => "number",
            ScriptValue::String(_) => "string",
            ScriptValue::Function(_) => "function",
        }
    }

    /// Standard numeric coercion. Never fails: invalid input yields NaN.
    pub fn to_number(&self) -> f64 {
        match self {
            ScriptValue::Undefined => f64::NAN,
            ScriptValue::Null => 0.0,
            ScriptValue::Bool(true) => 1.0,
            ScriptValue::Bool(false) => 0.0,
            ScriptValue::Number(n) => *n,
            ScriptValue::String(s) => string_to_number(s),
            ScriptValue::Function(_) => f64::NAN,
        }
    }
}

impl From<f64> for ScriptValue {
    fn from(value: f64) -> Self {
        ScriptValue::Number(value)
    }
}

impl From<&str> for ScriptValue {
    fn from(value: &str) -> Self {
        ScriptValue::String(value.to_string())
    }
}

impl From<String> for ScriptValue {
    fn from(value: String) -> Self {
        ScriptValue::String(value)
    }
}

impl From<bool> for ScriptValue {
    fn from(value: bool) -> Self {
        ScriptValue::Bool(value)
    }
}

impl fmt::Display for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptValue::Undefined => f.write_str("undefined"),
            ScriptValue::Null => f.write_str("null"),
            ScriptValue::Bool(b) => write!(f, "{}", b),
            ScriptValue::Number(n) => f.write_str(&js_number_display(*n)),
            ScriptValue::String(s) => f.write_str(s),
            ScriptValue::Function(func) => write!(f, "function {}() {{ [native code] }}", func.name),
        }
    }
}

fn js_number_display(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        (if n > 0.0 { "Infinity" } else { "-Infinity" }).to_string()
    } else if n == n.trunc() && n.abs() < 1e21 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}

fn is_js_whitespace(c: char) -> bool {
    c.is_whitespace() || c == '\u{FEFF}'
}

/// StringToNumber: whitespace-trimmed decimal, `Infinity`, or a
/// `0x`/`0o`/`0b` integer literal. The empty string is zero.
pub fn string_to_number(input: &str) -> f64 {
    let s = input.trim_matches(is_js_whitespace);
    if s.is_empty() {
        return 0.0;
    }

    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    let radix = match s.get(..2) {
        Some("0x") | Some("0X") => Some(16),
        Some("0o") | Some("0O") => Some(8),
        Some("0b") | Some("0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return parse_radix_integer(&s[2..], radix);
    }

    // f64::from_str also accepts "inf"/"nan" spellings that are not numeric literals here
    let literal_chars = s
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'));
    if !literal_chars || !s.chars().any(|c| c.is_ascii_digit()) {
        return f64::NAN;
    }
    s.parse::<f64>().unwrap_or(f64::NAN)
}

fn parse_radix_integer(digits: &str, radix: u32) -> f64 {
    if digits.is_empty() {
        return f64::NAN;
    }
    let mut acc = 0.0f64;
    for c in digits.chars() {
        match c.to_digit(radix) {
            Some(d) => acc = acc * radix as f64 + d as f64,
            None => return f64::NAN,
        }
    }
    acc
}

/// Wire representation of a numeric property value.
///
/// Finite values are fixed-point with `precision` fractional digits, so
/// `100` becomes `"100.000000"` at the default precision.
pub fn number_to_wire(value: f64, precision: usize) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        (if value > 0.0 { "Infinity" } else { "-Infinity" }).to_string()
    } else {
        format!("{:.*}", precision, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_coercion() {
        assert_eq!(string_to_number("42"), 42.0);
        assert_eq!(string_to_number("  3.5\n"), 3.5);
        assert_eq!(string_to_number(""), 0.0);
        assert_eq!(string_to_number("   "), 0.0);
        assert_eq!(string_to_number("0x1F"), 31.0);
        assert_eq!(string_to_number("0b101"), 5.0);
        assert_eq!(string_to_number("-Infinity"), f64::NEG_INFINITY);
        assert_eq!(string_to_number("1e3"), 1000.0);
        assert_eq!(string_to_number(".5"), 0.5);
    }

    #[test]
    fn test_invalid_strings_are_nan() {
        for input in ["not-a-number", "inf", "NaN", "nan", "12px", "0x", "-0x10", "1e", "."] {
            assert!(string_to_number(input).is_nan(), "{input:?} should coerce to NaN");
        }
    }

    #[test]
    fn test_primitive_coercion() {
        assert!(ScriptValue::Undefined.to_number().is_nan());
        assert_eq!(ScriptValue::Null.to_number(), 0.0);
        assert_eq!(ScriptValue::Bool(true).to_number(), 1.0);
        assert_eq!(ScriptValue::from("7").to_number(), 7.0);
    }

    #[test]
    fn test_wire_format() {
        assert_eq!(number_to_wire(100.0, 6), "100.000000");
        assert_eq!(number_to_wire(0.5, 2), "0.50");
        assert_eq!(number_to_wire(f64::NAN, 6), "NaN");
        assert_eq!(number_to_wire(f64::INFINITY, 6), "Infinity");
    }

    #[test]
    fn test_display() {
        assert_eq!(ScriptValue::Number(300.0).to_string(), "300");
        assert_eq!(ScriptValue::Number(f64::NAN).to_string(), "NaN");
        assert_eq!(ScriptValue::Number(1.5).to_string(), "1.5");
        assert_eq!(ScriptValue::Null.type_name(), "object");
    }
}
