//! Precision-aware numbers.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::TypeTag;

/// NumberNotation selects how numbers are printed when rounded to a precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NumberNotation {
    /// Fixed-point notation, e.g. `3.14`.
    #[default]
    #[serde(rename = "f")]
    Fixed,
    /// Exponential notation, e.g. `3.14e0`.
    #[serde(rename = "e")]
    Exponential,
}

impl NumberNotation {
    /// Parses the short notation name (`f` or `e`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "f" | "fixed" => Some(NumberNotation::Fixed),
            "e" | "exponential" => Some(NumberNotation::Exponential),
            _ => None,
        }
    }
}

/// Number is a numeric scalar that remembers its concrete type.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    Int(i64),
    UInt(u64),
    Float(f64),
}

impl Number {
    /// Returns the concrete type tag of the number.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Number::Int(_) => TypeTag::INT,
            Number::UInt(_) => TypeTag::UINT,
            Number::Float(_) => TypeTag::FLOAT,
        }
    }

    /// Returns the number as a float, possibly losing precision.
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Int(i) => *i as f64,
            Number::UInt(u) => *u as f64,
            Number::Float(f) => *f,
        }
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, Number::Float(f) if f.is_nan())
    }

    /// Compares two numbers by numeric value regardless of concrete type.
    ///
    /// NaN is never equal to anything, including itself.
    pub fn numeric_eq(&self, other: &Number) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a == b,
            (Number::UInt(a), Number::UInt(b)) => a == b,
            (Number::Int(a), Number::UInt(b)) | (Number::UInt(b), Number::Int(a)) => {
                *a >= 0 && *a as u64 == *b
            }
            _ => self.as_f64() == other.as_f64(),
        }
    }

    /// Returns true if the numbers differ by at most `epsilon`.
    pub fn is_close(&self, other: &Number, epsilon: f64) -> bool {
        if self.numeric_eq(other) {
            return true;
        }
        (self.as_f64() - other.as_f64()).abs() <= epsilon
    }

    /// Formats the number rounded to `digits` places in the given notation.
    ///
    /// Values equal at that precision produce identical strings. Negative
    /// zero is printed as zero.
    pub fn to_precision(&self, digits: u32, notation: NumberNotation) -> String {
        let digits = digits as usize;
        let formatted = match (notation, self) {
            (NumberNotation::Fixed, Number::Int(i)) => fixed_integer(&i.to_string(), digits),
            (NumberNotation::Fixed, Number::UInt(u)) => fixed_integer(&u.to_string(), digits),
            (_, Number::Float(f)) if !f.is_finite() => non_finite(*f).to_string(),
            (NumberNotation::Fixed, n) => format!("{:.*}", digits, n.as_f64()),
            (NumberNotation::Exponential, n) => format!("{:.*e}", digits, n.as_f64()),
        };
        normalize_negative_zero(formatted)
    }
}

fn fixed_integer(int: &str, digits: usize) -> String {
    if digits == 0 {
        int.to_string()
    } else {
        format!("{}.{}", int, "0".repeat(digits))
    }
}

fn non_finite(f: f64) -> &'static str {
    if f.is_nan() {
        "nan"
    } else if f > 0.0 {
        "inf"
    } else {
        "-inf"
    }
}

fn normalize_negative_zero(s: String) -> String {
    match s.strip_prefix('-') {
        Some(rest) => {
            let mantissa = rest.split('e').next().unwrap_or(rest);
            if mantissa.chars().all(|c| c == '0' || c == '.') {
                rest.to_string()
            } else {
                s
            }
        }
        None => s,
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{}", i),
            Number::UInt(u) => write!(f, "{}", u),
            Number::Float(x) if !x.is_finite() => write!(f, "{}", non_finite(*x)),
            Number::Float(x) if x.fract() == 0.0 && x.abs() < 1e16 => write!(f, "{:.1}", x),
            Number::Float(x) => write!(f, "{}", x),
        }
    }
}

impl From<i64> for Number {
    fn from(i: i64) -> Self {
        Number::Int(i)
    }
}

impl From<u64> for Number {
    fn from(u: u64) -> Self {
        Number::UInt(u)
    }
}

impl From<f64> for Number {
    fn from(f: f64) -> Self {
        Number::Float(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_precision_rounding() {
        let a = Number::Float(3.141).to_precision(2, NumberNotation::Fixed);
        let b = Number::Float(3.144).to_precision(2, NumberNotation::Fixed);
        let c = Number::Float(3.149).to_precision(2, NumberNotation::Fixed);
        assert_eq!(a, "3.14");
        assert_eq!(a, b);
        assert_eq!(c, "3.15");
    }

    #[test]
    fn test_integers_pad_decimal_places() {
        assert_eq!(Number::Int(3).to_precision(2, NumberNotation::Fixed), "3.00");
        assert_eq!(Number::UInt(7).to_precision(0, NumberNotation::Fixed), "7");
        assert_eq!(
            Number::Int(3).to_precision(2, NumberNotation::Fixed),
            Number::Float(3.0).to_precision(2, NumberNotation::Fixed)
        );
    }

    #[test]
    fn test_exponential_precision() {
        let a = Number::Float(1234.5).to_precision(2, NumberNotation::Exponential);
        let b = Number::Float(1229.0).to_precision(2, NumberNotation::Exponential);
        assert_eq!(a, "1.23e3");
        assert_eq!(a, b);
    }

    #[test]
    fn test_negative_zero_normalized() {
        assert_eq!(Number::Float(-0.001).to_precision(2, NumberNotation::Fixed), "0.00");
        assert_eq!(Number::Float(-0.5).to_precision(1, NumberNotation::Fixed), "-0.5");
    }

    #[test]
    fn test_numeric_eq_across_types() {
        assert!(Number::Int(1).numeric_eq(&Number::Float(1.0)));
        assert!(Number::Int(5).numeric_eq(&Number::UInt(5)));
        assert!(!Number::Int(-1).numeric_eq(&Number::UInt(u64::MAX)));
        assert!(!Number::Float(f64::NAN).numeric_eq(&Number::Float(f64::NAN)));
    }

    #[test]
    fn test_display() {
        assert_eq!(Number::Float(1.0).to_string(), "1.0");
        assert_eq!(Number::Float(3.141).to_string(), "3.141");
        assert_eq!(Number::Int(-4).to_string(), "-4");
        assert_eq!(Number::Float(f64::NAN).to_string(), "nan");
    }

    #[test]
    fn test_notation_names() {
        assert_eq!(NumberNotation::from_name("f"), Some(NumberNotation::Fixed));
        assert_eq!(NumberNotation::from_name("e"), Some(NumberNotation::Exponential));
        assert_eq!(NumberNotation::from_name("g"), None);
    }
}
