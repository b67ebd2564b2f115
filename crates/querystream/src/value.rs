//! Runtime value types for field comparison.
//!
//! [`Value`] is what an item hands back when one of its attributes is read;
//! it borrows from the item. [`Scalar`] is the owned counterpart stored inside
//! predicates as an expected value and used as a sort key.

use std::cmp::Ordering;
use std::fmt;

use crate::fields::Fields;

/// Runtime value of an attribute, borrowed from the item it was read from.
///
/// # Example
///
/// ```
/// use querystream::{Fields, Number, Value};
///
/// struct Task {
///     name: String,
///     priority: u8,
/// }
///
/// impl Fields for Task {
///     fn field_value(&self, name: &str) -> Option<Value<'_>> {
///         match name {
///             "name" => Some(Value::String(&self.name)),
///             "priority" => Some(Value::Number(Number::U64(self.priority as u64))),
///             _ => None,
///         }
///     }
/// }
/// ```
#[derive(Clone, Copy)]
pub enum Value<'a> {
    /// String value (borrowed).
    String(&'a str),
    /// Numeric value.
    Number(Number),
    /// Timestamp value (milliseconds since Unix epoch).
    Timestamp(Timestamp),
    /// Boolean value.
    Bool(bool),
    /// Attribute is present but holds no value.
    Null,
    /// A related object; field paths descend into it.
    Related(&'a dyn Fields),
}

impl<'a> Value<'a> {
    /// Returns `true` if this is a `Null` value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Extracts the string value, if present.
    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extracts the number value, if present.
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Copies this value into an owned [`Scalar`].
    ///
    /// Related objects have no scalar form and return `None`.
    pub fn to_scalar(&self) -> Option<Scalar> {
        match self {
            Value::String(s) => Some(Scalar::String((*s).to_string())),
            Value::Number(n) => Some(Scalar::Number(*n)),
            Value::Timestamp(t) => Some(Scalar::Timestamp(*t)),
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            Value::Null => Some(Scalar::Null),
            Value::Related(_) => None,
        }
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Value::Timestamp(t) => f.debug_tuple("Timestamp").field(t).finish(),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Null => f.write_str("Null"),
            Value::Related(_) => f.write_str("Related(..)"),
        }
    }
}

impl PartialEq for Value<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a.compare(*b) == Some(Ordering::Equal),
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Null, Value::Null) => true,
            // Same object, not structural equality.
            (Value::Related(a), Value::Related(b)) => {
                std::ptr::eq(*a as *const dyn Fields as *const u8, *b as *const dyn Fields as *const u8)
            }
            _ => false,
        }
    }
}

/// Numeric value supporting all common numeric types.
///
/// Comparisons between different variants are exact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Signed 64-bit integer.
    I64(i64),
    /// Unsigned 64-bit integer.
    U64(u64),
    /// 64-bit floating point.
    F64(f64),
}

impl Number {
    /// Returns `true` if this is a floating-point NaN.
    pub fn is_nan(self) -> bool {
        matches!(self, Number::F64(n) if n.is_nan())
    }

    /// Compares two numbers by exact value, across variants.
    ///
    /// Returns `None` only when either side is NaN.
    pub fn compare(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::I64(a), Number::I64(b)) => Some(a.cmp(&b)),
            (Number::U64(a), Number::U64(b)) => Some(a.cmp(&b)),
            (Number::F64(a), Number::F64(b)) => a.partial_cmp(&b),
            (Number::I64(a), Number::U64(b)) => Some(i128::from(a).cmp(&i128::from(b))),
            (Number::U64(a), Number::I64(b)) => Some(i128::from(a).cmp(&i128::from(b))),
            (Number::I64(a), Number::F64(b)) => compare_int_float(i128::from(a), b),
            (Number::U64(a), Number::F64(b)) => compare_int_float(i128::from(a), b),
            (Number::F64(a), Number::I64(b)) => compare_int_float(i128::from(b), a).map(Ordering::reverse),
            (Number::F64(a), Number::U64(b)) => compare_int_float(i128::from(b), a).map(Ordering::reverse),
        }
    }

    /// Total order for sorting: by value, with NaN after every other number.
    pub fn sort_cmp(self, other: Number) -> Ordering {
        match (self.is_nan(), other.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => self.compare(other).unwrap_or(Ordering::Equal),
        }
    }
}

// Exact: no rounding of the integer through f64.
fn compare_int_float(int: i128, float: f64) -> Option<Ordering> {
    const BOUND: f64 = 18_446_744_073_709_551_616.0; // 2^64
    if float.is_nan() {
        return None;
    }
    if float >= BOUND {
        return Some(Ordering::Less);
    }
    if float <= -BOUND {
        return Some(Ordering::Greater);
    }
    let whole = float.trunc();
    match int.cmp(&(whole as i128)) {
        Ordering::Equal => 0.0_f64.partial_cmp(&(float - whole)),
        unequal => Some(unequal),
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(*other)
    }
}

macro_rules! number_from {
    ($variant:ident as $target:ty: $($source:ty),+) => {
        $(
            impl From<$source> for Number {
                fn from(n: $source) -> Self {
                    Number::$variant(n as $target)
                }
            }
        )+
    };
}

number_from!(I64 as i64: i8, i16, i32, i64, isize);
number_from!(U64 as u64: u8, u16, u32, u64, usize);
number_from!(F64 as f64: f32, f64);

/// Timestamp value represented as milliseconds since Unix epoch.
///
/// ```
/// use querystream::Timestamp;
///
/// assert!(Timestamp(1000) < Timestamp(2000));
/// assert_eq!(Timestamp::from_secs(2).as_millis(), 2000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Creates a new timestamp from milliseconds since Unix epoch.
    pub fn from_millis(millis: i64) -> Self {
        Timestamp(millis)
    }

    /// Creates a new timestamp from seconds since Unix epoch.
    ///
    /// Saturates at the bounds of `i64` milliseconds.
    pub fn from_secs(secs: i64) -> Self {
        Timestamp(secs.saturating_mul(1000))
    }

    /// Returns the timestamp as milliseconds since Unix epoch.
    pub fn as_millis(self) -> i64 {
        self.0
    }

    /// Returns the timestamp as seconds since Unix epoch.
    pub fn as_secs(self) -> i64 {
        self.0 / 1000
    }
}

/// Owned value stored in predicates and used as a sort key.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// String value.
    String(String),
    /// Numeric value.
    Number(Number),
    /// Timestamp value.
    Timestamp(Timestamp),
    /// Boolean value.
    Bool(bool),
    /// No value.
    Null,
}

impl Scalar {
    /// Tests this expected value against a resolved attribute value.
    ///
    /// Types must agree; numbers compare numerically across variants.
    /// A related object never equals a scalar.
    pub fn matches(&self, value: &Value<'_>) -> bool {
        match (self, value) {
            (Scalar::String(a), Value::String(b)) => a == b,
            (Scalar::Number(a), Value::Number(b)) => a.compare(*b) == Some(Ordering::Equal),
            (Scalar::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Scalar::Bool(a), Value::Bool(b)) => a == b,
            (Scalar::Null, Value::Null) => true,
            _ => false,
        }
    }

    /// Compares two scalars of the same type.
    ///
    /// `Null` sorts after every other value. Returns `None` on a type
    /// mismatch or a NaN. Range lookups use this; sorting uses
    /// [`Scalar::sort_cmp`].
    pub fn compare(&self, other: &Scalar) -> Option<Ordering> {
        match (self, other) {
            (Scalar::String(a), Scalar::String(b)) => Some(a.cmp(b)),
            (Scalar::Number(a), Scalar::Number(b)) => a.compare(*b),
            (Scalar::Timestamp(a), Scalar::Timestamp(b)) => Some(a.cmp(b)),
            (Scalar::Bool(a), Scalar::Bool(b)) => Some(a.cmp(b)),
            (Scalar::Null, Scalar::Null) => Some(Ordering::Equal),
            (Scalar::Null, _) => Some(Ordering::Greater),
            (_, Scalar::Null) => Some(Ordering::Less),
            _ => None,
        }
    }
}

impl Scalar {
    fn type_rank(&self) -> u8 {
        match self {
            Scalar::Bool(_) => 0,
            Scalar::Number(_) => 1,
            Scalar::Timestamp(_) => 2,
            Scalar::String(_) => 3,
            Scalar::Null => 4,
        }
    }

    /// Total order used for sorting.
    ///
    /// Values of one type compare naturally, with NaN after every other
    /// number. Different types are ranked booleans, numbers, timestamps,
    /// strings, then `Null`.
    ///
    /// ```
    /// use std::cmp::Ordering;
    /// use querystream::Scalar;
    ///
    /// assert_eq!(Scalar::from(f64::NAN).sort_cmp(&Scalar::from(1.0)), Ordering::Greater);
    /// assert_eq!(Scalar::from("a").sort_cmp(&Scalar::from(9)), Ordering::Greater);
    /// assert_eq!(Scalar::Null.sort_cmp(&Scalar::from("z")), Ordering::Greater);
    /// ```
    pub fn sort_cmp(&self, other: &Scalar) -> Ordering {
        match (self, other) {
            (Scalar::String(a), Scalar::String(b)) => a.cmp(b),
            (Scalar::Number(a), Scalar::Number(b)) => a.sort_cmp(*b),
            (Scalar::Timestamp(a), Scalar::Timestamp(b)) => a.cmp(b),
            (Scalar::Bool(a), Scalar::Bool(b)) => a.cmp(b),
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::String(s)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_string())
    }
}

impl From<&String> for Scalar {
    fn from(s: &String) -> Self {
        Scalar::String(s.clone())
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<Number> for Scalar {
    fn from(n: Number) -> Self {
        Scalar::Number(n)
    }
}

impl From<Timestamp> for Scalar {
    fn from(t: Timestamp) -> Self {
        Scalar::Timestamp(t)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map_or(Scalar::Null, Into::into)
    }
}

macro_rules! scalar_from_number {
    ($($source:ty),+) => {
        $(
            impl From<$source> for Scalar {
                fn from(n: $source) -> Self {
                    Scalar::Number(Number::from(n))
                }
            }
        )+
    };
}

scalar_from_number!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);
