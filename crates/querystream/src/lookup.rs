//! Field-match conditions: a path, a lookup and an operand.
//!
//! A plain keyword match (`number = 123`) is a [`Condition`] with
//! [`Lookup::Exact`]. Other lookups are opt-in through [`Q::lookup`] and are
//! never parsed out of the path string.
//!
//! [`Q::lookup`]: crate::Q::lookup

use std::cmp::Ordering;
use std::fmt;

use regex::Regex;

use crate::error::Result;
use crate::fields::Fields;
use crate::path::FieldPath;
use crate::value::{Number, Scalar, Timestamp, Value};

/// Comparison applied to a resolved attribute.
///
/// - **Equality**: `Exact`, `IExact`
/// - **String**: `Contains`, `IContains`, `StartsWith`, `EndsWith`, `Regex`
/// - **Ordering**: `Gt`, `Gte`, `Lt`, `Lte`
/// - **Membership**: `In`
/// - **Presence**: `IsNull`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lookup {
    /// Equal, with no type coercion.
    #[default]
    Exact,
    /// Case-insensitive string equality.
    IExact,
    /// String contains substring.
    Contains,
    /// Case-insensitive substring match.
    IContains,
    /// String starts with prefix.
    StartsWith,
    /// String ends with suffix.
    EndsWith,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Equal to one of a set of values.
    In,
    /// String matches a regular expression.
    Regex,
    /// Attribute is (or, with `false`, is not) null.
    IsNull,
}

impl Lookup {
    const ALL: [Lookup; 13] = [
        Lookup::Exact,
        Lookup::IExact,
        Lookup::Contains,
        Lookup::IContains,
        Lookup::StartsWith,
        Lookup::EndsWith,
        Lookup::Gt,
        Lookup::Gte,
        Lookup::Lt,
        Lookup::Lte,
        Lookup::In,
        Lookup::Regex,
        Lookup::IsNull,
    ];

    /// Returns the lowercase name of this lookup.
    pub fn name(self) -> &'static str {
        match self {
            Lookup::Exact => "exact",
            Lookup::IExact => "iexact",
            Lookup::Contains => "contains",
            Lookup::IContains => "icontains",
            Lookup::StartsWith => "startswith",
            Lookup::EndsWith => "endswith",
            Lookup::Gt => "gt",
            Lookup::Gte => "gte",
            Lookup::Lt => "lt",
            Lookup::Lte => "lte",
            Lookup::In => "in",
            Lookup::Regex => "regex",
            Lookup::IsNull => "isnull",
        }
    }

    /// Finds a lookup by its lowercase name.
    pub fn from_name(name: &str) -> Option<Lookup> {
        Lookup::ALL.into_iter().find(|lookup| lookup.name() == name)
    }

    /// Evaluates an ordering-based lookup.
    ///
    /// Returns `false` for lookups that are not ordering comparisons.
    pub fn eval_ordering(self, ordering: Ordering) -> bool {
        match self {
            Lookup::Exact => ordering == Ordering::Equal,
            Lookup::Gt => ordering == Ordering::Greater,
            Lookup::Gte => ordering != Ordering::Less,
            Lookup::Lt => ordering == Ordering::Less,
            Lookup::Lte => ordering != Ordering::Greater,
            _ => false,
        }
    }

    /// Evaluates a string lookup.
    fn eval_str(self, field: &str, pattern: &str) -> bool {
        match self {
            Lookup::IExact => field.to_lowercase() == pattern.to_lowercase(),
            Lookup::Contains => field.contains(pattern),
            Lookup::IContains => field.to_lowercase().contains(&pattern.to_lowercase()),
            Lookup::StartsWith => field.starts_with(pattern),
            Lookup::EndsWith => field.ends_with(pattern),
            _ => false,
        }
    }
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Right-hand side of a condition.
#[derive(Debug, Clone)]
pub enum Operand {
    /// A single value.
    Scalar(Scalar),
    /// A set of values, for [`Lookup::In`].
    Set(Vec<Scalar>),
    /// A compiled pattern, for [`Lookup::Regex`].
    Regex(Regex),
}

impl From<Scalar> for Operand {
    fn from(value: Scalar) -> Self {
        Operand::Scalar(value)
    }
}

impl From<Regex> for Operand {
    fn from(regex: Regex) -> Self {
        Operand::Regex(regex)
    }
}

impl From<Vec<Scalar>> for Operand {
    fn from(set: Vec<Scalar>) -> Self {
        Operand::Set(set)
    }
}

macro_rules! operand_from_scalar {
    ($($source:ty),+) => {
        $(
            impl From<$source> for Operand {
                fn from(value: $source) -> Self {
                    Operand::Scalar(Scalar::from(value))
                }
            }
        )+
    };
}

operand_from_scalar!(
    String, &str, &String, bool, Number, Timestamp, i8, i16, i32, i64, isize, u8, u16, u32, u64,
    usize, f32, f64
);

impl<T: Into<Scalar>> FromIterator<T> for Operand {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Operand::Set(iter.into_iter().map(Into::into).collect())
    }
}

/// A single field-match test: resolve `path`, then apply `lookup` against `operand`.
#[derive(Debug, Clone)]
pub struct Condition {
    path: FieldPath,
    lookup: Lookup,
    operand: Operand,
}

impl Condition {
    /// Creates a condition, validating the path.
    ///
    /// A string operand given to [`Lookup::Regex`] is compiled here.
    pub fn new(path: &str, lookup: Lookup, operand: impl Into<Operand>) -> Result<Self> {
        let path = FieldPath::parse(path)?;
        let operand = match (lookup, operand.into()) {
            (Lookup::Regex, Operand::Scalar(Scalar::String(pattern))) => {
                Operand::Regex(Regex::new(&pattern)?)
            }
            (_, operand) => operand,
        };
        Ok(Condition {
            path,
            lookup,
            operand,
        })
    }

    /// Creates an equality condition.
    pub fn exact(path: &str, value: impl Into<Scalar>) -> Result<Self> {
        Condition::new(path, Lookup::Exact, Operand::Scalar(value.into()))
    }

    /// Returns the field path.
    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Returns the lookup.
    pub fn lookup(&self) -> Lookup {
        self.lookup
    }

    /// Returns the operand.
    pub fn operand(&self) -> &Operand {
        &self.operand
    }

    /// Resolves the path on `item` and tests the resolved value.
    ///
    /// Resolution failures are errors; a type mismatch between operand and
    /// value is simply a non-match.
    pub fn matches(&self, item: &dyn Fields) -> Result<bool> {
        let value = self.path.resolve(item)?;
        Ok(self.test(&value))
    }

    /// Tests an already resolved value.
    pub fn test(&self, value: &Value<'_>) -> bool {
        match (self.lookup, &self.operand) {
            (Lookup::Exact, Operand::Scalar(expected)) => expected.matches(value),
            (Lookup::IsNull, Operand::Scalar(Scalar::Bool(expected))) => {
                value.is_null() == *expected
            }
            (Lookup::In, Operand::Set(candidates)) => {
                candidates.iter().any(|candidate| candidate.matches(value))
            }
            (Lookup::Regex, Operand::Regex(regex)) => {
                value.as_str().is_some_and(|s| regex.is_match(s))
            }
            (Lookup::Gt | Lookup::Gte | Lookup::Lt | Lookup::Lte, Operand::Scalar(expected)) => {
                match (value.to_scalar(), expected) {
                    // Null is not ordered against anything here.
                    (Some(Scalar::Null), _) | (_, Scalar::Null) | (None, _) => false,
                    (Some(actual), expected) => actual
                        .compare(expected)
                        .is_some_and(|ordering| self.lookup.eval_ordering(ordering)),
                }
            }
            (lookup, Operand::Scalar(Scalar::String(pattern))) => value
                .as_str()
                .is_some_and(|field| lookup.eval_str(field, pattern)),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cond(lookup: Lookup, operand: impl Into<Operand>) -> Condition {
        Condition::new("field", lookup, operand).unwrap()
    }

    #[test]
    fn lookup_names_round_trip() {
        for lookup in Lookup::ALL {
            assert_eq!(Lookup::from_name(lookup.name()), Some(lookup));
        }
        assert_eq!(Lookup::from_name("nope"), None);
        assert_eq!(Lookup::StartsWith.to_string(), "startswith");
    }

    #[test]
    fn lookup_eval_ordering() {
        assert!(Lookup::Gt.eval_ordering(Ordering::Greater));
        assert!(!Lookup::Gt.eval_ordering(Ordering::Equal));
        assert!(Lookup::Gte.eval_ordering(Ordering::Equal));
        assert!(Lookup::Lt.eval_ordering(Ordering::Less));
        assert!(!Lookup::Lte.eval_ordering(Ordering::Greater));
        assert!(!Lookup::Contains.eval_ordering(Ordering::Equal));
    }

    #[test]
    fn exact_is_strict() {
        let c = cond(Lookup::Exact, "hello");
        assert!(c.test(&Value::String("hello")));
        assert!(!c.test(&Value::String("Hello")));
        assert!(!c.test(&Value::Null));
    }

    #[test]
    fn string_lookups() {
        assert!(cond(Lookup::IExact, "HeLLo").test(&Value::String("hello")));
        assert!(cond(Lookup::Contains, "llo").test(&Value::String("hello")));
        assert!(!cond(Lookup::Contains, "LLO").test(&Value::String("hello")));
        assert!(cond(Lookup::IContains, "LLO").test(&Value::String("hello")));
        assert!(cond(Lookup::StartsWith, "he").test(&Value::String("hello")));
        assert!(cond(Lookup::EndsWith, "lo").test(&Value::String("hello")));
        assert!(!cond(Lookup::EndsWith, "lo").test(&Value::Number(Number::I64(1))));
    }

    #[test]
    fn regex_compiled_at_construction() {
        let c = cond(Lookup::Regex, r"^hello\d+$");
        assert!(matches!(c.operand(), Operand::Regex(_)));
        assert!(c.test(&Value::String("hello123")));
        assert!(!c.test(&Value::String("hello")));

        let err = Condition::new("field", Lookup::Regex, "(").unwrap_err();
        assert!(matches!(err, crate::QueryError::InvalidRegex(_)));
    }

    #[test]
    fn ordering_lookups() {
        let gt = cond(Lookup::Gt, 10);
        assert!(gt.test(&Value::Number(Number::I64(11))));
        assert!(!gt.test(&Value::Number(Number::I64(10))));
        assert!(gt.test(&Value::Number(Number::F64(10.5))));
        assert!(!gt.test(&Value::Null));
        assert!(!gt.test(&Value::String("11")));

        let before = cond(Lookup::Lt, Timestamp(1000));
        assert!(before.test(&Value::Timestamp(Timestamp(500))));
        assert!(!before.test(&Value::Timestamp(Timestamp(1000))));

        let lte = cond(Lookup::Lte, "m");
        assert!(lte.test(&Value::String("a")));
        assert!(!lte.test(&Value::String("z")));
    }

    #[test]
    fn in_lookup() {
        let c = cond(Lookup::In, [1i32, 2, 3].into_iter().collect::<Operand>());
        assert!(c.test(&Value::Number(Number::U64(2))));
        assert!(!c.test(&Value::Number(Number::U64(4))));
    }

    #[test]
    fn isnull_lookup() {
        assert!(cond(Lookup::IsNull, true).test(&Value::Null));
        assert!(!cond(Lookup::IsNull, true).test(&Value::Bool(false)));
        assert!(cond(Lookup::IsNull, false).test(&Value::Bool(false)));
    }

    #[test]
    fn mismatched_operand_never_matches() {
        assert!(!cond(Lookup::In, 1).test(&Value::Number(Number::I64(1))));
        assert!(!cond(Lookup::IsNull, "yes").test(&Value::Null));
    }

    #[test]
    fn invalid_path_rejected() {
        assert!(Condition::exact("a____b", 1).is_err());
    }
}
