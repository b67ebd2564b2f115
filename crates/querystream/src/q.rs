//! The predicate combinator.
//!
//! A [`Q`] is a boolean test over one item. Leaves are either a set of
//! field-match conditions (all of which must hold) or an arbitrary closure;
//! composites combine other predicates with AND, OR and NOT.
//!
//! ```
//! use querystream::Q;
//!
//! let even: Q<i64> = Q::func(|n| n % 2 == 0);
//! let big: Q<i64> = Q::func(|n| *n > 10);
//!
//! let either = &even | &big;
//! assert!(either.matches(&4).unwrap());
//! assert!(either.matches(&11).unwrap());
//! assert!(!either.matches(&3).unwrap());
//! assert!((!&even).matches(&3).unwrap());
//! ```

use std::fmt;
use std::ops::{BitAnd, BitOr, Not};
use std::rc::Rc;

use crate::error::{QueryError, Result};
use crate::fields::Fields;
use crate::lookup::{Condition, Lookup, Operand};
use crate::value::Scalar;

/// Boxed single-argument test used by closure leaves.
pub type Predicate<T> = Box<dyn Fn(&T) -> bool>;

/// An immutable, composable predicate over items of type `T`.
///
/// Cloning is cheap: composite predicates share their children.
pub struct Q<T> {
    node: Rc<Node<T>>,
}

enum Node<T> {
    Match(Vec<Condition>),
    Func(Predicate<T>),
    And(Q<T>, Q<T>),
    Or(Q<T>, Q<T>),
    Not(Q<T>),
}

impl<T> Q<T> {
    fn from_node(node: Node<T>) -> Self {
        Q {
            node: Rc::new(node),
        }
    }

    /// Builds a leaf from its two possible parts.
    ///
    /// Exactly one of `conditions` (non-empty) and `func` must be supplied;
    /// both or neither is [`QueryError::InvalidPredicate`].
    pub fn from_parts(conditions: Vec<Condition>, func: Option<Predicate<T>>) -> Result<Self> {
        match (conditions.is_empty(), func) {
            (false, None) => Ok(Q::from_node(Node::Match(conditions))),
            (true, Some(func)) => Ok(Q::from_node(Node::Func(func))),
            (false, Some(_)) => Err(QueryError::InvalidPredicate(
                "a leaf takes either field matches or a callable, not both".to_string(),
            )),
            (true, None) => Err(QueryError::InvalidPredicate(
                "a leaf needs field matches or a callable".to_string(),
            )),
        }
    }

    /// Builds a leaf from keyword-style field matches, all AND-ed together.
    ///
    /// ```
    /// use querystream::{Q, Scalar};
    ///
    /// let q: Q<i32> = Q::fields([
    ///     ("number", Scalar::from(123)),
    ///     ("name", Scalar::from("test")),
    /// ])
    /// .unwrap();
    /// assert!(Q::<i32>::fields(Vec::<(&str, Scalar)>::new()).is_err());
    /// ```
    pub fn fields<I, K, V>(matches: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Scalar>,
    {
        let conditions = matches
            .into_iter()
            .map(|(path, value)| Condition::exact(path.as_ref(), value))
            .collect::<Result<Vec<_>>>()?;
        Q::from_parts(conditions, None)
    }

    /// Builds a single equality leaf.
    pub fn field(path: &str, value: impl Into<Scalar>) -> Result<Self> {
        Q::from_parts(vec![Condition::exact(path, value)?], None)
    }

    /// Builds a single leaf with an explicit lookup.
    ///
    /// ```
    /// use querystream::{Lookup, Q};
    ///
    /// let q: Q<char> = Q::lookup("number", Lookup::Gte, 10).unwrap();
    /// ```
    pub fn lookup(path: &str, lookup: Lookup, operand: impl Into<Operand>) -> Result<Self> {
        Q::from_parts(vec![Condition::new(path, lookup, operand)?], None)
    }

    /// Builds a leaf from a closure.
    pub fn func<F>(func: F) -> Self
    where
        F: Fn(&T) -> bool + 'static,
    {
        Q::from_node(Node::Func(Box::new(func)))
    }

    /// True iff both `self` and `other` are true.
    pub fn and_with(&self, other: &Q<T>) -> Q<T> {
        Q::from_node(Node::And(self.clone(), other.clone()))
    }

    /// True iff either `self` or `other` is true.
    pub fn or_with(&self, other: &Q<T>) -> Q<T> {
        Q::from_node(Node::Or(self.clone(), other.clone()))
    }

    /// True iff `self` is false.
    pub fn negate(&self) -> Q<T> {
        Q::from_node(Node::Not(self.clone()))
    }

    /// Folds predicates into their conjunction; `None` when there are none.
    pub fn all_of(predicates: impl IntoIterator<Item = Q<T>>) -> Option<Q<T>> {
        predicates.into_iter().reduce(|acc, q| acc & q)
    }
}

impl<T: Fields> Q<T> {
    /// Evaluates the predicate against one item.
    ///
    /// A field path that cannot be resolved on the item is an error, never a
    /// silent non-match.
    pub fn matches(&self, item: &T) -> Result<bool> {
        match &*self.node {
            Node::Match(conditions) => {
                for condition in conditions {
                    if !condition.matches(item)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Node::Func(func) => Ok(func(item)),
            Node::And(left, right) => Ok(left.matches(item)? && right.matches(item)?),
            Node::Or(left, right) => Ok(left.matches(item)? || right.matches(item)?),
            Node::Not(inner) => Ok(!inner.matches(item)?),
        }
    }
}

impl<T> Clone for Q<T> {
    fn clone(&self) -> Self {
        Q {
            node: Rc::clone(&self.node),
        }
    }
}

impl<T> fmt::Debug for Q<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.node {
            Node::Match(conditions) => {
                let mut tuple = f.debug_tuple("Q");
                for condition in conditions {
                    tuple.field(&format_args!(
                        "{}__{}={:?}",
                        condition.path(),
                        condition.lookup(),
                        condition.operand()
                    ));
                }
                tuple.finish()
            }
            Node::Func(_) => f.write_str("Q(<fn>)"),
            Node::And(left, right) => write!(f, "({left:?} & {right:?})"),
            Node::Or(left, right) => write!(f, "({left:?} | {right:?})"),
            Node::Not(inner) => write!(f, "!{inner:?}"),
        }
    }
}

impl<T> BitAnd for Q<T> {
    type Output = Q<T>;

    fn bitand(self, rhs: Q<T>) -> Q<T> {
        Q::from_node(Node::And(self, rhs))
    }
}

impl<T> BitAnd for &Q<T> {
    type Output = Q<T>;

    fn bitand(self, rhs: &Q<T>) -> Q<T> {
        self.and_with(rhs)
    }
}

impl<T> BitOr for Q<T> {
    type Output = Q<T>;

    fn bitor(self, rhs: Q<T>) -> Q<T> {
        Q::from_node(Node::Or(self, rhs))
    }
}

impl<T> BitOr for &Q<T> {
    type Output = Q<T>;

    fn bitor(self, rhs: &Q<T>) -> Q<T> {
        self.or_with(rhs)
    }
}

impl<T> Not for Q<T> {
    type Output = Q<T>;

    fn not(self) -> Q<T> {
        Q::from_node(Node::Not(self))
    }
}

impl<T> Not for &Q<T> {
    type Output = Q<T>;

    fn not(self) -> Q<T> {
        self.negate()
    }
}

/// Builds an equality [`Q`] from keyword-style field matches.
///
/// Evaluates to `Result<Q<T>>`; each value goes through `Scalar::from`.
///
/// ```
/// use querystream::{q, Q};
///
/// let matches: Q<char> = q! { number = 123, related_model__other_number = 5 }.unwrap();
/// ```
#[macro_export]
macro_rules! q {
    ($($path:ident = $value:expr),+ $(,)?) => {
        $crate::Q::fields([
            $((stringify!($path), $crate::Scalar::from($value))),+
        ])
    };
}
