//! The attribute-readable capability.
//!
//! [`Fields`] is the one thing a stream needs from its items: a way to read a
//! named attribute. It is usually derived with `#[derive(Fields)]`, but can be
//! implemented by hand.

use std::rc::Rc;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::value::{Timestamp, Value};

/// Trait for items whose attributes can be read by name.
///
/// Field paths (`related_model__other_number`) and orderings resolve through
/// this trait, one segment at a time.
///
/// # Derive Usage
///
/// ```ignore
/// use querystream::{Fields, QueryStream, q};
///
/// #[derive(Clone, Fields)]
/// struct Task {
///     #[field(String)]
///     name: String,
///     #[field(Number)]
///     priority: u8,
/// }
///
/// let stream = QueryStream::new(vec![
///     Task { name: "Write docs".into(), priority: 3 },
///     Task { name: "Fix bug".into(), priority: 5 },
/// ]);
/// let urgent = stream.filter(q! { priority = 5 }?);
/// ```
///
/// # Manual Implementation
///
/// ```
/// use querystream::{Fields, Number, Value};
///
/// struct Author {
///     name: String,
/// }
///
/// struct Book {
///     pages: u32,
///     author: Author,
/// }
///
/// impl Fields for Author {
///     fn field_value(&self, name: &str) -> Option<Value<'_>> {
///         match name {
///             "name" => Some(Value::String(&self.name)),
///             _ => None,
///         }
///     }
/// }
///
/// impl Fields for Book {
///     fn field_value(&self, name: &str) -> Option<Value<'_>> {
///         match name {
///             "pages" => Some(Value::Number(Number::from(self.pages))),
///             "author" => Some(Value::Related(&self.author)),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait Fields {
    /// Returns the value of the named attribute.
    ///
    /// `None` means the item has no such attribute, which is an error during
    /// path resolution. An attribute that exists but is empty should return
    /// `Some(Value::Null)`.
    fn field_value(&self, name: &str) -> Option<Value<'_>>;
}

impl<T: Fields + ?Sized> Fields for &T {
    fn field_value(&self, name: &str) -> Option<Value<'_>> {
        (**self).field_value(name)
    }
}

impl<T: Fields + ?Sized> Fields for Box<T> {
    fn field_value(&self, name: &str) -> Option<Value<'_>> {
        (**self).field_value(name)
    }
}

impl<T: Fields + ?Sized> Fields for Rc<T> {
    fn field_value(&self, name: &str) -> Option<Value<'_>> {
        (**self).field_value(name)
    }
}

impl<T: Fields + ?Sized> Fields for Arc<T> {
    fn field_value(&self, name: &str) -> Option<Value<'_>> {
        (**self).field_value(name)
    }
}

// Plain values have no attributes; they can still be filtered with callables.
macro_rules! attributeless {
    ($($ty:ty),+) => {
        $(
            impl Fields for $ty {
                fn field_value(&self, _name: &str) -> Option<Value<'_>> {
                    None
                }
            }
        )+
    };
}

attributeless!(
    (), bool, char, str, String, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize,
    f32, f64
);

/// Helper trait for converting types to timestamps.
///
/// Used by `#[derive(Fields)]` for fields marked `#[field(Timestamp)]`.
///
/// ```
/// use querystream::{AsTimestamp, Timestamp};
///
/// struct MyDateTime(i64);
///
/// impl AsTimestamp for MyDateTime {
///     fn as_timestamp(&self) -> Timestamp {
///         Timestamp::from_millis(self.0)
///     }
/// }
/// ```
pub trait AsTimestamp {
    /// Converts this value to a [`Timestamp`].
    fn as_timestamp(&self) -> Timestamp;
}

impl AsTimestamp for Timestamp {
    fn as_timestamp(&self) -> Timestamp {
        *self
    }
}

impl AsTimestamp for i64 {
    fn as_timestamp(&self) -> Timestamp {
        Timestamp::from_millis(*self)
    }
}

impl AsTimestamp for u64 {
    fn as_timestamp(&self) -> Timestamp {
        Timestamp::from_millis(i64::try_from(*self).unwrap_or(i64::MAX))
    }
}

impl AsTimestamp for SystemTime {
    fn as_timestamp(&self) -> Timestamp {
        match self.duration_since(UNIX_EPOCH) {
            Ok(after) => Timestamp::from_millis(i64::try_from(after.as_millis()).unwrap_or(i64::MAX)),
            Err(before) => Timestamp::from_millis(
                i64::try_from(before.duration().as_millis()).map_or(i64::MIN, |millis| -millis),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::value::Number;

    struct TestItem {
        name: String,
        count: i32,
    }

    impl Fields for TestItem {
        fn field_value(&self, name: &str) -> Option<Value<'_>> {
            match name {
                "name" => Some(Value::String(&self.name)),
                "count" => Some(Value::Number(Number::from(self.count))),
                _ => None,
            }
        }
    }

    #[test]
    fn manual_impl() {
        let item = TestItem {
            name: "test".to_string(),
            count: 42,
        };

        assert_eq!(item.field_value("name"), Some(Value::String("test")));
        assert_eq!(
            item.field_value("count"),
            Some(Value::Number(Number::I64(42)))
        );
        assert_eq!(item.field_value("unknown"), None);
    }

    #[test]
    fn smart_pointers_delegate() {
        let item = Rc::new(TestItem {
            name: "shared".to_string(),
            count: 1,
        });
        assert_eq!(item.field_value("name"), Some(Value::String("shared")));
        assert_eq!(Box::new(7u8).field_value("anything"), None);
    }

    #[test]
    fn primitives_have_no_attributes() {
        assert_eq!('a'.field_value("len"), None);
        assert_eq!("abc".field_value("len"), None);
        assert_eq!(3.5f64.field_value("floor"), None);
    }

    #[test]
    fn system_time_timestamps() {
        let later = UNIX_EPOCH + Duration::from_secs(2);
        assert_eq!(later.as_timestamp(), Timestamp(2000));
        let earlier = UNIX_EPOCH - Duration::from_millis(1500);
        assert_eq!(earlier.as_timestamp(), Timestamp(-1500));
    }

    #[test]
    fn unsigned_millis_saturate() {
        assert_eq!(42u64.as_timestamp(), Timestamp(42));
        assert_eq!(u64::MAX.as_timestamp(), Timestamp(i64::MAX));
    }
}
