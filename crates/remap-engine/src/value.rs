//! Dynamic value representation
//!
//! Scalars are stored inline; objects and lists are shared references.
//! Equality follows the same split: scalars compare by value, objects and
//! lists compare by identity.

use std::fmt;
use std::sync::Arc;

use crate::object::{ListRef, ObjectRef};
use crate::types::{FieldKind, NumericKind};

/// A mapped or mappable value
#[derive(Clone, Default)]
pub enum Value {
    /// Absent value
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// 16-bit signed integer
    I16(i16),
    /// 32-bit signed integer
    I32(i32),
    /// 64-bit signed integer
    I64(i64),
    /// 16-bit unsigned integer
    U16(u16),
    /// 32-bit unsigned integer
    U32(u32),
    /// 64-bit unsigned integer
    U64(u64),
    /// 64-bit float
    F64(f64),
    /// Immutable string
    String(Arc<str>),
    /// Point in time as milliseconds since the Unix epoch
    DateTime(i64),
    /// Object reference
    Object(ObjectRef),
    /// List reference
    List(ListRef),
}

impl Value {
    /// Create a null value
    #[inline]
    pub const fn null() -> Self {
        Value::Null
    }

    /// Check if this value is null
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The value a freshly created field of this kind holds
    ///
    /// Numbers start at zero and booleans at `false`; every other kind
    /// starts null.
    pub fn default_for(kind: &FieldKind) -> Self {
        match kind {
            FieldKind::Numeric(NumericKind::I16) => Value::I16(0),
            FieldKind::Numeric(NumericKind::I32) => Value::I32(0),
            FieldKind::Numeric(NumericKind::I64) => Value::I64(0),
            FieldKind::Numeric(NumericKind::U16) => Value::U16(0),
            FieldKind::Numeric(NumericKind::U32) => Value::U32(0),
            FieldKind::Numeric(NumericKind::U64) => Value::U64(0),
            FieldKind::Numeric(NumericKind::F64) => Value::F64(0.0),
            FieldKind::Boolean => Value::Bool(false),
            FieldKind::String
            | FieldKind::DateTime
            | FieldKind::Nested(_)
            | FieldKind::Collection(_)
            | FieldKind::Polymorphic(_) => Value::Null,
        }
    }

    /// Short name of the value's kind, for diagnostics
    pub fn kind_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(_) => "boolean".to_string(),
            Value::String(_) => "string".to_string(),
            Value::DateTime(_) => "datetime".to_string(),
            Value::Object(obj) => obj.type_key().to_string(),
            Value::List(list) => format!("{}[]", list.element_kind()),
            other => match other.numeric_kind() {
                Some(kind) => kind.to_string(),
                None => "unknown".to_string(),
            },
        }
    }

    /// Numeric kind of a numeric value
    pub fn numeric_kind(&self) -> Option<NumericKind> {
        match self {
            Value::I16(_) => Some(NumericKind::I16),
            Value::I32(_) => Some(NumericKind::I32),
            Value::I64(_) => Some(NumericKind::I64),
            Value::U16(_) => Some(NumericKind::U16),
            Value::U32(_) => Some(NumericKind::U32),
            Value::U64(_) => Some(NumericKind::U64),
            Value::F64(_) => Some(NumericKind::F64),
            _ => None,
        }
    }

    /// Check whether this value may be stored in a field of the given kind
    ///
    /// Null fits every kind.
    pub fn fits(&self, kind: &FieldKind) -> bool {
        match (self, kind) {
            (Value::Null, _) => true,
            (Value::Bool(_), FieldKind::Boolean) => true,
            (Value::String(_), FieldKind::String) => true,
            (Value::DateTime(_), FieldKind::DateTime) => true,
            (Value::Object(obj), FieldKind::Nested(key)) => obj.type_key() == key,
            (Value::Object(_), FieldKind::Polymorphic(_)) => true,
            (Value::List(_), FieldKind::Collection(_)) => true,
            (value, FieldKind::Numeric(kind)) => value.numeric_kind() == Some(*kind),
            _ => false,
        }
    }

    /// Get as boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as signed 64-bit integer, for any integer value that fits
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I16(v) => Some(i64::from(*v)),
            Value::I32(v) => Some(i64::from(*v)),
            Value::I64(v) => Some(*v),
            Value::U16(v) => Some(i64::from(*v)),
            Value::U32(v) => Some(i64::from(*v)),
            Value::U64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Get as float
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the object reference
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Get the list reference
    pub fn as_list(&self) -> Option<&ListRef> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    /// Identity-compare two values
    ///
    /// True only for two references to the same object or list.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::List(a), Value::List(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::I16(a), Value::I16(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::U16(a), Value::U16(b)) => a == b,
            (Value::U32(a), Value::U32(b)) => a == b,
            (Value::U64(a), Value::U64(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Object(_), Value::Object(_)) | (Value::List(_), Value::List(_)) => {
                self.ptr_eq(other)
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::I16(v) => write!(f, "{}i16", v),
            Value::I32(v) => write!(f, "{}i32", v),
            Value::I64(v) => write!(f, "{}i64", v),
            Value::U16(v) => write!(f, "{}u16", v),
            Value::U32(v) => write!(f, "{}u32", v),
            Value::U64(v) => write!(f, "{}u64", v),
            Value::F64(v) => write!(f, "{}f64", v),
            Value::String(s) => write!(f, "{:?}", s),
            Value::DateTime(ms) => write!(f, "datetime({})", ms),
            // objects may be cyclic, so only their identity is printed
            Value::Object(obj) => write!(f, "{}@{:#x}", obj.type_key(), Arc::as_ptr(obj) as usize),
            Value::List(list) => write!(f, "[{}; {}]", list.element_kind(), list.len()),
        }
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from_scalar! {
    bool => Bool,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f64 => F64,
    ObjectRef => Object,
    ListRef => List,
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Arc::from(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_for() {
        assert_eq!(Value::default_for(&FieldKind::I16), Value::I16(0));
        assert_eq!(Value::default_for(&FieldKind::F64), Value::F64(0.0));
        assert_eq!(Value::default_for(&FieldKind::Boolean), Value::Bool(false));
        assert!(Value::default_for(&FieldKind::String).is_null());
        assert!(Value::default_for(&FieldKind::nested("A")).is_null());
    }

    #[test]
    fn test_fits() {
        assert!(Value::I32(1).fits(&FieldKind::I32));
        assert!(!Value::I32(1).fits(&FieldKind::I64));
        assert!(Value::Null.fits(&FieldKind::Boolean));
        assert!(Value::from("x").fits(&FieldKind::String));
        assert!(!Value::Bool(true).fits(&FieldKind::String));
    }

    #[test]
    fn test_scalar_equality() {
        assert_eq!(Value::from(3i16), Value::I16(3));
        assert_ne!(Value::I16(3), Value::I32(3));
        assert_eq!(Value::from("abc"), Value::from(String::from("abc")));
    }

    #[test]
    fn test_as_i64() {
        assert_eq!(Value::U16(7).as_i64(), Some(7));
        assert_eq!(Value::U64(u64::MAX).as_i64(), None);
        assert_eq!(Value::F64(1.0).as_i64(), None);
    }
}
