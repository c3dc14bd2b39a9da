//! Type keys and field kinds

use std::fmt;
use std::sync::Arc;

/// Identifier of a registered type
///
/// Cheap to clone; compared and hashed by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey(Arc<str>);

impl TypeKey {
    /// Create a type key from a name
    pub fn new(name: impl AsRef<str>) -> Self {
        TypeKey(Arc::from(name.as_ref()))
    }

    /// Type name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeKey {
    fn from(name: &str) -> Self {
        TypeKey::new(name)
    }
}

impl From<String> for TypeKey {
    fn from(name: String) -> Self {
        TypeKey(Arc::from(name))
    }
}

/// Numeric field subtypes, in table order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NumericKind {
    /// 16-bit signed integer
    I16,
    /// 32-bit signed integer
    I32,
    /// 64-bit signed integer
    I64,
    /// 16-bit unsigned integer
    U16,
    /// 32-bit unsigned integer
    U32,
    /// 64-bit unsigned integer
    U64,
    /// 64-bit IEEE 754 float
    F64,
}

impl NumericKind {
    /// All numeric kinds in table order
    pub const ALL: [NumericKind; 7] = [
        NumericKind::I16,
        NumericKind::I32,
        NumericKind::I64,
        NumericKind::U16,
        NumericKind::U32,
        NumericKind::U64,
        NumericKind::F64,
    ];

    /// Whether this is the floating point kind
    pub fn is_float(self) -> bool {
        self == NumericKind::F64
    }

    /// Whether this is a signed integer kind
    pub fn is_signed(self) -> bool {
        matches!(self, NumericKind::I16 | NumericKind::I32 | NumericKind::I64)
    }

    /// Width in bits
    pub fn bits(self) -> u32 {
        match self {
            NumericKind::I16 | NumericKind::U16 => 16,
            NumericKind::I32 | NumericKind::U32 => 32,
            NumericKind::I64 | NumericKind::U64 | NumericKind::F64 => 64,
        }
    }
}

impl fmt::Display for NumericKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NumericKind::I16 => "i16",
            NumericKind::I32 => "i32",
            NumericKind::I64 => "i64",
            NumericKind::U16 => "u16",
            NumericKind::U32 => "u32",
            NumericKind::U64 => "u64",
            NumericKind::F64 => "f64",
        };
        f.write_str(name)
    }
}

/// Kinds the conversion table operates on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// Numeric kind
    Numeric(NumericKind),
    /// String
    String,
    /// Boolean
    Boolean,
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveKind::Numeric(n) => write!(f, "{}", n),
            PrimitiveKind::String => f.write_str("string"),
            PrimitiveKind::Boolean => f.write_str("boolean"),
        }
    }
}

/// Semantic kind of a field or constructor parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Numeric primitive
    Numeric(NumericKind),
    /// String
    String,
    /// Boolean
    Boolean,
    /// Point in time, assigned as-is
    DateTime,
    /// Instance of another registered concrete type
    Nested(TypeKey),
    /// Ordered collection of elements of the given kind
    Collection(Box<FieldKind>),
    /// Interface-typed value; realized through a registered concrete type
    Polymorphic(TypeKey),
}

impl FieldKind {
    /// `i16` field
    pub const I16: FieldKind = FieldKind::Numeric(NumericKind::I16);
    /// `i32` field
    pub const I32: FieldKind = FieldKind::Numeric(NumericKind::I32);
    /// `i64` field
    pub const I64: FieldKind = FieldKind::Numeric(NumericKind::I64);
    /// `u16` field
    pub const U16: FieldKind = FieldKind::Numeric(NumericKind::U16);
    /// `u32` field
    pub const U32: FieldKind = FieldKind::Numeric(NumericKind::U32);
    /// `u64` field
    pub const U64: FieldKind = FieldKind::Numeric(NumericKind::U64);
    /// `f64` field
    pub const F64: FieldKind = FieldKind::Numeric(NumericKind::F64);

    /// Nested field of the given type
    pub fn nested(key: impl Into<TypeKey>) -> Self {
        FieldKind::Nested(key.into())
    }

    /// Interface-typed field
    pub fn polymorphic(key: impl Into<TypeKey>) -> Self {
        FieldKind::Polymorphic(key.into())
    }

    /// Collection of the given element kind
    pub fn collection(element: FieldKind) -> Self {
        FieldKind::Collection(Box::new(element))
    }

    /// The primitive kind, if the conversion table applies to this kind
    pub fn as_primitive(&self) -> Option<PrimitiveKind> {
        match self {
            FieldKind::Numeric(n) => Some(PrimitiveKind::Numeric(*n)),
            FieldKind::String => Some(PrimitiveKind::String),
            FieldKind::Boolean => Some(PrimitiveKind::Boolean),
            _ => None,
        }
    }

    /// The referenced type key for nested and polymorphic kinds
    pub fn type_key(&self) -> Option<&TypeKey> {
        match self {
            FieldKind::Nested(key) | FieldKind::Polymorphic(key) => Some(key),
            _ => None,
        }
    }

    /// Whether values of this kind are objects
    pub fn is_object(&self) -> bool {
        matches!(self, FieldKind::Nested(_) | FieldKind::Polymorphic(_))
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Numeric(n) => write!(f, "{}", n),
            FieldKind::String => f.write_str("string"),
            FieldKind::Boolean => f.write_str("boolean"),
            FieldKind::DateTime => f.write_str("datetime"),
            FieldKind::Nested(key) => write!(f, "{}", key),
            FieldKind::Collection(element) => write!(f, "{}[]", element),
            FieldKind::Polymorphic(key) => write!(f, "dyn {}", key),
        }
    }
}

impl From<NumericKind> for FieldKind {
    fn from(kind: NumericKind) -> Self {
        FieldKind::Numeric(kind)
    }
}
