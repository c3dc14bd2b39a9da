//! Primitive conversion table
//!
//! A static table of the legal conversions between primitive kinds. It
//! models native numeric cast semantics rather than business rules, so it
//! is not configurable:
//!
//! - same kind to same kind copies the value
//! - any numeric kind converts to any other numeric kind; integer narrowing
//!   wraps (two's complement), float to integer rounds toward zero
//! - any numeric kind converts to a string in its canonical decimal form
//! - booleans only convert to booleans

use std::fmt;

use crate::error::{MapError, MapResult};
use crate::types::{NumericKind, PrimitiveKind};
use crate::value::Value;

/// How a conversion transforms the value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversionSemantics {
    /// Same kind, value copied unchanged
    Identity,
    /// Integer conversion that preserves every source value
    Widen,
    /// Integer conversion that keeps the low bits of the source
    Wrap,
    /// Float to integer, rounding toward zero
    FloatToInt,
    /// Integer to float, rounding to nearest
    IntToFloat,
    /// Numeric value to its decimal string form
    Stringify,
}

impl fmt::Display for ConversionSemantics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConversionSemantics::Identity => "identity",
            ConversionSemantics::Widen => "widen",
            ConversionSemantics::Wrap => "wrap",
            ConversionSemantics::FloatToInt => "float-to-int",
            ConversionSemantics::IntToFloat => "int-to-float",
            ConversionSemantics::Stringify => "stringify",
        };
        f.write_str(name)
    }
}

/// A legal conversion between two primitive kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Conversion {
    from: PrimitiveKind,
    to: PrimitiveKind,
    semantics: ConversionSemantics,
}

impl Conversion {
    /// Source kind
    pub fn from_kind(&self) -> PrimitiveKind {
        self.from
    }

    /// Destination kind
    pub fn to_kind(&self) -> PrimitiveKind {
        self.to
    }

    /// Conversion semantics
    pub fn semantics(&self) -> ConversionSemantics {
        self.semantics
    }

    /// Convert a value of the source kind
    ///
    /// Fails with `ValueKindMismatch` when the value is not of the source
    /// kind. Never fails on range: narrowing wraps.
    pub fn apply(&self, value: &Value) -> MapResult<Value> {
        if !matches_primitive(value, self.from) {
            return Err(MapError::mismatch(self.from, value.kind_name()));
        }
        let converted = match (self.semantics, self.to) {
            (ConversionSemantics::Identity, _) => value.clone(),
            (ConversionSemantics::Stringify, _) => Value::from(stringify(value)),
            (ConversionSemantics::Widen | ConversionSemantics::Wrap, PrimitiveKind::Numeric(to)) => {
                wrap_integer(integer_bits(value), to)
            }
            (ConversionSemantics::IntToFloat, _) => Value::F64(integer_bits(value) as f64),
            (ConversionSemantics::FloatToInt, PrimitiveKind::Numeric(to)) => {
                let float = value.as_f64().unwrap_or_default();
                match to {
                    NumericKind::U64 => Value::U64(float as u64),
                    _ => wrap_integer(i128::from(float as i64), to),
                }
            }
            _ => return Err(MapError::unsupported(self.from, self.to)),
        };
        Ok(converted)
    }
}

/// The static conversion table
#[derive(Debug, Clone, Copy, Default)]
pub struct ConversionTable;

impl ConversionTable {
    /// Look up the conversion from one primitive kind to another
    pub fn lookup(from: PrimitiveKind, to: PrimitiveKind) -> Option<Conversion> {
        let semantics = classify(from, to)?;
        Some(Conversion { from, to, semantics })
    }

    /// Check whether `from` can convert to `to`
    pub fn can_convert(from: PrimitiveKind, to: PrimitiveKind) -> bool {
        classify(from, to).is_some()
    }

    /// Convert a value between two primitive kinds
    pub fn convert(from: PrimitiveKind, to: PrimitiveKind, value: &Value) -> MapResult<Value> {
        Self::lookup(from, to)
            .ok_or_else(|| MapError::unsupported(from, to))?
            .apply(value)
    }
}

fn classify(from: PrimitiveKind, to: PrimitiveKind) -> Option<ConversionSemantics> {
    use PrimitiveKind::*;

    if from == to {
        return Some(ConversionSemantics::Identity);
    }
    match (from, to) {
        (Numeric(_), String) => Some(ConversionSemantics::Stringify),
        (Numeric(f), Numeric(t)) => Some(match (f.is_float(), t.is_float()) {
            (true, _) => ConversionSemantics::FloatToInt,
            (false, true) => ConversionSemantics::IntToFloat,
            (false, false) if is_lossless(f, t) => ConversionSemantics::Widen,
            (false, false) => ConversionSemantics::Wrap,
        }),
        _ => None,
    }
}

/// Every value of integer kind `from` is representable in `to`
fn is_lossless(from: NumericKind, to: NumericKind) -> bool {
    match (from.is_signed(), to.is_signed()) {
        (true, true) | (false, false) => to.bits() >= from.bits(),
        (false, true) => to.bits() > from.bits(),
        (true, false) => false,
    }
}

fn matches_primitive(value: &Value, kind: PrimitiveKind) -> bool {
    match kind {
        PrimitiveKind::Numeric(n) => value.numeric_kind() == Some(n),
        PrimitiveKind::String => matches!(value, Value::String(_)),
        PrimitiveKind::Boolean => matches!(value, Value::Bool(_)),
    }
}

fn integer_bits(value: &Value) -> i128 {
    match value {
        Value::I16(v) => i128::from(*v),
        Value::I32(v) => i128::from(*v),
        Value::I64(v) => i128::from(*v),
        Value::U16(v) => i128::from(*v),
        Value::U32(v) => i128::from(*v),
        Value::U64(v) => i128::from(*v),
        _ => 0,
    }
}

fn wrap_integer(bits: i128, to: NumericKind) -> Value {
    match to {
        NumericKind::I16 => Value::I16(bits as i16),
        NumericKind::I32 => Value::I32(bits as i32),
        NumericKind::I64 => Value::I64(bits as i64),
        NumericKind::U16 => Value::U16(bits as u16),
        NumericKind::U32 => Value::U32(bits as u32),
        NumericKind::U64 => Value::U64(bits as u64),
        NumericKind::F64 => Value::F64(bits as f64),
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::I16(v) => v.to_string(),
        Value::I32(v) => v.to_string(),
        Value::I64(v) => v.to_string(),
        Value::U16(v) => v.to_string(),
        Value::U32(v) => v.to_string(),
        Value::U64(v) => v.to_string(),
        Value::F64(v) => v.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const I16: PrimitiveKind = PrimitiveKind::Numeric(NumericKind::I16);
    const I32: PrimitiveKind = PrimitiveKind::Numeric(NumericKind::I32);
    const I64: PrimitiveKind = PrimitiveKind::Numeric(NumericKind::I64);
    const U16: PrimitiveKind = PrimitiveKind::Numeric(NumericKind::U16);
    const U32: PrimitiveKind = PrimitiveKind::Numeric(NumericKind::U32);
    const U64: PrimitiveKind = PrimitiveKind::Numeric(NumericKind::U64);
    const F64: PrimitiveKind = PrimitiveKind::Numeric(NumericKind::F64);

    #[test]
    fn test_classification() {
        let semantics = |from, to| ConversionTable::lookup(from, to).map(|c| c.semantics());
        assert_eq!(semantics(I32, I32), Some(ConversionSemantics::Identity));
        assert_eq!(semantics(I16, I64), Some(ConversionSemantics::Widen));
        assert_eq!(semantics(U16, I32), Some(ConversionSemantics::Widen));
        assert_eq!(semantics(U32, I32), Some(ConversionSemantics::Wrap));
        assert_eq!(semantics(I16, U64), Some(ConversionSemantics::Wrap));
        assert_eq!(semantics(F64, I16), Some(ConversionSemantics::FloatToInt));
        assert_eq!(semantics(U64, F64), Some(ConversionSemantics::IntToFloat));
        assert_eq!(semantics(F64, PrimitiveKind::String), Some(ConversionSemantics::Stringify));
    }

    #[test]
    fn test_boolean_only_converts_to_boolean() {
        use PrimitiveKind::{Boolean, String};
        assert!(ConversionTable::can_convert(Boolean, Boolean));
        assert!(!ConversionTable::can_convert(Boolean, I32));
        assert!(!ConversionTable::can_convert(I32, Boolean));
        assert!(!ConversionTable::can_convert(Boolean, String));
        assert!(!ConversionTable::can_convert(String, I32));
        assert!(ConversionTable::can_convert(String, String));
    }

    #[test]
    fn test_narrowing_wraps() {
        assert_eq!(ConversionTable::convert(I32, I16, &Value::I32(65537)).unwrap(), Value::I16(1));
        assert_eq!(ConversionTable::convert(I32, U16, &Value::I32(-1)).unwrap(), Value::U16(0xFFFF));
        assert_eq!(
            ConversionTable::convert(U64, I64, &Value::U64(u64::MAX)).unwrap(),
            Value::I64(-1)
        );
        assert_eq!(ConversionTable::convert(I16, U32, &Value::I16(-2)).unwrap(), Value::U32(u32::MAX - 1));
    }

    #[test]
    fn test_float_to_int_truncates() {
        assert_eq!(ConversionTable::convert(F64, I32, &Value::F64(2.9)).unwrap(), Value::I32(2));
        assert_eq!(ConversionTable::convert(F64, I32, &Value::F64(-2.9)).unwrap(), Value::I32(-2));
        assert_eq!(ConversionTable::convert(F64, I16, &Value::F64(65537.5)).unwrap(), Value::I16(1));
        assert_eq!(ConversionTable::convert(F64, U64, &Value::F64(-1.0)).unwrap(), Value::U64(0));
        assert_eq!(ConversionTable::convert(F64, I64, &Value::F64(f64::NAN)).unwrap(), Value::I64(0));
    }

    #[test]
    fn test_stringify() {
        let to_string = PrimitiveKind::String;
        assert_eq!(ConversionTable::convert(I32, to_string, &Value::I32(-42)).unwrap(), Value::from("-42"));
        assert_eq!(ConversionTable::convert(F64, to_string, &Value::F64(1.5)).unwrap(), Value::from("1.5"));
        assert_eq!(
            ConversionTable::convert(U64, to_string, &Value::U64(u64::MAX)).unwrap(),
            Value::from(u64::MAX.to_string())
        );
    }

    #[test]
    fn test_apply_rejects_wrong_source_kind() {
        let err = ConversionTable::convert(I32, I16, &Value::I64(1)).unwrap_err();
        assert!(matches!(err, MapError::ValueKindMismatch { .. }));

        let err = ConversionTable::convert(PrimitiveKind::Boolean, I32, &Value::Bool(true)).unwrap_err();
        assert!(matches!(err, MapError::UnsupportedConversion { .. }));
    }
}
