//! Field values of data records.

use log::debug;

use crate::profile::Timestamp;

use super::{
    cursor::{ByteCursor, Endian, OutOfBounds},
    definition::{BaseType, FieldDefinition},
};

/// A decoded field value.
///
/// Raw variants mirror the base types. The semantic variants ([`Scaled`],
/// [`Degrees`], [`Timestamp`]) are only produced by the rules of
/// [`crate::profile`].
///
/// [`Scaled`]: Value::Scaled
/// [`Degrees`]: Value::Degrees
/// [`Timestamp`]: Value::Timestamp
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Enum(u8),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
    /// Elements of a field whose size is a multiple of its base type's width.
    Array(Vec<Value>),
    /// A number after applying its profile's scale and offset.
    Scaled(f64),
    /// A coordinate converted from semicircles.
    Degrees(f64),
    Timestamp(Timestamp),
    /// The field held its base type's 'invalid' marker value.
    Invalid,
}

impl Value {
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid)
    }

    /// The value as a float, if it is a numeric scalar.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Enum(x) | Self::U8(x) => Some(x.into()),
            Self::U16(x) => Some(x.into()),
            Self::U32(x) => Some(x.into()),
            Self::U64(x) => Some(x as f64),
            Self::I8(x) => Some(x.into()),
            Self::I16(x) => Some(x.into()),
            Self::I32(x) => Some(x.into()),
            Self::I64(x) => Some(x as f64),
            Self::F32(x) => Some(x.into()),
            Self::F64(x) | Self::Scaled(x) | Self::Degrees(x) => Some(x),
            _ => None,
        }
    }

    /// The value as an unsigned integer, if it is a non-negative integer
    /// scalar.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Self::Enum(x) | Self::U8(x) => Some(x.into()),
            Self::U16(x) => Some(x.into()),
            Self::U32(x) => Some(x.into()),
            Self::U64(x) => Some(x),
            Self::I8(x) => x.try_into().ok(),
            Self::I16(x) => x.try_into().ok(),
            Self::I32(x) => x.try_into().ok(),
            Self::I64(x) => x.try_into().ok(),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match *self {
            Self::Timestamp(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Decode a field from a data record, consuming exactly its declared size.
///
/// A field whose size is not a whole multiple of its base type's width is
/// returned as [`Value::Bytes`] rather than rejected.
pub fn decode_field(
    c: &mut ByteCursor,
    field: &FieldDefinition,
    endian: Endian,
) -> Result<Value, OutOfBounds> {
    let size = field.size as usize;
    let width = field.base_type.width();

    match field.base_type {
        BaseType::String => {
            let s = c.read_string(size)?;
            Ok(if s.is_empty() {
                Value::Invalid
            } else {
                Value::String(s)
            })
        }
        BaseType::Byte => {
            let r = c.read_bytes(size)?;
            Ok(if r.iter().all(|&b| b == u8::MAX) {
                Value::Invalid
            } else {
                Value::Bytes(r.to_vec())
            })
        }
        base_type if size == width => decode_scalar(c, base_type, endian),
        base_type if size > width && size % width == 0 => {
            let values = (0..size / width)
                .map(|_| decode_scalar(c, base_type, endian))
                .collect::<Result<Vec<_>, _>>()?;

            Ok(if values.iter().all(Value::is_invalid) {
                Value::Invalid
            } else {
                Value::Array(values)
            })
        }
        base_type => {
            debug!(
                "field {} declares {} bytes for {:?}, keeping raw bytes",
                field.number, size, base_type
            );
            let r = c.read_bytes(size)?;
            Ok(if r.is_empty() {
                Value::Invalid
            } else {
                Value::Bytes(r.to_vec())
            })
        }
    }
}

/// Decode a single element of a base type, mapping its 'invalid' marker to
/// [`Value::Invalid`].
///
/// `string` and `byte` elements are one byte long and decode as a one-byte
/// field would through [`decode_field`].
pub fn decode_scalar(
    c: &mut ByteCursor,
    base_type: BaseType,
    e: Endian,
) -> Result<Value, OutOfBounds> {
    fn check<T: PartialEq>(x: T, invalid: T, f: fn(T) -> Value) -> Value {
        if x != invalid { f(x) } else { Value::Invalid }
    }

    Ok(match base_type {
        BaseType::String | BaseType::Byte => {
            let field = FieldDefinition {
                number: 0,
                size: 1,
                base_type,
            };
            return decode_field(c, &field, e);
        }

        BaseType::Enum => check(c.read_u8()?, u8::MAX, Value::Enum),
        BaseType::U8 => check(c.read_u8()?, u8::MAX, Value::U8),
        BaseType::U8Z => check(c.read_u8()?, u8::MIN, Value::U8),
        BaseType::I8 => check(c.read_i8()?, i8::MAX, Value::I8),

        BaseType::U16 => check(c.read_u16(e)?, u16::MAX, Value::U16),
        BaseType::U16Z => check(c.read_u16(e)?, u16::MIN, Value::U16),
        BaseType::I16 => check(c.read_i16(e)?, i16::MAX, Value::I16),

        BaseType::U32 => check(c.read_u32(e)?, u32::MAX, Value::U32),
        BaseType::U32Z => check(c.read_u32(e)?, u32::MIN, Value::U32),
        BaseType::I32 => check(c.read_i32(e)?, i32::MAX, Value::I32),

        BaseType::U64 => check(c.read_u64(e)?, u64::MAX, Value::U64),
        BaseType::U64Z => check(c.read_u64(e)?, u64::MIN, Value::U64),
        BaseType::I64 => check(c.read_i64(e)?, i64::MAX, Value::I64),

        // Floats are invalid when every bit is set, so compare bit patterns.
        BaseType::F32 => check(c.read_u32(e)?, u32::MAX, |x| Value::F32(f32::from_bits(x))),
        BaseType::F64 => check(c.read_u64(e)?, u64::MAX, |x| Value::F64(f64::from_bits(x))),
    })
}
