// used for dates and times in cells
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
// used for decimals in cells
use bigdecimal::BigDecimal;

// used to print out readable forms of values and types
use std::fmt;

use crate::entity::EnumDescriptor;

/// Declared type of a column, and the scalar part of a property type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Bool,
    U8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Decimal,
    Text,
    Date,
    DateTime,
    Time,
    Bytes,
}

impl ColumnType {
    pub const fn name(&self) -> &'static str {
        match self {
            ColumnType::Bool => "bool",
            ColumnType::U8 => "u8",
            ColumnType::I16 => "i16",
            ColumnType::I32 => "i32",
            ColumnType::I64 => "i64",
            ColumnType::F32 => "f32",
            ColumnType::F64 => "f64",
            ColumnType::Decimal => "BigDecimal",
            ColumnType::Text => "String",
            ColumnType::Date => "NaiveDate",
            ColumnType::DateTime => "NaiveDateTime",
            ColumnType::Time => "NaiveTime",
            ColumnType::Bytes => "Vec<u8>",
        }
    }
    pub const fn is_integral(&self) -> bool {
        matches!(
            self,
            ColumnType::U8 | ColumnType::I16 | ColumnType::I32 | ColumnType::I64
        )
    }
}
impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One cell of a row. `Null` is the explicit "no value" marker and is never
/// the same thing as a zero or an empty string.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    U8(u8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Decimal(BigDecimal),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    Bytes(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
    /// The runtime type of the cell, `None` for the no-value marker.
    pub fn column_type(&self) -> Option<ColumnType> {
        Some(match self {
            Value::Null => return None,
            Value::Bool(_) => ColumnType::Bool,
            Value::U8(_) => ColumnType::U8,
            Value::I16(_) => ColumnType::I16,
            Value::I32(_) => ColumnType::I32,
            Value::I64(_) => ColumnType::I64,
            Value::F32(_) => ColumnType::F32,
            Value::F64(_) => ColumnType::F64,
            Value::Decimal(_) => ColumnType::Decimal,
            Value::Text(_) => ColumnType::Text,
            Value::Date(_) => ColumnType::Date,
            Value::DateTime(_) => ColumnType::DateTime,
            Value::Time(_) => ColumnType::Time,
            Value::Bytes(_) => ColumnType::Bytes,
        })
    }
    pub fn type_name(&self) -> &'static str {
        self.column_type().map_or("null", |t| t.name())
    }
    /// Integral cells widened to `i64`; everything else is `None`.
    pub fn as_integral(&self) -> Option<i64> {
        match self {
            Value::U8(n) => Some(i64::from(*n)),
            Value::I16(n) => Some(i64::from(*n)),
            Value::I32(n) => Some(i64::from(*n)),
            Value::I64(n) => Some(*n),
            _ => None,
        }
    }
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::U8(n) => write!(f, "{}", n),
            Value::I16(n) => write!(f, "{}", n),
            Value::I32(n) => write!(f, "{}", n),
            Value::I64(n) => write!(f, "{}", n),
            Value::F32(n) => write!(f, "{}", n),
            Value::F64(n) => write!(f, "{}", n),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Text(s) => write!(f, "{}", s),
            Value::Date(d) => write!(f, "{}", d),
            Value::DateTime(d) => write!(f, "{}", d),
            Value::Time(t) => write!(f, "{}", t),
            Value::Bytes(b) => write!(f, "0x{}", b.iter().map(|x| format!("{:02x}", x)).collect::<String>()),
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),+ $(,)?) => {$(
        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v)
            }
        }
    )+};
}
value_from! {
    bool => Bool,
    u8 => U8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    BigDecimal => Decimal,
    String => Text,
    NaiveDate => Date,
    NaiveDateTime => DateTime,
    NaiveTime => Time,
    Vec<u8> => Bytes,
}
impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_owned())
    }
}
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

// ------------- Property types --------------
#[derive(Debug, Clone, Copy)]
pub enum PropertyKind {
    Scalar(ColumnType),
    /// Enumerations travel as `i32` ordinals once coerced.
    Enum(fn() -> &'static EnumDescriptor),
}

/// What a destination property holds: a scalar or an enumeration, possibly
/// behind an `Option`.
#[derive(Debug, Clone, Copy)]
pub struct PropertyType {
    pub kind: PropertyKind,
    pub optional: bool,
}

impl PropertyType {
    pub const fn scalar(column_type: ColumnType) -> Self {
        Self {
            kind: PropertyKind::Scalar(column_type),
            optional: false,
        }
    }
    pub const fn enumeration(descriptor: fn() -> &'static EnumDescriptor) -> Self {
        Self {
            kind: PropertyKind::Enum(descriptor),
            optional: false,
        }
    }
    pub const fn optional(self) -> Self {
        Self {
            optional: true,
            ..self
        }
    }
    /// The type a column carrying this property has in an outbound table,
    /// with any `Option` unwrapped.
    pub fn column_type(&self) -> ColumnType {
        match self.kind {
            PropertyKind::Scalar(column_type) => column_type,
            PropertyKind::Enum(_) => ColumnType::I32,
        }
    }
    pub fn enum_descriptor(&self) -> Option<&'static EnumDescriptor> {
        match self.kind {
            PropertyKind::Enum(descriptor) => Some(descriptor()),
            PropertyKind::Scalar(_) => None,
        }
    }
    fn inner_name(&self) -> &'static str {
        match self.kind {
            PropertyKind::Scalar(column_type) => column_type.name(),
            PropertyKind::Enum(descriptor) => descriptor().name,
        }
    }
}
impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.optional {
            write!(f, "Option<{}>", self.inner_name())
        } else {
            write!(f, "{}", self.inner_name())
        }
    }
}

/// A type that can sit in an entity property and be filled from a cell.
pub trait Field: Sized {
    const TYPE: PropertyType;
    /// Accepts a value already coerced to [`Self::TYPE`]. `Value::Null` yields
    /// the field's default; a value of the wrong kind is handed back.
    fn from_value(value: Value) -> Result<Self, Value>;
    fn to_value(&self) -> Value;
}

macro_rules! scalar_field {
    ($($ty:ty => $variant:ident),+ $(,)?) => {$(
        impl Field for $ty {
            const TYPE: PropertyType = PropertyType::scalar(ColumnType::$variant);
            fn from_value(value: Value) -> Result<Self, Value> {
                match value {
                    Value::Null => Ok(<$ty>::default()),
                    Value::$variant(v) => Ok(v),
                    other => Err(other),
                }
            }
            fn to_value(&self) -> Value {
                Value::$variant(self.clone())
            }
        }
    )+};
}
scalar_field! {
    bool => Bool,
    u8 => U8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    BigDecimal => Decimal,
    String => Text,
    NaiveDate => Date,
    NaiveDateTime => DateTime,
    NaiveTime => Time,
    Vec<u8> => Bytes,
}

impl<T: Field> Field for Option<T> {
    const TYPE: PropertyType = T::TYPE.optional();
    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, Field::to_value)
    }
}
