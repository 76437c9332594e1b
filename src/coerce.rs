//! Turning raw cells into the exact type of a destination property.

// used when parsing text cells
use std::str::FromStr;

use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use crate::cache::MetadataCache;
use crate::datatype::{ColumnType, PropertyKind, Value};
use crate::entity::{EntityType, EnumDescriptor, EnumMember, PropertyDescriptor};
use crate::error::{CoercionFailure, ConversionError, EnumResolutionError};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S%.f",
];
const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

#[derive(Debug, Clone, Copy)]
pub struct Coercer<'c> {
    cache: &'c MetadataCache,
}

impl<'c> Coercer<'c> {
    pub fn new(cache: &'c MetadataCache) -> Self {
        Self { cache }
    }

    /// Coerces `raw` for `property` of `entity`.
    ///
    /// The no-value marker comes back unchanged: it is the property's own
    /// `Field` impl that turns it into a default (or `None`). An optional
    /// property is coerced as its inner type and wrapped on assignment.
    /// Enumerations come back as `Value::I32` ordinals.
    pub fn coerce(
        &self,
        raw: &Value,
        entity: EntityType,
        property: &'static PropertyDescriptor,
    ) -> Result<Value, ConversionError> {
        if raw.is_null() {
            return Ok(Value::Null);
        }
        let outcome = match property.property_type.kind {
            PropertyKind::Enum(descriptor) => self
                .enum_member(raw, entity, property, descriptor())
                .map(|member| Value::I32(member.ordinal)),
            PropertyKind::Scalar(target) => convert(raw, target),
        };
        outcome.map_err(|cause| ConversionError {
            property: property.name,
            property_type: property.property_type,
            value: raw.clone(),
            cause,
        })
    }

    /// Ordinal for integral cells. Text goes through the value map, then the
    /// member names, then the member aliases.
    fn enum_member(
        &self,
        raw: &Value,
        entity: EntityType,
        property: &'static PropertyDescriptor,
        descriptor: &'static EnumDescriptor,
    ) -> Result<&'static EnumMember, CoercionFailure> {
        let not_found = || EnumResolutionError::new(raw.to_string(), descriptor.name);
        if let Some(code) = raw.as_integral() {
            return i32::try_from(code)
                .ok()
                .and_then(|ordinal| descriptor.by_ordinal(ordinal))
                .ok_or_else(|| not_found().into());
        }
        let Some(text) = raw.as_text() else {
            return Err(CoercionFailure::Unsupported {
                from: raw.type_name(),
                target: descriptor.name,
            });
        };
        let pairs = if self.cache.has_enum_map(entity, property.name) {
            self.cache.enum_map(entity, property.name).unwrap_or_default()
        } else {
            property.annotations.enum_map
        };
        let parsed = match pairs.iter().find(|(external, _)| *external == text) {
            Some((_, local)) => descriptor.parse(local),
            None => descriptor.parse(text),
        };
        parsed
            .or_else(|| descriptor.by_alias(text))
            .ok_or_else(|| not_found().into())
    }
}

/// General conversion between cell types: numeric widening and checked
/// narrowing, text to and from anything textual, booleans as numbers.
/// Floating point to integer rounds half to even.
pub fn convert(value: &Value, target: ColumnType) -> Result<Value, CoercionFailure> {
    if value.column_type() == Some(target) {
        return Ok(value.clone());
    }
    let overflow = || CoercionFailure::Overflow {
        value: value.to_string(),
        target: target.name(),
    };
    match target {
        ColumnType::Bool => to_bool(value).map(Value::Bool),
        ColumnType::U8 => u8::try_from(to_i64(value, target)?).map(Value::U8).map_err(|_| overflow()),
        ColumnType::I16 => i16::try_from(to_i64(value, target)?).map(Value::I16).map_err(|_| overflow()),
        ColumnType::I32 => i32::try_from(to_i64(value, target)?).map(Value::I32).map_err(|_| overflow()),
        ColumnType::I64 => to_i64(value, target).map(Value::I64),
        ColumnType::F32 => to_f64(value, target).map(|f| Value::F32(f as f32)),
        ColumnType::F64 => to_f64(value, target).map(Value::F64),
        ColumnType::Decimal => to_decimal(value, target).map(Value::Decimal),
        ColumnType::Text => match value {
            Value::Bytes(_) => Err(unsupported(value, target)),
            other => Ok(Value::Text(other.to_string())),
        },
        ColumnType::Date => match value {
            Value::DateTime(dt) => Ok(Value::Date(dt.date())),
            Value::Text(s) => parse_date(s).map(Value::Date),
            other => Err(unsupported(other, target)),
        },
        ColumnType::DateTime => match value {
            Value::Date(d) => d
                .and_hms_opt(0, 0, 0)
                .map(Value::DateTime)
                .ok_or_else(overflow),
            Value::Text(s) => parse_date_time(s).map(Value::DateTime),
            other => Err(unsupported(other, target)),
        },
        ColumnType::Time => match value {
            Value::DateTime(dt) => Ok(Value::Time(dt.time())),
            Value::Text(s) => parse_time(s).map(Value::Time),
            other => Err(unsupported(other, target)),
        },
        ColumnType::Bytes => Err(unsupported(value, target)),
    }
}

fn unsupported(value: &Value, target: ColumnType) -> CoercionFailure {
    CoercionFailure::Unsupported {
        from: value.type_name(),
        target: target.name(),
    }
}

fn unparsable(text: &str, target: ColumnType) -> CoercionFailure {
    CoercionFailure::Parse {
        text: text.to_owned(),
        target: target.name(),
    }
}

fn to_bool(value: &Value) -> Result<bool, CoercionFailure> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::F32(f) => Ok(*f != 0.0),
        Value::F64(f) => Ok(*f != 0.0),
        Value::Decimal(d) => Ok(*d != BigDecimal::default()),
        Value::Text(s) => {
            let s = s.trim();
            if s.eq_ignore_ascii_case("true") {
                Ok(true)
            } else if s.eq_ignore_ascii_case("false") {
                Ok(false)
            } else {
                Err(unparsable(s, ColumnType::Bool))
            }
        }
        other => other
            .as_integral()
            .map(|n| n != 0)
            .ok_or_else(|| unsupported(other, ColumnType::Bool)),
    }
}

fn to_i64(value: &Value, target: ColumnType) -> Result<i64, CoercionFailure> {
    let overflow = || CoercionFailure::Overflow {
        value: value.to_string(),
        target: target.name(),
    };
    match value {
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::F32(f) => float_to_i64(f64::from(*f)).ok_or_else(overflow),
        Value::F64(f) => float_to_i64(*f).ok_or_else(overflow),
        Value::Decimal(d) => d.round(0).to_i64().ok_or_else(overflow),
        Value::Text(s) => s.trim().parse::<i64>().map_err(|_| unparsable(s, target)),
        other => other.as_integral().ok_or_else(|| unsupported(other, target)),
    }
}

fn float_to_i64(f: f64) -> Option<i64> {
    let rounded = f.round_ties_even();
    // i64::MAX as f64 rounds up to 2^63, which is already out of range
    if rounded.is_finite() && rounded >= i64::MIN as f64 && rounded < i64::MAX as f64 {
        Some(rounded as i64)
    } else {
        None
    }
}

fn to_f64(value: &Value, target: ColumnType) -> Result<f64, CoercionFailure> {
    match value {
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::F32(f) => Ok(f64::from(*f)),
        Value::F64(f) => Ok(*f),
        Value::Decimal(d) => d.to_f64().ok_or_else(|| CoercionFailure::Overflow {
            value: d.to_string(),
            target: target.name(),
        }),
        Value::Text(s) => s.trim().parse::<f64>().map_err(|_| unparsable(s, target)),
        other => other
            .as_integral()
            .map(|n| n as f64)
            .ok_or_else(|| unsupported(other, target)),
    }
}

fn to_decimal(value: &Value, target: ColumnType) -> Result<BigDecimal, CoercionFailure> {
    let overflow = || CoercionFailure::Overflow {
        value: value.to_string(),
        target: target.name(),
    };
    match value {
        Value::Bool(b) => Ok(BigDecimal::from(i64::from(*b))),
        Value::F32(f) => BigDecimal::try_from(f64::from(*f)).map_err(|_| overflow()),
        Value::F64(f) => BigDecimal::try_from(*f).map_err(|_| overflow()),
        Value::Text(s) => BigDecimal::from_str(s.trim()).map_err(|_| unparsable(s, target)),
        other => other
            .as_integral()
            .map(BigDecimal::from)
            .ok_or_else(|| unsupported(other, target)),
    }
}

fn parse_date(text: &str) -> Result<NaiveDate, CoercionFailure> {
    let trimmed = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .or_else(|| parse_date_time(trimmed).ok().map(|dt| dt.date()))
        .ok_or_else(|| unparsable(text, ColumnType::Date))
}

fn parse_date_time(text: &str) -> Result<NaiveDateTime, CoercionFailure> {
    let trimmed = text.trim();
    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .or_else(|| DateTime::parse_from_rfc3339(trimmed).ok().map(|dt| dt.naive_utc()))
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| unparsable(text, ColumnType::DateTime))
}

fn parse_time(text: &str) -> Result<NaiveTime, CoercionFailure> {
    let trimmed = text.trim();
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| unparsable(text, ColumnType::Time))
}
