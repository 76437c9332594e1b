//! Tables built from typed values, for use as table-valued parameters.
//!
//! Three shapes are supported. Entities become one column per property that
//! is not marked `table_ignore`, named by `table_column` when present; optional
//! properties are unwrapped to their inner column type and absent values become
//! no-value cells. Ordered `(name, value)` records take their columns from the
//! first record. Scalars become a single text column named `value`.

use tracing::debug;

use crate::coerce::convert;
use crate::datatype::{ColumnType, Field, Value};
use crate::entity::Entity;
use crate::error::{Result, RowbindError};
use crate::table::{Column, Schema, Table};

/// Name of the single column of a scalar table.
pub const SCALAR_COLUMN: &str = "value";

/// A map-like record: ordered column names and their values.
pub type Record = Vec<(String, Value)>;

/// Columns of the outbound table for `T`, in declaration order.
pub fn describe_for_table<T: Entity>() -> Vec<Column> {
    T::descriptor()
        .properties()
        .iter()
        .filter(|property| !property.annotations.table_ignore)
        .map(|property| Column::new(property.table_column_name(), property.property_type.column_type()))
        .collect()
}

pub fn from_entities<'a, T, I>(items: I) -> Result<Table>
where
    T: Entity + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let properties: Vec<_> = T::descriptor()
        .properties()
        .iter()
        .filter(|property| !property.annotations.table_ignore)
        .collect();
    let mut table = Table::new(Schema::new(describe_for_table::<T>()));
    for item in items {
        let cells = properties
            .iter()
            .map(|property| item.read(property.name).unwrap_or_default())
            .collect::<Vec<_>>();
        table.push_row(cells)?;
    }
    debug!(entity = T::descriptor().name, rows = table.len(), "built outbound table");
    Ok(table)
}

/// The record form of an entity, keyed like its outbound table.
pub fn to_record<T: Entity>(item: &T) -> Record {
    T::descriptor()
        .properties()
        .iter()
        .filter(|property| !property.annotations.table_ignore)
        .map(|property| {
            (
                property.table_column_name().to_owned(),
                item.read(property.name).unwrap_or_default(),
            )
        })
        .collect()
}

/// Columns come from the first record. A column's type is that of its first
/// present value across all records, text when it never has one. Keys a
/// record lacks become no-value cells; keys the first record lacks are an
/// error, as are values that cannot be converted to the column type.
pub fn from_records(records: &[Record]) -> Result<Table> {
    let Some(first) = records.first() else {
        return Ok(Table::new(Schema::new(Vec::new())));
    };
    let names: Vec<&str> = first.iter().map(|(name, _)| name.as_str()).collect();
    let schema: Schema = names
        .iter()
        .map(|name| {
            let column_type = records
                .iter()
                .filter_map(|record| lookup(record, name))
                .find_map(Value::column_type)
                .unwrap_or(ColumnType::Text);
            (*name, column_type)
        })
        .collect();

    let mut table = Table::new(schema.clone());
    for (index, record) in records.iter().enumerate() {
        if let Some((unknown, _)) = record.iter().find(|(name, _)| !names.contains(&name.as_str())) {
            return Err(RowbindError::Shape(format!(
                "record {} has column {} which the first record lacks",
                index, unknown
            )));
        }
        let mut cells = Vec::with_capacity(schema.len());
        for column in schema.columns() {
            let cell = match lookup(record, &column.name) {
                None | Some(Value::Null) => Value::Null,
                Some(value) => convert(value, column.column_type).map_err(|cause| {
                    RowbindError::Shape(format!("record {} column {}: {}", index, column.name, cause))
                })?,
            };
            cells.push(cell);
        }
        table.push_row(cells)?;
    }
    Ok(table)
}

fn lookup<'r>(record: &'r Record, name: &str) -> Option<&'r Value> {
    record.iter().find(|(key, _)| key == name).map(|(_, value)| value)
}

/// One text column, [`SCALAR_COLUMN`], holding the textual form of each item.
/// Enumerations are written by member name.
pub fn from_scalars<'a, F, I>(items: I) -> Result<Table>
where
    F: Field + 'a,
    I: IntoIterator<Item = &'a F>,
{
    let mut table = Table::new(Schema::new([Column::new(SCALAR_COLUMN, ColumnType::Text)]));
    for item in items {
        table.push_row(vec![scalar_text::<F>(item.to_value())])?;
    }
    Ok(table)
}

fn scalar_text<F: Field>(value: Value) -> Value {
    if value.is_null() {
        return Value::Null;
    }
    let member = F::TYPE
        .enum_descriptor()
        .zip(value.as_integral())
        .and_then(|(descriptor, ordinal)| descriptor.by_ordinal(i32::try_from(ordinal).ok()?));
    match member {
        Some(member) => Value::Text(member.name.to_owned()),
        None => Value::Text(value.to_string()),
    }
}
