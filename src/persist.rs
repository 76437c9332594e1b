// used for materializing query results and binding cells as parameters
use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, Params};
use tracing::debug;

use crate::datatype::{ColumnType, Value};
use crate::error::Result;
use crate::table::{Column, Row, Schema, Table};

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Bool(b) => ToSqlOutput::from(*b),
            Value::U8(n) => ToSqlOutput::from(i64::from(*n)),
            Value::I16(n) => ToSqlOutput::from(i64::from(*n)),
            Value::I32(n) => ToSqlOutput::from(i64::from(*n)),
            Value::I64(n) => ToSqlOutput::from(*n),
            Value::F32(f) => ToSqlOutput::from(f64::from(*f)),
            Value::F64(f) => ToSqlOutput::from(*f),
            // SQLite has no decimal storage class
            Value::Decimal(d) => ToSqlOutput::from(d.to_string()),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Date(d) => return d.to_sql(),
            Value::DateTime(dt) => return dt.to_sql(),
            Value::Time(t) => return t.to_sql(),
            Value::Bytes(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

impl From<ValueRef<'_>> for Value {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(n) => Value::I64(n),
            ValueRef::Real(f) => Value::F64(f),
            ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Value::Bytes(b.to_vec()),
        }
    }
}

/// Runs `sql` and materializes every row it returns. SQLite types values, not
/// columns, so each column is declared with the storage class of its first
/// present cell, or text when it has none.
pub fn read_table<P: Params>(connection: &Connection, sql: &str, params: P) -> Result<Table> {
    let mut statement = connection.prepare(sql)?;
    let names: Vec<String> = statement.column_names().into_iter().map(String::from).collect();
    let width = names.len();

    let mut cells: Vec<Vec<Value>> = Vec::new();
    let mut rows = statement.query(params)?;
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(width);
        for index in 0..width {
            values.push(Value::from(row.get_ref(index)?));
        }
        cells.push(values);
    }

    let columns = names.into_iter().enumerate().map(|(index, name)| {
        let column_type = cells
            .iter()
            .find_map(|values| values[index].column_type())
            .unwrap_or(ColumnType::Text);
        Column::new(name, column_type)
    });
    let schema = Schema::new(columns.collect::<Vec<_>>());
    let table = Table::with_rows(schema, cells.into_iter().map(Row::new))?;
    debug!(columns = width, rows = table.len(), "materialized query");
    Ok(table)
}
