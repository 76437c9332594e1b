//! The in-memory tabular result consumed by population and produced for
//! outbound parameters.

use std::sync::Arc;

use crate::datatype::{ColumnType, Value};
use crate::error::{Result, RowbindError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Ordered columns shared by every row of a table. Cloning is cheap and never
/// copies the columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Arc<[Column]>,
}

impl Schema {
    pub fn new(columns: impl IntoIterator<Item = Column>) -> Self {
        Self {
            columns: columns.into_iter().collect(),
        }
    }
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }
    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }
    pub fn len(&self) -> usize {
        self.columns.len()
    }
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
    /// Position of the first column named exactly `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}

impl<S: Into<String>> FromIterator<(S, ColumnType)> for Schema {
    fn from_iter<I: IntoIterator<Item = (S, ColumnType)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(name, t)| Column::new(name, t)))
    }
}

/// Cells aligned with a schema; `Value::Null` marks a missing value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    cells: Vec<Value>,
}

impl Row {
    pub fn new(cells: Vec<Value>) -> Self {
        Self { cells }
    }
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.cells.get(index)
    }
    pub fn cells(&self) -> &[Value] {
        &self.cells
    }
    pub fn len(&self) -> usize {
        self.cells.len()
    }
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl From<Vec<Value>> for Row {
    fn from(cells: Vec<Value>) -> Self {
        Self::new(cells)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    schema: Schema,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    /// Fails with a shape error when a row's width differs from the schema.
    pub fn with_rows(schema: Schema, rows: impl IntoIterator<Item = Row>) -> Result<Self> {
        let mut table = Self::new(schema);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn push_row(&mut self, row: impl Into<Row>) -> Result<()> {
        let row = row.into();
        if row.len() != self.schema.len() {
            return Err(RowbindError::Shape(format!(
                "row {} has {} cells but the schema has {} columns",
                self.rows.len(),
                row.len(),
                self.schema.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }
    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }
    pub fn len(&self) -> usize {
        self.rows.len()
    }
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
    /// The cell of `row` under the column named exactly `column`.
    pub fn cell(&self, row: usize, column: &str) -> Option<&Value> {
        self.row(row)?.get(self.schema.index_of(column)?)
    }
}

/// Several tables returned by one execution, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    tables: Vec<Table>,
}

impl ResultSet {
    pub fn new(tables: Vec<Table>) -> Self {
        Self { tables }
    }
    pub fn push(&mut self, table: Table) {
        self.tables.push(table);
    }
    pub fn table(&self, index: usize) -> Option<&Table> {
        self.tables.get(index)
    }
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }
    pub fn len(&self) -> usize {
        self.tables.len()
    }
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
