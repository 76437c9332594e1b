use thiserror::Error;

use crate::datatype::{ColumnType, PropertyType, Value};

/// No member of an enumeration matched a raw cell, whether by ordinal,
/// value map, member name or alias.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("The value '{value}' is not contained in {enum_type}")]
pub struct EnumResolutionError {
    pub value: String,
    pub enum_type: &'static str,
}

impl EnumResolutionError {
    pub fn new(value: impl Into<String>, enum_type: &'static str) -> Self {
        Self { value: value.into(), enum_type }
    }
}

/// Why a raw cell could not be turned into the destination type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoercionFailure {
    #[error("value {value} is out of range for {target}")]
    Overflow { value: String, target: &'static str },
    #[error("cannot parse '{text}' as {target}")]
    Parse { text: String, target: &'static str },
    #[error("no conversion from {from} to {target}")]
    Unsupported { from: &'static str, target: &'static str },
    #[error(transparent)]
    Enum(#[from] EnumResolutionError),
}

/// A single cell could not be coerced to its destination property.
#[derive(Error, Debug, Clone)]
#[error("Type conversion failed for property {property} ({property_type}) from value {value}")]
pub struct ConversionError {
    pub property: &'static str,
    pub property_type: PropertyType,
    pub value: Value,
    #[source]
    pub cause: CoercionFailure,
}

/// A conversion failure seen from the table: which column fed the property and
/// what the cell held.
#[derive(Error, Debug, Clone)]
#[error(
    "Property population failed! Property Name: {property}, Property Type: {property_type}, Column Name: {column}, Column Type: {column_type}"
)]
pub struct PopulationError {
    pub property: &'static str,
    pub property_type: PropertyType,
    pub column: String,
    pub column_type: ColumnType,
    pub value: Value,
    /// Index of the offending row in bulk population.
    pub row: Option<usize>,
    #[source]
    pub source: ConversionError,
}

#[derive(Error, Debug)]
pub enum RowbindError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Default (parameterless) constructor does not exist for type: {entity}")]
    Configuration { entity: &'static str },
    #[error(transparent)]
    Population(#[from] PopulationError),
    #[error("Error while populating entity from column {column}: {message}")]
    Column {
        column: String,
        row: Option<usize>,
        message: String,
    },
    #[error("Population cancelled")]
    Cancelled,
    #[error("Table shape error: {0}")]
    Shape(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl RowbindError {
    /// Attributes a population failure to a row of a bulk operation.
    pub fn at_row(self, index: usize) -> Self {
        match self {
            Self::Population(mut error) => {
                error.row = Some(index);
                Self::Population(error)
            }
            Self::Column { column, message, .. } => Self::Column {
                column,
                row: Some(index),
                message,
            },
            other => other,
        }
    }

    /// The row a population failure belongs to, when known.
    pub fn row(&self) -> Option<usize> {
        match self {
            Self::Population(error) => error.row,
            Self::Column { row, .. } => *row,
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, RowbindError>;

// Helper conversions
impl From<rusqlite::Error> for RowbindError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Persistence(e.to_string())
    }
}
impl From<config::ConfigError> for RowbindError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}
