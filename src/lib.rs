//! Rowbind – attribute-driven mapping between tabular results and typed entities.
//!
//! Rowbind sits on top of a data-access layer that produces in-memory tables
//! (an ordered schema of named, typed columns plus rows of cells) and turns
//! those rows into strongly-typed entities:
//! * An [`Entity`] is a struct declared with [`entity!`], which records a static
//!   mapping table of its properties and their annotations.
//! * A [`MappedEnum`] is an enumeration declared with [`mapped_enum!`], with
//!   explicit ordinals and optional string aliases.
//! * A [`populate::Mapper`] fills entities from a [`table::Table`], one row at a
//!   time or a whole table on a bounded worker pool.
//!
//! Resolved metadata is kept by a [`cache::MetadataCache`], an append-only
//! keeper where the first registration of a property wins, so that repeated
//! population of the same type only pays for resolution once.
//!
//! ## Modules
//! * [`entity`] – Static descriptors, the [`entity!`] and [`mapped_enum!`] macros.
//! * [`datatype`] – The cell [`Value`] model, column types and the [`Field`] trait.
//! * [`cache`] – Process-scoped metadata cache.
//! * [`resolve`] – Which properties receive a column.
//! * [`coerce`] – Converting cells to property types, enumerations included.
//! * [`populate`] – Row and table population.
//! * [`outbound`] – Tables built from entities, records or scalars.
//! * [`persist`] – SQLite adapter: materializing queries and binding cells.
//! * [`settings`] – Mapper settings read with the `config` crate.
//!
//! ## Column Matching
//! A column feeds the property whose name equals it ignoring case, plus every
//! property listing it among its explicit `#[column(..)]` names (exact case).
//! Properties marked `#[ignore]` are never written. Columns matching nothing are
//! skipped silently, and no-value cells leave the default in place.
//!
//! ## Quick Start
//! ```
//! use rowbind::{entity, mapped_enum, ColumnType, Mapper, Row, Schema, Table, Value};
//!
//! mapped_enum! {
//!     #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//!     pub enum State { Active = 1, Inactive = 2 }
//! }
//!
//! entity! {
//!     #[derive(Debug, Default, PartialEq)]
//!     pub struct Account {
//!         pub id: i32,
//!         #[column("Status")]
//!         #[enum_map("A" => "Active", "I" => "Inactive")]
//!         pub state: State,
//!     }
//! }
//!
//! let schema: Schema = [("ID", ColumnType::I32), ("Status", ColumnType::Text)].into_iter().collect();
//! let table = Table::with_rows(schema, [Row::new(vec![Value::I32(7), Value::from("A")])]).unwrap();
//! let accounts: Vec<Account> = Mapper::default().populate_many(&table).unwrap();
//! assert_eq!(accounts, vec![Account { id: 7, state: State::Active }]);
//! ```
//!
//! ## License
//! Dual licensed under Apache-2.0 and MIT.

pub mod cache;
pub mod coerce;
pub mod collection;
pub mod datatype;
pub mod entity;
pub mod error;
pub mod outbound;
pub mod persist;
pub mod pool;
pub mod populate;
pub mod resolve;
pub mod settings;
pub mod table;

pub use cache::MetadataCache;
pub use collection::EntityCollection;
pub use datatype::{ColumnType, Field, PropertyKind, PropertyType, Value};
pub use entity::{
    Annotations, Entity, EntityDescriptor, EntityType, EnumDescriptor, EnumMember, MappedEnum,
    PropertyDescriptor,
};
pub use error::{
    CoercionFailure, ConversionError, EnumResolutionError, PopulationError, Result, RowbindError,
};
pub use pool::CancelToken;
pub use populate::Mapper;
pub use settings::MapperSettings;
pub use table::{Column, ResultSet, Row, Schema, Table};
