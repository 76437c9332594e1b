//! Row and table population.
//!
//! A [`Mapper`] walks the columns of a schema in order. For every column it
//! asks the [`ColumnResolver`] which properties receive the cell, has the
//! [`Coercer`] turn the cell into each property's type and writes the result
//! onto the entity. Tables are populated one row per task on a bounded pool of
//! worker threads, and the entities come back in row order.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::MetadataCache;
use crate::coerce::Coercer;
use crate::entity::{Entity, EntityType};
use crate::error::{PopulationError, Result, RowbindError};
use crate::pool::{CancelToken, run_indexed};
use crate::resolve::ColumnResolver;
use crate::settings::MapperSettings;
use crate::table::{ResultSet, Row, Schema, Table};

#[derive(Debug, Clone)]
pub struct Mapper {
    cache: Arc<MetadataCache>,
    settings: MapperSettings,
}

impl Default for Mapper {
    fn default() -> Self {
        Self::new(MapperSettings::default())
    }
}

impl Mapper {
    /// A mapper on the process-wide metadata cache.
    pub fn new(settings: MapperSettings) -> Self {
        Self::with_cache(MetadataCache::shared(), settings)
    }
    pub fn with_cache(cache: Arc<MetadataCache>, settings: MapperSettings) -> Self {
        Self { cache, settings }
    }
    pub fn cache(&self) -> &Arc<MetadataCache> {
        &self.cache
    }
    pub fn settings(&self) -> MapperSettings {
        self.settings
    }

    /// A fresh entity from the type's parameterless constructor.
    pub fn new_entity<T: Entity>() -> Result<T> {
        T::construct().ok_or(RowbindError::Configuration {
            entity: T::descriptor().name,
        })
    }

    /// Writes every mapped cell of `row` onto `entity`. Unmatched columns are
    /// skipped; on error the entity may be partially written.
    pub fn populate_one<T: Entity>(&self, entity: &mut T, row: &Row, schema: &Schema) -> Result<()> {
        self.populate_row(entity, row, schema, None)
    }

    fn populate_row<T: Entity>(
        &self,
        entity: &mut T,
        row: &Row,
        schema: &Schema,
        cancel: Option<&CancelToken>,
    ) -> Result<()> {
        let entity_type = EntityType::of::<T>();
        let resolver = ColumnResolver::new(&self.cache);
        let coercer = Coercer::new(&self.cache);

        for (index, column) in schema.columns().iter().enumerate() {
            if cancel.is_some_and(CancelToken::is_cancelled) {
                return Err(RowbindError::Cancelled);
            }
            let properties = resolver.resolve(&column.name, entity_type);
            if properties.is_empty() {
                continue;
            }
            let Some(raw) = row.get(index) else {
                return Err(RowbindError::Column {
                    column: column.name.clone(),
                    row: None,
                    message: format!("row has {} cells, no cell at position {}", row.len(), index),
                });
            };
            for &property in properties.iter() {
                let value = coercer
                    .coerce(raw, entity_type, property)
                    .map_err(|source| PopulationError {
                        property: property.name,
                        property_type: property.property_type,
                        column: column.name.clone(),
                        column_type: column.column_type,
                        value: raw.clone(),
                        row: None,
                        source,
                    })?;
                entity
                    .assign(property.name, value)
                    .map_err(|rejected| RowbindError::Column {
                        column: column.name.clone(),
                        row: None,
                        message: format!(
                            "property {} of {} does not accept {} value {}",
                            property.name,
                            entity_type.name(),
                            rejected.type_name(),
                            rejected
                        ),
                    })?;
            }
        }
        Ok(())
    }

    /// Builds one entity from `row`.
    pub fn to_entity<T: Entity>(&self, row: &Row, schema: &Schema) -> Result<T> {
        let mut entity = Self::new_entity::<T>()?;
        self.populate_one(&mut entity, row, schema)?;
        Ok(entity)
    }

    /// Builds an entity from the first row, `None` for an empty table.
    pub fn first_entity<T: Entity>(&self, table: &Table) -> Result<Option<T>> {
        self.entity_at(table, 0)
    }

    /// Builds an entity from row `index`, `None` when there is no such row.
    pub fn entity_at<T: Entity>(&self, table: &Table, index: usize) -> Result<Option<T>> {
        table
            .row(index)
            .map(|row| self.to_entity(row, table.schema()).map_err(|e| e.at_row(index)))
            .transpose()
    }

    /// Populates an existing entity from row `index`. Returns `false`, and
    /// leaves the entity alone, when there is no such row.
    pub fn populate_from_table<T: Entity>(&self, entity: &mut T, table: &Table, index: usize) -> Result<bool> {
        let Some(row) = table.row(index) else {
            return Ok(false);
        };
        self.populate_one(entity, row, table.schema())
            .map_err(|e| e.at_row(index))?;
        Ok(true)
    }

    /// One entity per row, in row order. The first failing row (lowest index)
    /// fails the whole call.
    pub fn populate_many<T: Entity>(&self, table: &Table) -> Result<Vec<T>> {
        self.populate_many_with_cancel(table, &CancelToken::new())
    }

    /// Like [`populate_many`](Self::populate_many); once `cancel` is set no
    /// further row is started, rows in flight stop between columns and the
    /// call fails with [`RowbindError::Cancelled`].
    pub fn populate_many_with_cancel<T: Entity>(&self, table: &Table, cancel: &CancelToken) -> Result<Vec<T>> {
        Self::new_entity::<T>()?;
        debug!(
            entity = T::descriptor().name,
            rows = table.len(),
            max_workers = self.settings.max_workers,
            "populating table"
        );

        // stops handing out rows after a failure
        let halt = CancelToken::new();
        let outcomes = run_indexed(table.len(), self.settings.max_workers, &halt, |index| {
            let outcome = self.populate_indexed::<T>(table, index, Some(cancel));
            if outcome.is_err() {
                halt.cancel();
            }
            outcome
        });

        let slots = ordered(table.len(), outcomes);
        if cancel.is_cancelled() {
            debug!(entity = T::descriptor().name, "table population cancelled");
            return Err(RowbindError::Cancelled);
        }
        let mut entities = Vec::with_capacity(table.len());
        for slot in slots {
            match slot {
                Some(Ok(entity)) => entities.push(entity),
                Some(Err(error)) => return Err(error),
                None => return Err(RowbindError::Cancelled),
            }
        }
        debug!(entity = T::descriptor().name, rows = entities.len(), "populated table");
        Ok(entities)
    }

    /// One outcome per row, in row order, so that a bad row does not hide the
    /// others.
    pub fn populate_each<T: Entity>(&self, table: &Table) -> Result<Vec<Result<T>>> {
        Self::new_entity::<T>()?;
        let never = CancelToken::new();
        let outcomes = run_indexed(table.len(), self.settings.max_workers, &never, |index| {
            self.populate_indexed::<T>(table, index, None)
        });
        Ok(ordered(table.len(), outcomes)
            .into_iter()
            .map(|slot| slot.unwrap_or(Err(RowbindError::Cancelled)))
            .collect())
    }

    fn populate_indexed<T: Entity>(&self, table: &Table, index: usize, cancel: Option<&CancelToken>) -> Result<T> {
        let Some(row) = table.row(index) else {
            return Err(RowbindError::Shape(format!("table has no row {}", index)));
        };
        let mut entity = Self::new_entity::<T>()?;
        match self.populate_row(&mut entity, row, table.schema(), cancel) {
            Ok(()) => Ok(entity),
            Err(RowbindError::Cancelled) => Err(RowbindError::Cancelled),
            Err(error) => {
                let error = error.at_row(index);
                warn!(entity = T::descriptor().name, row = index, %error, "row population failed");
                Err(error)
            }
        }
    }
}

fn ordered<R>(tasks: usize, outcomes: Vec<(usize, R)>) -> Vec<Option<R>> {
    let mut slots: Vec<Option<R>> = std::iter::repeat_with(|| None).take(tasks).collect();
    for (index, outcome) in outcomes {
        slots[index] = Some(outcome);
    }
    slots
}

impl ResultSet {
    /// One entity per row of table `index`.
    pub fn to_entities<T: Entity>(&self, mapper: &Mapper, index: usize) -> Result<Vec<T>> {
        let table = self
            .table(index)
            .ok_or_else(|| RowbindError::Shape(format!("result set has no table {}", index)))?;
        mapper.populate_many(table)
    }
}
