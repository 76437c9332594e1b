use std::ptr;

use tracing::debug;

use crate::cache::{Matches, MetadataCache};
use crate::entity::EntityType;

/// Finds the properties of a destination type that receive a column.
#[derive(Debug, Clone, Copy)]
pub struct ColumnResolver<'c> {
    cache: &'c MetadataCache,
}

impl<'c> ColumnResolver<'c> {
    pub fn new(cache: &'c MetadataCache) -> Self {
        Self { cache }
    }

    /// Properties of `entity` fed by `column`; possibly none, possibly
    /// several.
    ///
    /// A property whose name equals the column ignoring case comes first.
    /// After it come the properties that list the column, in exact case,
    /// among their explicit column names. Ignored properties never match.
    /// Neither does a property whose own name is claimed as a column by a
    /// property already cached for the type.
    pub fn resolve(&self, column: &str, entity: EntityType) -> Matches {
        if let Some(matches) = self.cache.resolution(entity, column) {
            return matches;
        }

        let descriptor = entity.descriptor();
        let mut matches = Vec::new();

        let by_name = descriptor.property_ignore_case(column);
        if let Some(property) = by_name.filter(|p| !p.annotations.ignore) {
            matches.push(property);
            self.cache.record(entity, property, property.annotations);
        }

        for property in descriptor.properties() {
            if by_name.is_some_and(|named| ptr::eq(named, property)) {
                continue;
            }
            if self.cache.has_column_mapping(entity, property.name) || property.annotations.ignore {
                continue;
            }
            if !property.annotations.maps_column(column) {
                continue;
            }
            matches.push(property);
            // only the name that matched; the property's other explicit
            // names must not shadow siblings named after them
            self.cache.record(entity, property, property.annotations.only_column(column));
        }

        debug!(
            entity = entity.name(),
            column,
            properties = matches.len(),
            "resolved column"
        );
        self.cache.remember_resolution(entity, column, matches)
    }
}
