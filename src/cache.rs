//! Process-scoped store of resolved mapping metadata.
//!
//! The cache follows the keeper pattern: a per-type collection of
//! `(property, annotations)` pairs that only ever grows. The first recorded
//! entry for a property is kept for the life of the cache; later attempts to
//! record the same property are no-ops. Collections are small (a type has a
//! few dozen properties at most) so queries are linear scans.

use core::hash::BuildHasherDefault;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use lazy_static::lazy_static;
use seahash::SeaHasher;
use tracing::trace;

use crate::entity::{Annotations, EntityType, EnumPair, PropertyDescriptor, same_name};

pub type CacheHasher = BuildHasherDefault<SeaHasher>;

pub type Matches = Arc<[&'static PropertyDescriptor]>;

lazy_static! {
    static ref SHARED: Arc<MetadataCache> = Arc::new(MetadataCache::new());
}

#[derive(Debug, Clone, Copy)]
pub struct CachedProperty {
    pub property: &'static PropertyDescriptor,
    pub annotations: Annotations,
}

#[derive(Debug, Default)]
struct TypeEntry {
    properties: RwLock<Vec<CachedProperty>>,
    // column name -> the resolution computed the first time it was seen
    resolved: RwLock<HashMap<String, Matches, CacheHasher>>,
}

#[derive(Debug, Default)]
pub struct MetadataCache {
    types: RwLock<HashMap<TypeId, Arc<TypeEntry>, CacheHasher>>,
}

// Entries are append-only, so a writer that panicked cannot have left a
// half-made entry behind and the guard is still usable.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}
fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The instance shared by every mapper that does not bring its own.
    pub fn shared() -> Arc<MetadataCache> {
        Arc::clone(&SHARED)
    }

    fn entry(&self, entity: EntityType) -> Option<Arc<TypeEntry>> {
        read(&self.types).get(&entity.id()).cloned()
    }

    fn entry_or_insert(&self, entity: EntityType) -> Arc<TypeEntry> {
        if let Some(entry) = self.entry(entity) {
            return entry;
        }
        let mut types = write(&self.types);
        Arc::clone(types.entry(entity.id()).or_default())
    }

    fn any_property(&self, entity: EntityType, predicate: impl Fn(&CachedProperty) -> bool) -> bool {
        let Some(entry) = self.entry(entity) else {
            return false;
        };
        let properties = read(&entry.properties);
        properties.iter().any(predicate)
    }

    /// Whether a property named exactly `name` has been cached for the type.
    pub fn has_property(&self, entity: EntityType, name: &str) -> bool {
        self.any_property(entity, |cached| cached.property.name == name)
    }

    /// Whether some cached property of the type explicitly maps `column`,
    /// ignoring case.
    pub fn has_column_mapping(&self, entity: EntityType, column: &str) -> bool {
        self.any_property(entity, |cached| cached.annotations.maps_column_ignore_case(column))
    }

    pub fn has_enum_map(&self, entity: EntityType, property: &str) -> bool {
        self.any_property(entity, |cached| {
            cached.property.name == property && !cached.annotations.enum_map.is_empty()
        })
    }

    /// Registers a property's annotations. Returns `false`, and changes
    /// nothing, when the property was already recorded.
    pub fn record(
        &self,
        entity: EntityType,
        property: &'static PropertyDescriptor,
        annotations: Annotations,
    ) -> bool {
        let entry = self.entry_or_insert(entity);
        let mut properties = write(&entry.properties);
        if properties.iter().any(|cached| cached.property.name == property.name) {
            return false;
        }
        properties.push(CachedProperty { property, annotations });
        trace!(entity = entity.name(), property = property.name, "cached property");
        true
    }

    /// Cached properties whose name equals `column` ignoring case, or that
    /// explicitly map `column`.
    pub fn matching_properties(&self, column: &str, entity: EntityType) -> Vec<&'static PropertyDescriptor> {
        let Some(entry) = self.entry(entity) else {
            return Vec::new();
        };
        let properties = read(&entry.properties);
        properties
            .iter()
            .filter(|cached| same_name(cached.property.name, column) || cached.annotations.maps_column(column))
            .map(|cached| cached.property)
            .collect()
    }

    pub fn enum_map(&self, entity: EntityType, property: &str) -> Option<&'static [EnumPair]> {
        let entry = self.entry(entity)?;
        let properties = read(&entry.properties);
        properties
            .iter()
            .find(|cached| cached.property.name == property && !cached.annotations.enum_map.is_empty())
            .map(|cached| cached.annotations.enum_map)
    }

    /// The properties `column` resolved to the first time it was seen for
    /// the type.
    pub fn resolution(&self, entity: EntityType, column: &str) -> Option<Matches> {
        let entry = self.entry(entity)?;
        let resolved = read(&entry.resolved);
        resolved.get(column).cloned()
    }

    /// Keeps the resolution of `column` unless another one got there first,
    /// and returns whichever is kept.
    pub fn remember_resolution(
        &self,
        entity: EntityType,
        column: &str,
        matches: Vec<&'static PropertyDescriptor>,
    ) -> Matches {
        let entry = self.entry_or_insert(entity);
        let mut resolved = write(&entry.resolved);
        Arc::clone(
            resolved
                .entry(column.to_owned())
                .or_insert_with(|| Arc::from(matches)),
        )
    }

    /// Number of types with at least one cached property or resolution.
    pub fn type_count(&self) -> usize {
        read(&self.types).len()
    }

    /// Number of cached properties of one type.
    pub fn property_count(&self, entity: EntityType) -> usize {
        let Some(entry) = self.entry(entity) else {
            return 0;
        };
        let properties = read(&entry.properties);
        properties.len()
    }
}
