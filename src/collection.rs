use std::ops::{Deref, DerefMut};

use crate::entity::Entity;
use crate::error::Result;
use crate::populate::Mapper;
use crate::table::Table;

/// An owned list of entities that can be (re)loaded from a table.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityCollection<T> {
    entities: Vec<T>,
}

impl<T> Default for EntityCollection<T> {
    fn default() -> Self {
        Self { entities: Vec::new() }
    }
}

impl<T: Entity> EntityCollection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the contents with one entity per row of `table`. An empty
    /// table leaves the collection as it is, and so does a failure.
    pub fn load(&mut self, mapper: &Mapper, table: &Table) -> Result<()> {
        if table.is_empty() {
            return Ok(());
        }
        self.entities = mapper.populate_many(table)?;
        Ok(())
    }

    pub fn push(&mut self, entity: T) {
        self.entities.push(entity);
    }

    /// Drops every entity matching `predicate` and returns how many went.
    pub fn remove_all(&mut self, mut predicate: impl FnMut(&T) -> bool) -> usize {
        let before = self.entities.len();
        self.entities.retain(|entity| !predicate(entity));
        before - self.entities.len()
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }

    pub fn into_vec(self) -> Vec<T> {
        self.entities
    }
}

impl<T> Deref for EntityCollection<T> {
    type Target = [T];
    fn deref(&self) -> &Self::Target {
        &self.entities
    }
}
impl<T> DerefMut for EntityCollection<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.entities
    }
}

impl<T> FromIterator<T> for EntityCollection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            entities: iter.into_iter().collect(),
        }
    }
}
impl<T> Extend<T> for EntityCollection<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.entities.extend(iter);
    }
}
impl<T> IntoIterator for EntityCollection<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;
    fn into_iter(self) -> Self::IntoIter {
        self.entities.into_iter()
    }
}
impl<'a, T> IntoIterator for &'a EntityCollection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.entities.iter()
    }
}
