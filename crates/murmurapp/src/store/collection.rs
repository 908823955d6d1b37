//! Insertion-ordered, id-addressable record collection.
//!
//! Each canonical entity kind lives in one [`Collection`]: a `Vec` holding
//! records in insertion order (which is also the order they are written to
//! the durable blob) plus a position map for O(1) lookups by id.

use crate::error::{MurmurError, Result};
use crate::model::Entity;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Collection<T> {
    items: Vec<T>,
    positions: HashMap<String, usize>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            positions: HashMap::new(),
        }
    }
}

impl<T: PartialEq> PartialEq for Collection<T> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<T: Entity> Collection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a collection from stored records, keeping the first record of
    /// any repeated id. Returns the collection and the number of records dropped.
    pub fn from_records(records: Vec<T>) -> (Self, usize) {
        let mut collection = Self::new();
        let mut dropped = 0;
        for record in records {
            if collection.insert(record).is_err() {
                dropped += 1;
            }
        }
        (collection, dropped)
    }

    /// Appends a record. Fails with `AlreadyExists` if the id is taken.
    pub fn insert(&mut self, record: T) -> Result<()> {
        if self.positions.contains_key(record.id()) {
            return Err(MurmurError::already_exists(T::KIND, record.id()));
        }
        self.positions
            .insert(record.id().to_string(), self.items.len());
        self.items.push(record);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.positions.get(id).map(|&pos| &self.items[pos])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        match self.positions.get(id) {
            Some(&pos) => Some(&mut self.items[pos]),
            None => None,
        }
    }

    /// Like [`Collection::get`] but with a `NotFound` error.
    pub fn require(&self, id: &str) -> Result<&T> {
        self.get(id)
            .ok_or_else(|| MurmurError::not_found(T::KIND, id))
    }

    pub fn require_mut(&mut self, id: &str) -> Result<&mut T> {
        match self.positions.get(id) {
            Some(&pos) => Ok(&mut self.items[pos]),
            None => Err(MurmurError::not_found(T::KIND, id)),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    /// Removes a record, preserving the order of the rest.
    pub fn remove(&mut self, id: &str) -> Option<T> {
        let pos = self.positions.remove(id)?;
        let record = self.items.remove(pos);
        self.reindex_from(pos);
        Some(record)
    }

    /// Removes every record matched by `remove` and returns them in order.
    pub fn extract_where<F>(&mut self, mut remove: F) -> Vec<T>
    where
        F: FnMut(&T) -> bool,
    {
        let (removed, kept): (Vec<T>, Vec<T>) =
            std::mem::take(&mut self.items).into_iter().partition(|r| remove(r));
        self.items = kept;
        self.positions.clear();
        self.reindex_from(0);
        removed
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn reindex_from(&mut self, start: usize) {
        for (pos, record) in self.items.iter().enumerate().skip(start) {
            self.positions.insert(record.id().to_string(), pos);
        }
    }
}

impl<T: Clone> Collection<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.items.clone()
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
