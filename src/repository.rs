/// Typed in-memory repository
///
/// Items are indexed by a key the caller derives from each item with a
/// function supplied at construction. The key is computed once on insert;
/// callers must not change the key fields of a stored item through
/// `get_mut`.

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicateKey;

pub struct Repository<K, T> {
    items: HashMap<K, T>,
    key_of: fn(&T) -> K,
}

impl<K, T> Repository<K, T>
where
    K: Eq + Hash,
{
    pub fn new(key_of: fn(&T) -> K) -> Self {
        Self {
            items: HashMap::new(),
            key_of,
        }
    }

    /// Insert `item`, refusing to replace an item with the same key.
    pub fn insert(&mut self, item: T) -> Result<&T, DuplicateKey> {
        let key = (self.key_of)(&item);
        match self.items.entry(key) {
            std::collections::hash_map::Entry::Occupied(_) => Err(DuplicateKey),
            std::collections::hash_map::Entry::Vacant(slot) => Ok(slot.insert(item)),
        }
    }

    pub fn get(&self, key: &K) -> Option<&T> {
        self.items.get(key)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut T> {
        self.items.get_mut(key)
    }

    /// First item matching `predicate`, for lookups on non-key fields.
    pub fn find<F>(&self, predicate: F) -> Option<&T>
    where
        F: Fn(&T) -> bool,
    {
        self.items.values().find(|item| predicate(*item))
    }

    pub fn remove(&mut self, key: &K) -> Option<T> {
        self.items.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
