//! Named partitions of cached responses.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::request::{CacheKey, FetchRequest, FetchResponse};

/// A single named store. Writers to the same key: last one wins.
#[derive(Debug)]
pub struct CacheStore {
    name: String,
    entries: RwLock<HashMap<CacheKey, FetchResponse>>,
}

impl CacheStore {
    fn new(name: &str) -> Self {
        CacheStore {
            name: name.to_string(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn match_key(&self, key: &CacheKey) -> Option<FetchResponse> {
        self.entries
            .read()
            .expect("cache store lock poisoned")
            .get(key)
            .cloned()
    }

    pub fn match_request(&self, request: &FetchRequest) -> Option<FetchResponse> {
        self.match_key(&request.key())
    }

    pub fn put(&self, key: CacheKey, response: FetchResponse) {
        self.entries
            .write()
            .expect("cache store lock poisoned")
            .insert(key, response);
    }

    pub fn delete(&self, key: &CacheKey) -> bool {
        self.entries
            .write()
            .expect("cache store lock poisoned")
            .remove(key)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("cache store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The registry of stores, the unit of bulk invalidation.
#[derive(Debug, Default)]
pub struct CacheStorage {
    stores: RwLock<HashMap<String, Arc<CacheStore>>>,
}

impl CacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a store, creating it when missing.
    pub fn open(&self, name: &str) -> Arc<CacheStore> {
        if let Some(store) = self
            .stores
            .read()
            .expect("cache storage lock poisoned")
            .get(name)
        {
            return store.clone();
        }
        self.stores
            .write()
            .expect("cache storage lock poisoned")
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(CacheStore::new(name)))
            .clone()
    }

    pub fn has(&self, name: &str) -> bool {
        self.stores
            .read()
            .expect("cache storage lock poisoned")
            .contains_key(name)
    }

    /// Store names, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .stores
            .read()
            .expect("cache storage lock poisoned")
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn delete(&self, name: &str) -> bool {
        self.stores
            .write()
            .expect("cache storage lock poisoned")
            .remove(name)
            .is_some()
    }
}
