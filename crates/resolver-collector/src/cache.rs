//! `RepositoryCache`: a concurrent, opaque-value cache attached to a
//! resolution session (spec §5 "Shared resources").
//!
//! Values are `Arc<dyn Any>` so callers on either side of the API can store
//! whatever they like (parsed descriptors, resolved version lists, ...)
//! without this crate knowing their types. Callers must not mutate a value
//! after insertion; clone before mutating.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

#[derive(Default)]
pub struct RepositoryCache {
    entries: RwLock<HashMap<String, Arc<dyn Any + Send + Sync>>>,
}

impl RepositoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn Any + Send + Sync>> {
        self.entries.read().unwrap().get(key).cloned()
    }

    pub fn put(&self, key: impl Into<String>, value: Arc<dyn Any + Send + Sync>) {
        self.entries.write().unwrap().insert(key.into(), value);
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
