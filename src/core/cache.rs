//! Model caching utilities for sharing weights across multiple pipelines.
//!
//! This module provides a thread-safe cache for model instances, allowing
//! multiple pipelines to share the same underlying model weights while
//! maintaining independent inference contexts.

use crate::core::error::Result;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

/// Trait implemented by model option types to generate a stable cache key.
pub trait ModelOptions {
    fn cache_key(&self) -> String;
}

// Cache stores WEAK references - models are freed when all pipelines using
// them drop.
type CacheStorage = HashMap<(TypeId, String), Box<dyn Any + Send + Sync>>;

pub struct ModelCache {
    cache: Arc<Mutex<CacheStorage>>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self {
            cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Get or create a model from the cache.
    ///
    /// If a live model with the given key already exists, a shared handle is
    /// returned. Otherwise, the loader function is called to create a new
    /// model instance.
    pub fn get_or_create<M, F>(&self, key: &str, loader: F) -> Result<Arc<M>>
    where
        M: Send + Sync + 'static,
        F: FnOnce() -> Result<M>,
    {
        let type_id = TypeId::of::<M>();
        let cache_key = (type_id, key.to_string());

        {
            let mut cache = self.cache.lock().unwrap();
            if let Some(boxed) = cache.get(&cache_key) {
                if let Some(weak) = boxed.downcast_ref::<Weak<M>>() {
                    if let Some(strong) = weak.upgrade() {
                        return Ok(strong);
                    }
                }
                // Weak ref dead, remove stale entry
                cache.remove(&cache_key);
            }
        }

        let model = Arc::new(loader()?);

        {
            let mut cache = self.cache.lock().unwrap();
            let weak: Weak<M> = Arc::downgrade(&model);
            cache.insert(cache_key, Box::new(weak));
        }

        Ok(model)
    }

    #[allow(dead_code)]
    pub fn clear(&self) {
        let mut cache = self.cache.lock().unwrap();
        cache.clear();
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        let cache = self.cache.lock().unwrap();
        cache.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        let cache = self.cache.lock().unwrap();
        cache.is_empty()
    }
}

impl Default for ModelCache {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_MODEL_CACHE: once_cell::sync::Lazy<ModelCache> =
    once_cell::sync::Lazy::new(ModelCache::new);

pub fn global_cache() -> &'static ModelCache {
    &GLOBAL_MODEL_CACHE
}
