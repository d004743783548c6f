use std::time::Duration;

use super::{Cache, CacheError};

/// Cache that stores nothing. Every read is a miss.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCache;

impl Cache for NullCache {
    fn get_value(&self, _key: &str) -> Option<serde_json::Value> {
        None
    }

    fn set_value(&self, _key: &str, _value: serde_json::Value, _ttl: Duration) {}

    fn delete(&self, _key: &str) {}

    fn save(&self) -> Result<(), CacheError> {
        Ok(())
    }

    fn cleanup(&self) -> Result<usize, CacheError> {
        Ok(0)
    }

    fn close(&self) -> Result<(), CacheError> {
        Ok(())
    }
}
