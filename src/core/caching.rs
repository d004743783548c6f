use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::Cache;
use crate::core::provider::{Payload, ProvideContext, Provider, ProviderError, ProviderKey};
use crate::core::registry::PayloadDecoder;

/// Serves a provider's output from the session cache while it is fresh.
///
/// The provider key doubles as the cache key. Cache failures never reach the
/// caller: a bad entry is refetched and a failed write still returns the
/// fresh value.
pub struct CachingProvider {
    inner: Arc<dyn Provider>,
    cache: Arc<dyn Cache>,
    ttl: Duration,
    decode: PayloadDecoder,
}

impl CachingProvider {
    pub fn new(
        inner: Arc<dyn Provider>,
        cache: Arc<dyn Cache>,
        ttl: Duration,
        decode: PayloadDecoder,
    ) -> Self {
        Self {
            inner,
            cache,
            ttl,
            decode,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl Provider for CachingProvider {
    fn key(&self) -> ProviderKey {
        self.inner.key()
    }

    fn provide(&self, ctx: &ProvideContext) -> Result<Payload, ProviderError> {
        let key = self.inner.key();

        if let Some(cached) = self.cache.get_value(key.as_str()) {
            match (self.decode)(cached) {
                Ok(hit) => {
                    debug!(provider = %key, "cache hit");
                    return Ok(hit);
                }
                Err(e) => debug!(provider = %key, error = %e, "cached value unreadable, refetching"),
            }
        }

        let fresh = self.inner.provide(ctx)?;
        match fresh.to_json() {
            Ok(value) => self.cache.set_value(key.as_str(), value, self.ttl),
            Err(e) => debug!(provider = %key, error = %e, "provider output not cacheable"),
        }
        Ok(fresh)
    }
}
