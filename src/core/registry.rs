use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::cache::Cache;
use crate::config::Reader;
use crate::core::caching::CachingProvider;
use crate::core::component::Component;
use crate::core::provider::{Payload, Provider, ProviderData, payload};
use crate::models::ClaudeSession;

/// Rebuilds a provider's concrete payload type from cached JSON.
pub type PayloadDecoder = fn(serde_json::Value) -> Result<Payload, serde_json::Error>;

pub fn decode_as<T>(value: serde_json::Value) -> Result<Payload, serde_json::Error>
where
    T: DeserializeOwned + ProviderData,
{
    Ok(payload(serde_json::from_value::<T>(value)?))
}

/// What a provider factory hands back: the provider and how long its output may be cached.
pub struct ProviderSpec {
    pub provider: Arc<dyn Provider>,
    pub cache_ttl: Duration,
}

impl ProviderSpec {
    pub fn new(provider: impl Provider + 'static, cache_ttl: Duration) -> Self {
        Self {
            provider: Arc::new(provider),
            cache_ttl,
        }
    }

    pub fn uncached(provider: impl Provider + 'static) -> Self {
        Self::new(provider, Duration::ZERO)
    }
}

pub type ProviderFactory =
    Arc<dyn Fn(&Reader, &Arc<ClaudeSession>) -> Option<ProviderSpec> + Send + Sync>;
pub type ComponentFactory = Arc<dyn Fn(&Reader) -> Box<dyn Component> + Send + Sync>;

#[derive(Clone)]
struct ProviderEntry {
    factory: ProviderFactory,
    decode: PayloadDecoder,
}

/// Name-to-factory tables for providers and components.
///
/// Filled once at startup and read afterwards. Registering a name twice
/// replaces the earlier factory.
#[derive(Default)]
pub struct Registry {
    providers: RwLock<HashMap<String, ProviderEntry>>,
    components: RwLock<HashMap<String, ComponentFactory>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in provider and component.
    pub fn builtin() -> Self {
        let registry = Self::new();
        crate::providers::register_all(&registry);
        crate::components::register_all(&registry);
        registry
    }

    pub fn register_provider<F>(&self, name: &str, factory: F, decode: PayloadDecoder)
    where
        F: Fn(&Reader, &Arc<ClaudeSession>) -> Option<ProviderSpec> + Send + Sync + 'static,
    {
        let entry = ProviderEntry {
            factory: Arc::new(factory),
            decode,
        };
        let mut providers = self.providers.write().unwrap_or_else(|p| p.into_inner());
        if providers.insert(name.to_string(), entry).is_some() {
            debug!(provider = name, "provider registration replaced");
        }
    }

    pub fn register_component<F>(&self, name: &str, factory: F)
    where
        F: Fn(&Reader) -> Box<dyn Component> + Send + Sync + 'static,
    {
        let mut components = self.components.write().unwrap_or_else(|p| p.into_inner());
        if components.insert(name.to_string(), Arc::new(factory)).is_some() {
            debug!(component = name, "component registration replaced");
        }
    }

    pub fn has_provider(&self, name: &str) -> bool {
        let providers = self.providers.read().unwrap_or_else(|p| p.into_inner());
        providers.contains_key(name)
    }

    pub fn has_component(&self, name: &str) -> bool {
        let components = self.components.read().unwrap_or_else(|p| p.into_inner());
        components.contains_key(name)
    }

    /// Registered component names, sorted.
    pub fn component_names(&self) -> Vec<String> {
        let components = self.components.read().unwrap_or_else(|p| p.into_inner());
        let mut names: Vec<String> = components.keys().cloned().collect();
        names.sort();
        names
    }

    /// Build the named provider. Wrapped in a [`CachingProvider`] when the
    /// factory asks for a TTL and a cache is available.
    ///
    /// `None` when the name is unknown or the factory declines.
    pub fn create_provider(
        &self,
        name: &str,
        config: &Reader,
        session: &Arc<ClaudeSession>,
        cache: Option<&Arc<dyn Cache>>,
    ) -> Option<Arc<dyn Provider>> {
        // Clone out of the lock so factories never run while it is held.
        let entry = {
            let providers = self.providers.read().unwrap_or_else(|p| p.into_inner());
            providers.get(name)?.clone()
        };
        let spec = (entry.factory)(config, session)?;

        match cache {
            Some(cache) if !spec.cache_ttl.is_zero() => Some(Arc::new(CachingProvider::new(
                spec.provider,
                Arc::clone(cache),
                spec.cache_ttl,
                entry.decode,
            ))),
            _ => Some(spec.provider),
        }
    }

    pub fn create_component(&self, name: &str, config: &Reader) -> Option<Box<dyn Component>> {
        let factory = {
            let components = self.components.read().unwrap_or_else(|p| p.into_inner());
            Arc::clone(components.get(name)?)
        };
        Some(factory(config))
    }
}
