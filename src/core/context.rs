use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::config::Reader;
use crate::core::provider::{Payload, ProviderError, ProviderKey};

#[derive(Default)]
struct Slots {
    data: HashMap<ProviderKey, Payload>,
    errors: HashMap<ProviderKey, Arc<ProviderError>>,
}

/// Provider outputs for a single render, keyed by [`ProviderKey`].
///
/// Written while providers report in, read while components render. A lookup
/// with the wrong type is indistinguishable from a missing key.
pub struct RenderContext {
    slots: RwLock<Slots>,
    config: Arc<Reader>,
}

impl RenderContext {
    pub fn new(config: Arc<Reader>) -> Self {
        Self {
            slots: RwLock::new(Slots::default()),
            config,
        }
    }

    pub fn config(&self) -> &Reader {
        &self.config
    }

    pub fn set(&self, key: ProviderKey, value: Payload) {
        let mut slots = self.slots.write().unwrap_or_else(|p| p.into_inner());
        slots.data.insert(key, value);
    }

    pub fn set_error(&self, key: ProviderKey, err: ProviderError) {
        let mut slots = self.slots.write().unwrap_or_else(|p| p.into_inner());
        slots.errors.insert(key, Arc::new(err));
    }

    /// Typed lookup. Returns `None` if the key is absent or holds another type.
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        let value = self.raw(key)?;
        value.into_any().downcast::<T>().ok()
    }

    pub fn raw(&self, key: &str) -> Option<Payload> {
        let slots = self.slots.read().unwrap_or_else(|p| p.into_inner());
        slots.data.get(&ProviderKey::new(key)).cloned()
    }

    pub fn error(&self, key: &str) -> Option<Arc<ProviderError>> {
        let slots = self.slots.read().unwrap_or_else(|p| p.into_inner());
        slots.errors.get(&ProviderKey::new(key)).cloned()
    }

    pub fn has(&self, key: &str) -> bool {
        let slots = self.slots.read().unwrap_or_else(|p| p.into_inner());
        slots.data.contains_key(&ProviderKey::new(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::provider::payload;
    use serde::Serialize;

    #[derive(Debug, Serialize, PartialEq)]
    struct Branch(String);

    #[derive(Debug, Serialize)]
    struct Count(u64);

    fn ctx() -> RenderContext {
        RenderContext::new(Arc::new(Reader::empty()))
    }

    #[test]
    fn get_returns_stored_value() {
        let ctx = ctx();
        ctx.set("git".into(), payload(Branch("main".into())));
        let got = ctx.get::<Branch>("git").unwrap();
        assert_eq!(*got, Branch("main".into()));
    }

    #[test]
    fn wrong_type_behaves_like_missing() {
        let ctx = ctx();
        ctx.set("git".into(), payload(Branch("main".into())));
        assert!(ctx.get::<Count>("git").is_none());
        assert!(ctx.get::<String>("git").is_none());
        assert!(ctx.get::<Branch>("tokenusage").is_none());
    }

    #[test]
    fn set_overwrites() {
        let ctx = ctx();
        ctx.set("tokens".into(), payload(Count(1)));
        ctx.set("tokens".into(), payload(Count(2)));
        assert_eq!(ctx.get::<Count>("tokens").unwrap().0, 2);
    }

    #[test]
    fn errors_are_kept_separately() {
        let ctx = ctx();
        ctx.set_error("git".into(), ProviderError::Other("not a repo".into()));
        assert!(!ctx.has("git"));
        let err = ctx.error("git").unwrap();
        assert_eq!(err.to_string(), "not a repo");
        assert!(ctx.error("tokens").is_none());
    }

    #[test]
    fn concurrent_writers() {
        let ctx = Arc::new(ctx());
        let handles: Vec<_> = (0..8u64)
            .map(|i| {
                let ctx = Arc::clone(&ctx);
                std::thread::spawn(move || ctx.set(format!("p{i}").into(), payload(Count(i))))
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        for i in 0..8u64 {
            assert_eq!(ctx.get::<Count>(&format!("p{i}")).unwrap().0, i);
        }
    }
}
