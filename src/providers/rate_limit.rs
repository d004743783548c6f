//! OAuth rate-limit windows.
//!
//! Usage is account-wide, so the result is shared across sessions through
//! its own small file instead of the per-session cache. Failures yield an
//! empty [`RateLimits`] and are never written to that file.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::{CacheError, default_cache_dir, write_atomic};
use crate::config::Reader;
use crate::core::{
    Payload, ProvideContext, Provider, ProviderError, ProviderKey, ProviderSpec, Registry,
    RenderContext, decode_as, payload,
};
use crate::models::{ClaudeSession, RateLimits};
use crate::providers::CacheConfig;
use crate::usage_api;

pub const KEY: &str = "ratelimit";
const GLOBAL_CACHE_FILE: &str = "ratelimit.json";

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
struct Config {
    /// Session cache; off since the shared file already covers it.
    cache: CacheConfig,
    /// Shared cache file, defaults to `<cache dir>/ratelimit.json`.
    cache_file: Option<String>,
    /// Freshness of the shared file, in milliseconds.
    ttl: u64,
    /// Request timeout, in milliseconds.
    timeout: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            cache_file: None,
            ttl: 60_000,
            timeout: usage_api::REQUEST_TIMEOUT.as_millis() as u64,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
struct GlobalEntry {
    data: RateLimits,
    timestamp: DateTime<Utc>,
}

/// Shared on-disk cache of the last successful fetch.
pub struct GlobalCache {
    path: PathBuf,
    ttl: Duration,
}

impl GlobalCache {
    pub fn new(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            ttl,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored limits if they were written less than `ttl` before `now`.
    pub fn get(&self, now: DateTime<Utc>) -> Option<RateLimits> {
        let raw = fs::read(&self.path).ok()?;
        let entry: GlobalEntry = match serde_json::from_slice(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "ignoring unreadable rate-limit cache");
                return None;
            }
        };
        let age = (now - entry.timestamp).to_std().ok()?;
        (age < self.ttl).then_some(entry.data)
    }

    pub fn set(&self, data: &RateLimits, now: DateTime<Utc>) -> Result<(), CacheError> {
        let entry = GlobalEntry {
            data: data.clone(),
            timestamp: now,
        };
        let body = serde_json::to_vec(&entry).map_err(CacheError::Encode)?;
        let dir = self
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        write_atomic(&dir, &self.path, &body)
    }
}

pub struct RateLimitProvider {
    cache: GlobalCache,
    timeout: Duration,
    user_agent: String,
}

impl RateLimitProvider {
    pub fn new(cache: GlobalCache, timeout: Duration, user_agent: String) -> Self {
        Self {
            cache,
            timeout,
            user_agent,
        }
    }

    fn fetch(&self, ctx: &ProvideContext) -> Result<RateLimits, ProviderError> {
        ctx.check()?;
        let token = usage_api::find_oauth_token(ctx)?;
        ctx.check()?;
        usage_api::fetch_rate_limits(&token, &self.user_agent, ctx.clamp(self.timeout))
    }
}

impl Provider for RateLimitProvider {
    fn key(&self) -> ProviderKey {
        ProviderKey::new(KEY)
    }

    fn provide(&self, ctx: &ProvideContext) -> Result<Payload, ProviderError> {
        if let Some(hit) = self.cache.get(Utc::now()) {
            debug!("rate limits served from shared cache");
            return Ok(payload(hit));
        }

        let limits = match self.fetch(ctx) {
            Ok(limits) => limits,
            Err(e) => {
                debug!(error = %e, "rate limits unavailable");
                return Ok(payload(RateLimits::default()));
            }
        };
        if let Err(e) = self.cache.set(&limits, Utc::now()) {
            debug!(error = %e, "failed to write rate-limit cache");
        }
        Ok(payload(limits))
    }
}

fn create(config: &Reader, session: &Arc<ClaudeSession>) -> Option<ProviderSpec> {
    let cfg = config.get_provider(KEY, Config::default());
    let path = cfg
        .cache_file
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(crate::utils::expand_home)
        .unwrap_or_else(|| default_cache_dir().join(GLOBAL_CACHE_FILE));
    let provider = RateLimitProvider::new(
        GlobalCache::new(path, Duration::from_millis(cfg.ttl)),
        Duration::from_millis(cfg.timeout),
        usage_api::user_agent(&session.version),
    );
    Some(ProviderSpec::new(provider, cfg.cache.duration()))
}

pub fn register(registry: &Registry) {
    registry.register_provider(KEY, create, decode_as::<RateLimits>);
}

pub fn get(ctx: &RenderContext) -> Option<Arc<RateLimits>> {
    ctx.get::<RateLimits>(KEY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RateLimitWindow;

    fn sample() -> RateLimits {
        RateLimits {
            five_hour: Some(RateLimitWindow {
                utilization: 42.0,
                resets_at: None,
            }),
            seven_day: None,
        }
    }

    #[test]
    fn shared_cache_respects_ttl() {
        let dir = tempfile::tempdir().unwrap();
        let cache = GlobalCache::new(dir.path().join("ratelimit.json"), Duration::from_secs(60));
        let now = Utc::now();

        assert_eq!(cache.get(now), None);
        cache.set(&sample(), now).unwrap();
        assert_eq!(cache.get(now + chrono::Duration::seconds(30)), Some(sample()));
        assert_eq!(cache.get(now + chrono::Duration::seconds(61)), None);
    }

    #[test]
    fn future_timestamp_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        let cache = GlobalCache::new(dir.path().join("ratelimit.json"), Duration::from_secs(60));
        let now = Utc::now();
        cache.set(&sample(), now + chrono::Duration::hours(1)).unwrap();
        assert_eq!(cache.get(now), None);
    }

    #[test]
    fn corrupt_cache_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ratelimit.json");
        fs::write(&path, b"{not json").unwrap();
        let cache = GlobalCache::new(path, Duration::from_secs(60));
        assert_eq!(cache.get(Utc::now()), None);
    }

    #[test]
    fn fresh_shared_entry_skips_the_network() {
        let dir = tempfile::tempdir().unwrap();
        let cache = GlobalCache::new(dir.path().join("ratelimit.json"), Duration::from_secs(60));
        cache.set(&sample(), Utc::now()).unwrap();

        let provider = RateLimitProvider::new(cache, Duration::from_millis(1), "test".into());
        let out = provider.provide(&ProvideContext::background()).unwrap();
        assert_eq!(*out.into_any().downcast::<RateLimits>().unwrap(), sample());
    }

    #[test]
    fn cancelled_fetch_is_empty_and_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ratelimit.json");
        let provider = RateLimitProvider::new(
            GlobalCache::new(&path, Duration::from_secs(60)),
            Duration::from_millis(1),
            "test".into(),
        );
        let ctx = ProvideContext::background();
        ctx.cancel();
        let out = provider.provide(&ctx).unwrap();
        assert!(out.into_any().downcast::<RateLimits>().unwrap().is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn configured_cache_file() {
        let cfg = Reader::from_yaml_str("providers:\n  ratelimit:\n    cache_file: /tmp/rl-test.json\n").unwrap();
        let spec = create(&cfg, &Arc::new(ClaudeSession::default())).unwrap();
        assert!(spec.cache_ttl.is_zero());
    }
}
