//! # Providers
//!
//! Built-in data sources. Each module exposes its `KEY`, a `register`
//! function for the [`Registry`], and a typed accessor for components.
//!
//! | key | payload | default TTL |
//! |---|---|---|
//! | `sessioninfo` | [`SessionInfo`](session_info::SessionInfo) | none |
//! | `tokenusage` | [`TokenUsage`](crate::models::TokenUsage) | 2 s |
//! | `git` | [`GitInfo`](crate::models::GitInfo) | 10 s |
//! | `ratelimit` | [`RateLimits`](crate::models::RateLimits) | none (own 60 s file) |
//! | `blockusage` | [`BlockUsage`](crate::models::BlockUsage) | 10 s |

pub mod block_usage;
pub mod git;
pub mod rate_limit;
pub mod session_info;
pub mod token_usage;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::Registry;

/// `providers.<name>.cache` section. A zero TTL disables session caching.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(default)]
pub struct CacheConfig {
    /// Milliseconds.
    pub ttl: u64,
}

impl CacheConfig {
    pub const fn millis(ttl: u64) -> Self {
        Self { ttl }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.ttl)
    }
}

pub fn register_all(registry: &Registry) {
    session_info::register(registry);
    token_usage::register(registry);
    git::register(registry);
    rate_limit::register(registry);
    block_usage::register(registry);
}
