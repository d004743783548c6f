use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::Reader;
use crate::core::{
    Payload, ProvideContext, Provider, ProviderError, ProviderKey, ProviderSpec, Registry,
    RenderContext, decode_as, payload,
};
use crate::git::read_git_info;
use crate::models::{ClaudeSession, GitInfo};
use crate::providers::CacheConfig;

pub const KEY: &str = "git";

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
struct Config {
    cache: CacheConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheConfig::millis(10_000),
        }
    }
}

pub struct GitProvider {
    dir: Option<PathBuf>,
}

impl GitProvider {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }
}

impl Provider for GitProvider {
    fn key(&self) -> ProviderKey {
        ProviderKey::new(KEY)
    }

    fn provide(&self, ctx: &ProvideContext) -> Result<Payload, ProviderError> {
        let info = match &self.dir {
            Some(dir) => read_git_info(dir, ctx),
            None => GitInfo::default(),
        };
        Ok(payload(info))
    }
}

fn create(config: &Reader, session: &Arc<ClaudeSession>) -> Option<ProviderSpec> {
    let cfg = config.get_provider(KEY, Config::default());
    let dir = session.working_dir().map(PathBuf::from);
    Some(ProviderSpec::new(GitProvider::new(dir), cfg.cache.duration()))
}

pub fn register(registry: &Registry) {
    registry.register_provider(KEY, create, decode_as::<GitInfo>);
}

pub fn get(ctx: &RenderContext) -> Option<Arc<GitInfo>> {
    ctx.get::<GitInfo>(KEY)
}
