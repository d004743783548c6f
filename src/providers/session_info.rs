use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::Reader;
use crate::core::{
    Payload, ProvideContext, Provider, ProviderError, ProviderKey, ProviderSpec, Registry,
    RenderContext, decode_as, payload,
};
use crate::models::{ClaudeSession, ContextWindow, SessionCost, SessionModel, SessionWorkspace};
use crate::providers::CacheConfig;

pub const KEY: &str = "sessioninfo";

/// The parts of the stdin session that components display.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SessionInfo {
    pub model: SessionModel,
    pub session_id: String,
    pub version: String,
    pub workspace: SessionWorkspace,
    pub cwd: String,
    pub cost: SessionCost,
    pub context_window: Option<ContextWindow>,
    pub exceeds_200k_tokens: bool,
}

impl From<&ClaudeSession> for SessionInfo {
    fn from(s: &ClaudeSession) -> Self {
        Self {
            model: s.model.clone(),
            session_id: s.session_id.clone(),
            version: s.version.clone(),
            workspace: s.workspace.clone(),
            cwd: s.cwd.clone(),
            cost: s.cost.clone(),
            context_window: s.context_window.clone(),
            exceeds_200k_tokens: s.exceeds_200k_tokens,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
struct Config {
    cache: CacheConfig,
}

pub struct SessionInfoProvider {
    session: Arc<ClaudeSession>,
}

impl SessionInfoProvider {
    pub fn new(session: Arc<ClaudeSession>) -> Self {
        Self { session }
    }
}

impl Provider for SessionInfoProvider {
    fn key(&self) -> ProviderKey {
        ProviderKey::new(KEY)
    }

    fn provide(&self, _ctx: &ProvideContext) -> Result<Payload, ProviderError> {
        Ok(payload(SessionInfo::from(self.session.as_ref())))
    }
}

fn create(config: &Reader, session: &Arc<ClaudeSession>) -> Option<ProviderSpec> {
    let cfg = config.get_provider(KEY, Config::default());
    Some(ProviderSpec::new(
        SessionInfoProvider::new(Arc::clone(session)),
        cfg.cache.duration(),
    ))
}

pub fn register(registry: &Registry) {
    registry.register_provider(KEY, create, decode_as::<SessionInfo>);
}

pub fn get(ctx: &RenderContext) -> Option<Arc<SessionInfo>> {
    ctx.get::<SessionInfo>(KEY)
}
