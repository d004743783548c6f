use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Reader;
use crate::core::{
    Payload, ProvideContext, Provider, ProviderError, ProviderKey, ProviderSpec, Registry,
    RenderContext, decode_as, payload,
};
use crate::models::{ClaudeSession, TokenUsage, TranscriptLine};
use crate::providers::CacheConfig;

pub const KEY: &str = "tokenusage";

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
struct Config {
    cache: CacheConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheConfig::millis(2_000),
        }
    }
}

/// Token usage of the latest main-chain assistant turn in the transcript.
pub struct TokenUsageProvider {
    transcript: Option<PathBuf>,
}

impl TokenUsageProvider {
    pub fn new(transcript: Option<PathBuf>) -> Self {
        Self { transcript }
    }
}

impl Provider for TokenUsageProvider {
    fn key(&self) -> ProviderKey {
        ProviderKey::new(KEY)
    }

    fn provide(&self, ctx: &ProvideContext) -> Result<Payload, ProviderError> {
        let Some(path) = &self.transcript else {
            return Ok(payload(TokenUsage::default()));
        };
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "transcript not found");
                return Ok(payload(TokenUsage::default()));
            }
            Err(e) => return Err(e.into()),
        };
        ctx.check()?;
        Ok(payload(last_assistant_usage(&raw)))
    }
}

/// Scan JSONL from the end for the last assistant line carrying usage.
/// Unparsable lines are skipped.
pub fn last_assistant_usage(transcript: &str) -> TokenUsage {
    transcript
        .lines()
        .rev()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| serde_json::from_str::<TranscriptLine>(line).ok())
        .find_map(|line| line.assistant_usage())
        .unwrap_or_default()
}

fn create(config: &Reader, session: &Arc<ClaudeSession>) -> Option<ProviderSpec> {
    let cfg = config.get_provider(KEY, Config::default());
    let transcript = Some(session.transcript_path.trim())
        .filter(|p| !p.is_empty())
        .map(crate::utils::expand_home);
    Some(ProviderSpec::new(
        TokenUsageProvider::new(transcript),
        cfg.cache.duration(),
    ))
}

pub fn register(registry: &Registry) {
    registry.register_provider(KEY, create, decode_as::<TokenUsage>);
}

pub fn get(ctx: &RenderContext) -> Option<Arc<TokenUsage>> {
    ctx.get::<TokenUsage>(KEY)
}
