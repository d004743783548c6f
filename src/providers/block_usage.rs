use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Reader;
use crate::core::{
    Payload, ProvideContext, Provider, ProviderError, ProviderKey, ProviderSpec, Registry,
    RenderContext, decode_as, payload,
};
use crate::models::{BlockUsage, CcusageOutput, ClaudeSession};
use crate::process;
use crate::providers::CacheConfig;

pub const KEY: &str = "blockusage";

/// Limit used when no finished block exists to derive one from.
pub const FALLBACK_MAX_BLOCK_TOKENS: u64 = 1_000_000;

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
struct Config {
    cache: CacheConfig,
    command: String,
    args: Vec<String>,
    /// Milliseconds.
    timeout: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheConfig::millis(10_000),
            command: "ccusage".to_string(),
            args: vec!["blocks".to_string(), "-j".to_string()],
            timeout: 10_000,
        }
    }
}

/// Active billing block as reported by `ccusage blocks -j`.
pub struct BlockUsageProvider {
    command: String,
    args: Vec<String>,
    timeout: Duration,
}

impl BlockUsageProvider {
    pub fn new(command: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            args,
            timeout,
        }
    }
}

impl Provider for BlockUsageProvider {
    fn key(&self) -> ProviderKey {
        ProviderKey::new(KEY)
    }

    fn provide(&self, ctx: &ProvideContext) -> Result<Payload, ProviderError> {
        ctx.check()?;
        let args: Vec<&str> = self.args.iter().map(String::as_str).collect();
        let usage = match process::run_checked(&self.command, &args, None, ctx.clamp(self.timeout)) {
            Ok(stdout) => active_block_usage(&stdout),
            Err(e) => {
                debug!(command = %self.command, error = %e, "ccusage unavailable");
                BlockUsage::default()
            }
        };
        Ok(payload(usage))
    }
}

/// Pick the active block out of `ccusage` JSON.
///
/// The dynamic limit is the largest non-gap block seen. Anything unusable
/// yields zeros.
pub fn active_block_usage(json: &str) -> BlockUsage {
    let output: CcusageOutput = match serde_json::from_str(json) {
        Ok(output) => output,
        Err(e) => {
            debug!(error = %e, "unparsable ccusage output");
            return BlockUsage::default();
        }
    };
    let Some(active) = output.blocks.iter().find(|b| b.is_active) else {
        return BlockUsage::default();
    };

    let max_block_tokens = output
        .blocks
        .iter()
        .filter(|b| !b.is_gap)
        .map(|b| b.total_tokens)
        .max()
        .filter(|&max| max > 0)
        .unwrap_or(FALLBACK_MAX_BLOCK_TOKENS);

    BlockUsage {
        input_tokens: active.token_counts.input_tokens,
        output_tokens: active.token_counts.output_tokens,
        cache_creation_input_tokens: active.token_counts.cache_creation_input_tokens,
        cache_read_input_tokens: active.token_counts.cache_read_input_tokens,
        total_tokens: active.total_tokens,
        remaining_minutes: active
            .projection
            .as_ref()
            .map(|p| p.remaining_minutes)
            .unwrap_or_default(),
        end_time: active.end_time.clone(),
        max_block_tokens,
    }
}

fn create(config: &Reader, _session: &Arc<ClaudeSession>) -> Option<ProviderSpec> {
    let cfg = config.get_provider(KEY, Config::default());
    if cfg.command.trim().is_empty() {
        return None;
    }
    Some(ProviderSpec::new(
        BlockUsageProvider::new(cfg.command, cfg.args, Duration::from_millis(cfg.timeout)),
        cfg.cache.duration(),
    ))
}

pub fn register(registry: &Registry) {
    registry.register_provider(KEY, create, decode_as::<BlockUsage>);
}

pub fn get(ctx: &RenderContext) -> Option<Arc<BlockUsage>> {
    ctx.get::<BlockUsage>(KEY)
}
