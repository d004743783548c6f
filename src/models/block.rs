use serde::{Deserialize, Serialize};

/// Token usage of the active 5-hour billing block, as reported by `ccusage`.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BlockUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_creation_input_tokens: u64,
    pub cache_read_input_tokens: u64,
    pub total_tokens: u64,
    pub remaining_minutes: i64,
    /// RFC 3339 end of the block; empty when no block is active.
    pub end_time: String,
    /// Largest non-gap block seen, used as the dynamic limit.
    pub max_block_tokens: u64,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct CcusageOutput {
    pub blocks: Vec<CcusageBlock>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct CcusageBlock {
    pub is_active: bool,
    pub is_gap: bool,
    pub total_tokens: u64,
    pub token_counts: CcusageTokenCounts,
    pub projection: Option<CcusageProjection>,
    pub end_time: String,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct CcusageTokenCounts {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_creation_input_tokens: u64,
    pub cache_read_input_tokens: u64,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct CcusageProjection {
    pub remaining_minutes: i64,
}
