use serde::{Deserialize, Serialize};

/// Token counts of one assistant turn.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(default)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_creation_input_tokens: u64,
    pub cache_read_input_tokens: u64,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.input_tokens
            .saturating_add(self.output_tokens)
            .saturating_add(self.cache_creation_input_tokens)
            .saturating_add(self.cache_read_input_tokens)
    }
}

#[derive(Deserialize, Debug)]
pub struct MessageObj {
    pub usage: Option<TokenUsage>,
}

/// One line of a Claude Code transcript (JSONL).
#[derive(Deserialize, Debug)]
pub struct TranscriptLine {
    pub r#type: Option<String>,
    #[serde(rename = "isSidechain", default)]
    pub is_sidechain: bool,
    pub message: Option<MessageObj>,
}

impl TranscriptLine {
    /// Usage of a main-chain assistant message, if this line is one.
    pub fn assistant_usage(&self) -> Option<TokenUsage> {
        if self.is_sidechain || self.r#type.as_deref() != Some("assistant") {
            return None;
        }
        self.message.as_ref()?.usage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_saturates() {
        let usage = TokenUsage {
            input_tokens: u64::MAX,
            cache_read_input_tokens: 10,
            ..TokenUsage::default()
        };
        assert_eq!(usage.total(), u64::MAX);
    }

    #[test]
    fn sidechain_turns_are_ignored() {
        let line: TranscriptLine = serde_json::from_str(
            r#"{"type":"assistant","isSidechain":true,"message":{"usage":{"input_tokens":3}}}"#,
        )
        .unwrap();
        assert_eq!(line.assistant_usage(), None);
    }
}
