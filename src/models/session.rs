use serde::{Deserialize, Deserializer, Serialize};

/// Treat an explicit `null` like a missing field.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SessionModel {
    #[serde(deserialize_with = "nullable")]
    pub id: String,
    #[serde(deserialize_with = "nullable")]
    pub display_name: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SessionWorkspace {
    #[serde(deserialize_with = "nullable")]
    pub current_dir: String,
    #[serde(deserialize_with = "nullable")]
    pub project_dir: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct OutputStyle {
    #[serde(deserialize_with = "nullable")]
    pub name: String,
}

/// Aggregate cost fields reported by Claude Code.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SessionCost {
    #[serde(deserialize_with = "nullable")]
    pub total_cost_usd: f64,
    #[serde(deserialize_with = "nullable")]
    pub total_duration_ms: u64,
    #[serde(deserialize_with = "nullable")]
    pub total_api_duration_ms: u64,
    #[serde(deserialize_with = "nullable")]
    pub total_lines_added: u64,
    #[serde(deserialize_with = "nullable")]
    pub total_lines_removed: u64,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct CurrentUsage {
    #[serde(deserialize_with = "nullable")]
    pub input_tokens: u64,
    #[serde(deserialize_with = "nullable")]
    pub output_tokens: u64,
    #[serde(deserialize_with = "nullable")]
    pub cache_creation_input_tokens: u64,
    #[serde(deserialize_with = "nullable")]
    pub cache_read_input_tokens: u64,
}

impl CurrentUsage {
    pub fn total(&self) -> u64 {
        self.input_tokens
            .saturating_add(self.output_tokens)
            .saturating_add(self.cache_creation_input_tokens)
            .saturating_add(self.cache_read_input_tokens)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ContextWindow {
    #[serde(deserialize_with = "nullable")]
    pub total_input_tokens: u64,
    #[serde(deserialize_with = "nullable")]
    pub total_output_tokens: u64,
    #[serde(deserialize_with = "nullable")]
    pub context_window_size: u64,
    pub current_usage: Option<CurrentUsage>,
    pub used_percentage: Option<f64>,
    pub remaining_percentage: Option<f64>,
}

/// The session document Claude Code writes to the status line command's stdin.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ClaudeSession {
    #[serde(deserialize_with = "nullable")]
    pub hook_event_name: String,
    #[serde(deserialize_with = "nullable")]
    pub session_id: String,
    #[serde(deserialize_with = "nullable")]
    pub transcript_path: String,
    #[serde(deserialize_with = "nullable")]
    pub cwd: String,
    #[serde(deserialize_with = "nullable")]
    pub model: SessionModel,
    #[serde(deserialize_with = "nullable")]
    pub workspace: SessionWorkspace,
    #[serde(deserialize_with = "nullable")]
    pub version: String,
    #[serde(deserialize_with = "nullable")]
    pub output_style: OutputStyle,
    #[serde(deserialize_with = "nullable")]
    pub cost: SessionCost,
    pub context_window: Option<ContextWindow>,
    #[serde(deserialize_with = "nullable")]
    pub exceeds_200k_tokens: bool,
}

impl ClaudeSession {
    /// Parse the stdin payload. Anything but a JSON object is rejected.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_slice(bytes)?;
        if !value.is_object() {
            return Err(serde::de::Error::custom("session payload must be a JSON object"));
        }
        serde_json::from_value(value)
    }

    /// Directory to inspect for project state: the current dir, else the project dir, else `cwd`.
    pub fn working_dir(&self) -> Option<&str> {
        [
            self.workspace.current_dir.as_str(),
            self.workspace.project_dir.as_str(),
            self.cwd.as_str(),
        ]
        .into_iter()
        .find(|d| !d.is_empty())
    }

    pub fn project_dir(&self) -> Option<&str> {
        [self.workspace.project_dir.as_str(), self.cwd.as_str()]
            .into_iter()
            .find(|d| !d.is_empty())
    }
}
