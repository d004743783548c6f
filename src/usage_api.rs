//! Client for the OAuth usage endpoint and discovery of the OAuth token
//! Claude Code stores locally.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use crate::core::{ProvideContext, ProviderError};
use crate::models::{RateLimitWindow, RateLimits};

pub const USAGE_ENDPOINT: &str = "https://api.anthropic.com/api/oauth/usage";
pub const ANTHROPIC_BETA: &str = "oauth-2025-04-20";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const CREDENTIAL_TIMEOUT: Duration = Duration::from_secs(2);
const KEYCHAIN_SERVICE: &str = "Claude Code-credentials";
const CREDENTIALS_FILE: &str = ".credentials.json";
const DEFAULT_USER_AGENT: &str = "claude-code";
const TOKEN_ENV_VARS: [&str; 2] = ["CLAUDE_CODE_OAUTH_TOKEN", "ANTHROPIC_AUTH_TOKEN"];

static VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+\.\d+\.\d+(?:-[A-Za-z0-9.]+)?)").unwrap());

/// `User-Agent` for the usage request.
///
/// `CCSTATUS_USER_AGENT` wins; otherwise the Claude Code version from the
/// session payload is used when it looks like a version number.
pub fn user_agent(session_version: &str) -> String {
    if let Ok(explicit) = env::var("CCSTATUS_USER_AGENT") {
        let explicit = explicit.trim();
        if !explicit.is_empty() {
            return explicit.to_string();
        }
    }
    match extract_version(session_version) {
        Some(version) => format!("{DEFAULT_USER_AGENT}/{version}"),
        None => DEFAULT_USER_AGENT.to_string(),
    }
}

fn extract_version(text: &str) -> Option<String> {
    VERSION_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[derive(Debug, Deserialize)]
struct UsageLimitDto {
    #[serde(default)]
    utilization: Option<f64>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    resets_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct UsageResponseDto {
    #[serde(default)]
    five_hour: Option<UsageLimitDto>,
    #[serde(default)]
    seven_day: Option<UsageLimitDto>,
}

impl From<UsageLimitDto> for RateLimitWindow {
    fn from(value: UsageLimitDto) -> Self {
        RateLimitWindow {
            utilization: value.utilization.unwrap_or_default(),
            resets_at: value.resets_at,
        }
    }
}

/// An unparsable reset time is dropped rather than failing the whole response.
fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .filter(|s| !s.is_empty())
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc)))
}

pub fn parse_usage_response(body: &str) -> Result<RateLimits, serde_json::Error> {
    let dto: UsageResponseDto = serde_json::from_str(body)?;
    Ok(RateLimits {
        five_hour: dto.five_hour.map(RateLimitWindow::from),
        seven_day: dto.seven_day.map(RateLimitWindow::from),
    })
}

/// GET the usage endpoint. Non-2xx statuses are errors.
pub fn fetch_rate_limits(
    token: &str,
    user_agent: &str,
    timeout: Duration,
) -> Result<RateLimits, ProviderError> {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build();
    let agent = ureq::Agent::new_with_config(config);

    let mut response = agent
        .get(USAGE_ENDPOINT)
        .header("Authorization", &format!("Bearer {token}"))
        .header("User-Agent", user_agent)
        .header("Accept", "application/json")
        .header("anthropic-beta", ANTHROPIC_BETA)
        .call()
        .map_err(|e| ProviderError::Http(e.to_string()))?;

    let body = response
        .body_mut()
        .read_to_string()
        .map_err(|e| ProviderError::Http(e.to_string()))?;
    Ok(parse_usage_response(&body)?)
}

/// Locate an OAuth access token.
///
/// Order: environment, the platform keyring (macOS Keychain or Linux
/// `secret-tool`), then `.credentials.json` under `$CLAUDE_CONFIG_DIR` and
/// `~/.claude`.
pub fn find_oauth_token(ctx: &ProvideContext) -> Result<String, ProviderError> {
    for var in TOKEN_ENV_VARS {
        if let Ok(val) = env::var(var) {
            let trimmed = val.trim();
            if !trimmed.is_empty() {
                return Ok(trimmed.to_string());
            }
        }
    }

    if let Some(token) = read_from_keyring(ctx) {
        return Ok(token);
    }

    for path in credential_files() {
        if let Ok(raw) = fs::read_to_string(&path) {
            if let Some(token) = parse_credentials(&raw) {
                return Ok(token);
            }
            debug!(path = %path.display(), "credentials file has no access token");
        }
    }

    Err(ProviderError::Credentials("no OAuth token found".into()))
}

/// `claudeAiOauth.accessToken` from a credentials document.
pub fn parse_credentials(raw: &str) -> Option<String> {
    let json: serde_json::Value = serde_json::from_str(raw.trim()).ok()?;
    let token = json
        .get("claudeAiOauth")
        .and_then(|v| v.get("accessToken"))
        .and_then(|v| v.as_str())?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Keychain service name, suffixed with 8 hex chars of the config dir's
/// SHA-256 when `CLAUDE_CONFIG_DIR` is set.
pub fn keychain_service_name(config_dir: Option<&str>) -> String {
    use sha2::{Digest, Sha256};

    match config_dir.filter(|d| !d.is_empty()) {
        Some(dir) => {
            let hash = Sha256::digest(dir.as_bytes());
            let hex = format!("{hash:x}");
            format!("{KEYCHAIN_SERVICE}-{}", &hex[..8])
        }
        None => KEYCHAIN_SERVICE.to_string(),
    }
}

fn credential_files() -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(dir) = env::var("CLAUDE_CONFIG_DIR") {
        if !dir.trim().is_empty() {
            files.push(crate::utils::expand_home(dir.trim()).join(CREDENTIALS_FILE));
        }
    }
    if let Some(home) = crate::utils::home_dir() {
        files.push(home.join(".claude").join(CREDENTIALS_FILE));
    }
    files
}

#[cfg(target_os = "macos")]
fn read_from_keyring(ctx: &ProvideContext) -> Option<String> {
    let username = env::var("USER").ok()?;
    let service = keychain_service_name(env::var("CLAUDE_CONFIG_DIR").ok().as_deref());
    let out = crate::process::run_checked(
        "security",
        &["find-generic-password", "-a", &username, "-s", &service, "-w"],
        None,
        ctx.clamp(CREDENTIAL_TIMEOUT),
    )
    .map_err(|e| debug!(error = %e, "keychain lookup failed"))
    .ok()?;
    parse_credentials(&out)
}

#[cfg(target_os = "linux")]
fn read_from_keyring(ctx: &ProvideContext) -> Option<String> {
    let out = crate::process::run_checked(
        "secret-tool",
        &["lookup", "service", KEYCHAIN_SERVICE],
        None,
        ctx.clamp(CREDENTIAL_TIMEOUT),
    )
    .map_err(|e| debug!(error = %e, "secret-tool lookup failed"))
    .ok()?;
    parse_credentials(&out)
}

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
fn read_from_keyring(_ctx: &ProvideContext) -> Option<String> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serial_test::serial;

    #[test]
    fn parses_usage_response() {
        let body = r#"{
            "five_hour": {"utilization": 42.5, "resets_at": "2025-01-15T15:00:00.123456+00:00"},
            "seven_day": {"utilization": 10.0, "resets_at": null},
            "seven_day_opus": {"utilization": 1.0}
        }"#;
        let limits = parse_usage_response(body).unwrap();
        let five = limits.five_hour.unwrap();
        assert_eq!(five.utilization, 42.5);
        assert_eq!(
            five.resets_at.unwrap().timestamp(),
            Utc.with_ymd_and_hms(2025, 1, 15, 15, 0, 0).unwrap().timestamp()
        );
        assert_eq!(limits.seven_day.unwrap().resets_at, None);
    }

    #[test]
    fn bad_reset_time_is_dropped() {
        let body = r#"{"five_hour": {"utilization": 5, "resets_at": "soon"}}"#;
        let limits = parse_usage_response(body).unwrap();
        assert_eq!(limits.five_hour.unwrap().resets_at, None);
        assert!(limits.seven_day.is_none());
    }

    #[test]
    fn reads_access_token_from_credentials() {
        let raw = r#"{"claudeAiOauth": {"accessToken": " sk-ant-oat01 ", "refreshToken": "x"}}"#;
        assert_eq!(parse_credentials(raw).as_deref(), Some("sk-ant-oat01"));
        assert_eq!(parse_credentials(r#"{"claudeAiOauth": {}}"#), None);
        assert_eq!(parse_credentials("not json"), None);
    }

    #[test]
    fn keychain_service_suffix() {
        assert_eq!(keychain_service_name(None), "Claude Code-credentials");
        assert_eq!(keychain_service_name(Some("")), "Claude Code-credentials");
        let named = keychain_service_name(Some("/home/me/.claude-work"));
        let suffix = named.strip_prefix("Claude Code-credentials-").unwrap();
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    #[serial]
    fn env_token_wins() {
        unsafe { env::set_var("CLAUDE_CODE_OAUTH_TOKEN", "  env-token ") };
        let token = find_oauth_token(&ProvideContext::background());
        unsafe { env::remove_var("CLAUDE_CODE_OAUTH_TOKEN") };
        assert_eq!(token.unwrap(), "env-token");
    }

    #[test]
    #[serial]
    fn user_agent_uses_session_version() {
        unsafe { env::remove_var("CCSTATUS_USER_AGENT") };
        assert_eq!(user_agent("1.0.80"), "claude-code/1.0.80");
        assert_eq!(user_agent(""), "claude-code");
        unsafe { env::set_var("CCSTATUS_USER_AGENT", "custom/1") };
        assert_eq!(user_agent("1.0.80"), "custom/1");
        unsafe { env::remove_var("CCSTATUS_USER_AGENT") };
    }
}
