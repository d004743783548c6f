//! Diagnostic logging to stderr.
//!
//! stdout carries the status line, so every log line goes to stderr. The
//! filter comes from `CCSTATUS_LOG` (env-filter syntax or a bare level),
//! `--debug` forces `debug`, and the default is `warn`.

use tracing::Level;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "CCSTATUS_LOG";

/// Parse a bare level name as accepted in `CCSTATUS_LOG`.
pub fn parse_level(s: &str) -> Option<Level> {
    match s.trim().to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" | "verbose" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

fn build_filter(debug: bool) -> EnvFilter {
    if debug {
        return EnvFilter::new("ccstatus=debug");
    }
    match std::env::var(LOG_ENV) {
        Ok(raw) if !raw.trim().is_empty() => match parse_level(&raw) {
            Some(level) => EnvFilter::new(format!("ccstatus={}", level.as_str().to_ascii_lowercase())),
            None => EnvFilter::try_new(raw.trim()).unwrap_or_else(|_| EnvFilter::new("ccstatus=warn")),
        },
        _ => EnvFilter::new("ccstatus=warn"),
    }
}

/// Install the global subscriber. Safe to call more than once.
pub fn init(debug: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(build_filter(debug))
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init()
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_levels() {
        assert_eq!(parse_level("TRACE"), Some(Level::TRACE));
        assert_eq!(parse_level(" warning "), Some(Level::WARN));
        assert_eq!(parse_level("verbose"), Some(Level::DEBUG));
        assert_eq!(parse_level("ccstatus=debug"), None);
    }

    #[test]
    fn debug_flag_wins() {
        assert_eq!(build_filter(true).to_string(), "ccstatus=debug");
    }
}
