//! # Components
//!
//! Built-in status line segments. Each reads its settings from
//! `components.<name>` and renders through a minijinja template; a segment
//! whose data is missing renders nothing.

pub mod block;
pub mod changes;
pub mod context;
pub mod cwd;
pub mod duration;
pub mod git;
pub mod model;
pub mod newline;
pub mod rate_limit;
pub mod tokens;
pub mod version;

use std::fmt::Write;

use chrono::{DateTime, Local, TimeZone};
use serde::Serialize;

use crate::core::Registry;
use crate::template;

pub fn register_all(registry: &Registry) {
    model::register(registry);
    context::register(registry);
    tokens::register(registry);
    changes::register(registry);
    duration::register(registry);
    version::register(registry);
    cwd::register(registry);
    git::register(registry);
    rate_limit::register(registry);
    block::register(registry);
    newline::register(registry);
}

/// Render a segment template, trimming the blanks left by empty optional parts.
pub(crate) fn render_segment<S: Serialize>(template: &str, vars: S) -> String {
    template::render(template, vars).trim().to_string()
}

/// Format `at` in local time with a strftime pattern. An invalid pattern
/// yields an empty string rather than a panic.
pub(crate) fn format_local<Tz: TimeZone>(at: &DateTime<Tz>, pattern: &str) -> String {
    let local = at.with_timezone(&Local);
    let mut out = String::new();
    match write!(out, "{}", local.format(pattern)) {
        Ok(()) => out,
        Err(_) => String::new(),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn bad_time_pattern_is_empty() {
        let now = Utc::now();
        assert_eq!(format_local(&now, "%Q%"), "");
        assert!(!format_local(&now, "%-I:%M %p").is_empty());
    }

    #[test]
    fn segment_is_trimmed() {
        let out = render_segment("{{ icon }} {{ name }}", minijinja::context! { name => "x" });
        assert_eq!(out, "x");
    }

    #[test]
    fn every_builtin_component_is_registered() {
        let registry = Registry::new();
        register_all(&registry);
        assert_eq!(registry.component_names().len(), 16);
    }
}
