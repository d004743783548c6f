//! Wires configuration, registry and session into a [`StatusLine`].

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::Cache;
use crate::components::{changes, context, cwd, duration, model, newline, rate_limit, version};
use crate::config::Reader;
use crate::core::{ProvideContext, Registry, StatusLine};
use crate::models::ClaudeSession;

/// Components shown when `active` is not configured.
pub const DEFAULT_ACTIVE: &[&str] = &[
    model::NAME,
    context::NAME,
    rate_limit::FIVE_HOUR,
    rate_limit::SEVEN_DAY,
    changes::NAME,
    duration::NAME,
    version::NAME,
    newline::NAME,
    cwd::NAME,
];

/// The configured `active` list; missing or empty falls back to [`DEFAULT_ACTIVE`].
pub fn active_components(config: &Reader) -> Vec<String> {
    let default: Vec<String> = DEFAULT_ACTIVE.iter().map(|s| s.to_string()).collect();
    let active = config.get("active", default.clone());
    if active.is_empty() { default } else { active }
}

/// Instantiate the configured components in order, then each provider they
/// need exactly once.
///
/// Unknown component names are skipped; a required provider that is not
/// registered is logged and its slot simply stays empty at render time.
pub fn build_statusline(
    registry: &Registry,
    config: &Arc<Reader>,
    session: &Arc<ClaudeSession>,
    cache: &Arc<dyn Cache>,
) -> StatusLine {
    let mut line = StatusLine::new(Arc::clone(config));
    let mut wanted: Vec<String> = Vec::new();
    let mut seen = HashSet::new();

    for name in active_components(config) {
        let Some(component) = registry.create_component(&name, config) else {
            warn!(component = %name, "unknown component in active list");
            continue;
        };
        for provider in component.required_providers() {
            if seen.insert(provider.to_string()) {
                wanted.push(provider.to_string());
            }
        }
        line.add_component(component);
    }

    for name in wanted {
        if !registry.has_provider(&name) {
            warn!("component requires provider '{name}' but it is not registered");
            continue;
        }
        match registry.create_provider(&name, config, session, Some(cache)) {
            Some(provider) => line.add_provider(provider),
            None => debug!(provider = %name, "provider declined by its configuration"),
        }
    }

    debug!(
        components = line.component_count(),
        providers = line.provider_count(),
        "status line assembled"
    );
    line
}

/// Build and render one status line for `session`.
pub fn render(
    registry: &Registry,
    config: &Arc<Reader>,
    session: &Arc<ClaudeSession>,
    cache: &Arc<dyn Cache>,
) -> String {
    let line = build_statusline(registry, config, session, cache);
    line.render(&ProvideContext::background())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::NullCache;
    use crate::components::testing::{config, plain};
    use serial_test::serial;

    fn session(json: &str) -> Arc<ClaudeSession> {
        Arc::new(ClaudeSession::from_slice(json.as_bytes()).unwrap())
    }

    fn null_cache() -> Arc<dyn Cache> {
        Arc::new(NullCache)
    }

    #[test]
    fn default_active_list() {
        let active = active_components(&Reader::empty());
        assert_eq!(active.first().map(String::as_str), Some("model"));
        assert_eq!(active.len(), DEFAULT_ACTIVE.len());
    }

    #[test]
    fn empty_active_list_uses_defaults() {
        let active = active_components(&config("active: []\n"));
        assert_eq!(active, DEFAULT_ACTIVE);
    }

    #[test]
    #[serial]
    fn empty_active_list_builds_the_default_layout() {
        let cfg = Arc::new(config("active: []\n"));
        let s = session(r#"{"model":{"display_name":"Opus 4.1"}}"#);
        let line = build_statusline(&Registry::builtin(), &cfg, &s, &null_cache());
        assert_eq!(line.component_count(), DEFAULT_ACTIVE.len());
    }

    #[test]
    #[serial]
    fn providers_are_shared_between_components() {
        let cfg = Arc::new(config("active: [model, version, cwd, bogus]\n"));
        let line = build_statusline(&Registry::builtin(), &cfg, &session("{}"), &null_cache());
        assert_eq!(line.component_count(), 3);
        assert_eq!(line.provider_count(), 1);
    }

    #[test]
    #[serial]
    fn renders_configured_order() {
        plain();
        let cfg = Arc::new(config("active: [version, model]\ndisplay:\n  separator: ' / '\n"));
        let s = session(r#"{"version":"1.0.80","model":{"id":"claude-sonnet-4","display_name":"Sonnet 4"}}"#);
        let out = render(&Registry::builtin(), &cfg, &s, &null_cache());
        assert_eq!(out, "v1.0.80 / \u{f2db} Sonnet");
    }

    #[test]
    #[serial]
    fn unregistered_provider_leaves_component_empty() {
        plain();
        let registry = Registry::new();
        crate::components::register_all(&registry);
        let cfg = Arc::new(config("active: [version, newline, model]\n"));
        let s = session(r#"{"version":"1.0.80","model":{"display_name":"Opus 4.1"}}"#);
        let line = build_statusline(&registry, &cfg, &s, &null_cache());
        assert_eq!(line.provider_count(), 0);
        assert_eq!(line.render(&ProvideContext::background()), "");
    }
}
