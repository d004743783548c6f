use minijinja::context;
use serde::{Deserialize, Serialize};

use crate::components::render_segment;
use crate::config::Reader;
use crate::core::{Component, Registry, RenderContext};
use crate::display::{paint, threshold_color};
use crate::providers::session_info;
use crate::utils::{format_percent, format_tokens};

pub const NAME: &str = "context";

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    pub template: String,
    pub icon: String,
    /// Used when the session does not report its window size.
    pub context_limit: u64,
    pub warning_threshold: f64,
    pub critical_threshold: f64,
    pub normal_color: String,
    pub warning_color: String,
    pub critical_color: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            template: "{{ icon }} {{ formatted }}".to_string(),
            icon: "\u{ea7b}".to_string(),
            context_limit: 200_000,
            warning_threshold: 60.0,
            critical_threshold: 75.0,
            normal_color: "green".to_string(),
            warning_color: "yellow".to_string(),
            critical_color: "red".to_string(),
        }
    }
}

/// Tokens currently occupying the context window, colored by fill level.
pub struct ContextComponent {
    config: Config,
}

impl ContextComponent {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl Component for ContextComponent {
    fn render(&self, ctx: &RenderContext) -> String {
        let Some(info) = session_info::get(ctx) else {
            return String::new();
        };
        let Some(window) = &info.context_window else {
            return String::new();
        };
        let used = window
            .current_usage
            .as_ref()
            .map(|u| u.total())
            .unwrap_or_default();
        if used == 0 {
            return String::new();
        }

        let limit = match window.context_window_size {
            0 => self.config.context_limit,
            size => size,
        };
        let percentage = if limit > 0 {
            used as f64 / limit as f64 * 100.0
        } else {
            0.0
        };
        let color = threshold_color(
            percentage,
            self.config.warning_threshold,
            self.config.critical_threshold,
            false,
            (
                &self.config.normal_color,
                &self.config.warning_color,
                &self.config.critical_color,
            ),
        );

        let out = render_segment(
            &self.config.template,
            context! {
                icon => &self.config.icon,
                formatted => format_tokens(used),
                percentage => format_percent(percentage),
                used,
                limit,
            },
        );
        paint(&out, color)
    }

    fn required_providers(&self) -> &[&str] {
        &[session_info::KEY]
    }
}

fn create(config: &Reader) -> Box<dyn Component> {
    Box::new(ContextComponent::new(config.get_component(NAME, Config::default())))
}

pub fn register(registry: &Registry) {
    registry.register_component(NAME, create);
}
