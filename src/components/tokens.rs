use minijinja::context;
use serde::{Deserialize, Serialize};

use crate::components::render_segment;
use crate::config::Reader;
use crate::core::{Component, Registry, RenderContext};
use crate::display::{paint, threshold_color};
use crate::providers::token_usage;
use crate::utils::{format_percent, format_tokens};

pub const NAME: &str = "tokens";

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    pub template: String,
    pub icon: String,
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
            warning_threshold: 80.0,
            critical_threshold: 90.0,
            normal_color: "green".to_string(),
            warning_color: "yellow".to_string(),
            critical_color: "red".to_string(),
        }
    }
}

/// Token total of the latest assistant turn, read from the transcript.
pub struct TokensComponent {
    config: Config,
}

impl TokensComponent {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    fn total(ctx: &RenderContext) -> u64 {
        token_usage::get(ctx).map(|u| u.total()).unwrap_or_default()
    }
}

impl Component for TokensComponent {
    fn render(&self, ctx: &RenderContext) -> String {
        let total = Self::total(ctx);
        if total == 0 {
            return String::new();
        }
        let percentage = if self.config.context_limit > 0 {
            total as f64 / self.config.context_limit as f64 * 100.0
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
                formatted => format_tokens(total),
                percentage => format_percent(percentage),
                total,
            },
        );
        paint(&out, color)
    }

    fn required_providers(&self) -> &[&str] {
        &[token_usage::KEY]
    }

    fn should_render(&self, ctx: &RenderContext) -> bool {
        Self::total(ctx) > 0
    }
}

fn create(config: &Reader) -> Box<dyn Component> {
    Box::new(TokensComponent::new(config.get_component(NAME, Config::default())))
}

pub fn register(registry: &Registry) {
    registry.register_component(NAME, create);
}
