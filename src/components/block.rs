//! Active billing block: `block.usage` (tokens against the block limit) and
//! `block.time` (time left until the block ends).

use chrono::DateTime;
use minijinja::context;
use serde::{Deserialize, Serialize};

use crate::components::{format_local, render_segment};
use crate::config::Reader;
use crate::core::{Component, Registry, RenderContext};
use crate::display::{paint, threshold_color};
use crate::providers::block_usage;
use crate::utils::{format_minutes, format_percent, format_tokens};

pub const USAGE: &str = "block.usage";
pub const TIME: &str = "block.time";

const REQUIRED: &[&str] = &[block_usage::KEY];

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct UsageConfig {
    pub template: String,
    pub icon: String,
    /// Token limit of a block. Zero uses the largest block seen so far.
    pub block_limit: u64,
    pub warning_threshold: f64,
    pub critical_threshold: f64,
    pub normal_color: String,
    pub warning_color: String,
    pub critical_color: String,
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            template: "{{ icon }} {{ formatted }} {{ percentage }}".to_string(),
            icon: "\u{f0e7a}".to_string(),
            block_limit: 0,
            warning_threshold: 60.0,
            critical_threshold: 80.0,
            normal_color: "green".to_string(),
            warning_color: "yellow".to_string(),
            critical_color: "red".to_string(),
        }
    }
}

pub struct UsageComponent {
    config: UsageConfig,
}

impl UsageComponent {
    pub fn new(config: UsageConfig) -> Self {
        Self { config }
    }
}

impl Component for UsageComponent {
    fn render(&self, ctx: &RenderContext) -> String {
        let Some(usage) = block_usage::get(ctx) else {
            return String::new();
        };
        if usage.total_tokens == 0 {
            return String::new();
        }
        let c = &self.config;
        let limit = if c.block_limit > 0 {
            c.block_limit
        } else {
            usage.max_block_tokens
        };
        let percentage = if limit > 0 {
            usage.total_tokens as f64 / limit as f64 * 100.0
        } else {
            0.0
        };
        let color = threshold_color(
            percentage,
            c.warning_threshold,
            c.critical_threshold,
            false,
            (&c.normal_color, &c.warning_color, &c.critical_color),
        );
        let out = render_segment(
            &c.template,
            context! {
                icon => &c.icon,
                formatted => format_tokens(usage.total_tokens),
                percentage => format_percent(percentage),
                limit => format_tokens(limit),
                total => usage.total_tokens,
            },
        );
        paint(&out, color)
    }

    fn required_providers(&self) -> &[&str] {
        REQUIRED
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct TimeConfig {
    pub template: String,
    pub icon: String,
    pub color: String,
    pub end_time_format: String,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            template: "{{ icon }} {{ remaining }}{% if end_time %} {{ end_time }}{% endif %}"
                .to_string(),
            icon: "\u{f017}".to_string(),
            color: "gray".to_string(),
            end_time_format: "%-I:%M %p".to_string(),
        }
    }
}

pub struct TimeComponent {
    config: TimeConfig,
}

impl TimeComponent {
    pub fn new(config: TimeConfig) -> Self {
        Self { config }
    }
}

impl Component for TimeComponent {
    fn render(&self, ctx: &RenderContext) -> String {
        let Some(usage) = block_usage::get(ctx) else {
            return String::new();
        };
        if usage.end_time.is_empty() {
            return String::new();
        }
        let end_time = DateTime::parse_from_rfc3339(&usage.end_time)
            .map(|end| format_local(&end, &self.config.end_time_format))
            .unwrap_or_default();
        let out = render_segment(
            &self.config.template,
            context! {
                icon => &self.config.icon,
                remaining => format_minutes(usage.remaining_minutes),
                end_time,
            },
        );
        paint(&out, &self.config.color)
    }

    fn required_providers(&self) -> &[&str] {
        REQUIRED
    }
}

pub fn register(registry: &Registry) {
    registry.register_component(USAGE, |config: &Reader| -> Box<dyn Component> {
        Box::new(UsageComponent::new(
            config.get_component(USAGE, UsageConfig::default()),
        ))
    });
    registry.register_component(TIME, |config: &Reader| -> Box<dyn Component> {
        Box::new(TimeComponent::new(
            config.get_component(TIME, TimeConfig::default()),
        ))
    });
}
