//! OAuth usage windows: `ratelimit.fivehour` and `ratelimit.sevenday`.

use chrono::{DateTime, Utc};
use minijinja::context;
use serde::{Deserialize, Serialize};

use crate::components::{format_local, render_segment};
use crate::config::Reader;
use crate::core::{Component, Registry, RenderContext};
use crate::display::{paint, threshold_color};
use crate::models::{RateLimitWindow, RateLimits};
use crate::providers::rate_limit;
use crate::utils::{format_minutes, format_percent, format_remaining_days};

pub const FIVE_HOUR: &str = "ratelimit.fivehour";
pub const SEVEN_DAY: &str = "ratelimit.sevenday";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    FiveHour,
    SevenDay,
}

impl Window {
    pub fn name(self) -> &'static str {
        match self {
            Window::FiveHour => FIVE_HOUR,
            Window::SevenDay => SEVEN_DAY,
        }
    }

    fn select(self, limits: &RateLimits) -> Option<&RateLimitWindow> {
        match self {
            Window::FiveHour => limits.five_hour.as_ref(),
            Window::SevenDay => limits.seven_day.as_ref(),
        }
    }

    fn format_remaining(self, minutes: i64) -> String {
        match self {
            Window::FiveHour => format_minutes(minutes),
            Window::SevenDay => format_remaining_days(minutes),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    pub template: String,
    pub icon: String,
    /// strftime pattern for the local reset time.
    pub end_time_format: String,
    /// Percent; reaching it switches to the warning color.
    pub warning_threshold: f64,
    pub critical_threshold: f64,
    pub normal_color: String,
    pub warning_color: String,
    pub critical_color: String,
    /// Color of the remaining time and reset time.
    pub color: String,
}

impl Config {
    pub fn for_window(window: Window) -> Self {
        let (template, icon, end_time_format) = match window {
            Window::FiveHour => (
                "{{ icon }} {{ utilization }}{% if end_time %} {{ remaining }} {{ end_time }}{% endif %}",
                "5h",
                "%-I:%M %p",
            ),
            Window::SevenDay => (
                "{{ icon }} {{ utilization }} {{ remaining }}",
                "7d",
                "%a %-I:%M %p",
            ),
        };
        Self {
            template: template.to_string(),
            icon: icon.to_string(),
            end_time_format: end_time_format.to_string(),
            warning_threshold: 60.0,
            critical_threshold: 80.0,
            normal_color: "green".to_string(),
            warning_color: "yellow".to_string(),
            critical_color: "red".to_string(),
            color: "gray".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::for_window(Window::FiveHour)
    }
}

pub struct RateLimitComponent {
    window: Window,
    config: Config,
}

impl RateLimitComponent {
    pub fn new(window: Window, config: Config) -> Self {
        Self { window, config }
    }

    fn render_at(&self, ctx: &RenderContext, now: DateTime<Utc>) -> String {
        let Some(limits) = rate_limit::get(ctx) else {
            return String::new();
        };
        let Some(window) = self.window.select(&limits) else {
            return String::new();
        };

        let c = &self.config;
        let (remaining, end_time) = match window.resets_at {
            Some(reset) => (
                self.window
                    .format_remaining(window.remaining_minutes(now).unwrap_or_default()),
                format_local(&reset, &c.end_time_format),
            ),
            None => (String::new(), String::new()),
        };
        let status = threshold_color(
            window.utilization,
            c.warning_threshold,
            c.critical_threshold,
            true,
            (&c.normal_color, &c.warning_color, &c.critical_color),
        );

        render_segment(
            &c.template,
            context! {
                icon => paint(&c.icon, status),
                utilization => paint(&format_percent(window.utilization), status),
                remaining => paint(&remaining, &c.color),
                end_time => paint(&end_time, &c.color),
                reset_at => window.resets_at.map(|r| r.to_rfc3339()),
            },
        )
    }
}

impl Component for RateLimitComponent {
    fn render(&self, ctx: &RenderContext) -> String {
        self.render_at(ctx, Utc::now())
    }

    fn required_providers(&self) -> &[&str] {
        &[rate_limit::KEY]
    }
}

fn create(window: Window, config: &Reader) -> Box<dyn Component> {
    let cfg = config.get_component(window.name(), Config::for_window(window));
    Box::new(RateLimitComponent::new(window, cfg))
}

pub fn register(registry: &Registry) {
    registry.register_component(FIVE_HOUR, |config: &Reader| create(Window::FiveHour, config));
    registry.register_component(SEVEN_DAY, |config: &Reader| create(Window::SevenDay, config));
}
