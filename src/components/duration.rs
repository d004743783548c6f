use minijinja::context;
use serde::{Deserialize, Serialize};

use crate::components::render_segment;
use crate::config::Reader;
use crate::core::{Component, Registry, RenderContext};
use crate::display::paint;
use crate::providers::session_info;
use crate::utils::format_duration_ms;

pub const NAME: &str = "duration";

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    pub template: String,
    pub icon: String,
    pub api_icon: String,
    pub color: String,
    pub show_api_duration: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            template: "{{ icon }} {{ total }}{% if api %} {{ api_icon }} {{ api }}{% endif %}"
                .to_string(),
            icon: "\u{f520}".to_string(),
            api_icon: "\u{f1616}".to_string(),
            color: "gray".to_string(),
            show_api_duration: true,
        }
    }
}

pub struct DurationComponent {
    config: Config,
}

impl DurationComponent {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl Component for DurationComponent {
    fn render(&self, ctx: &RenderContext) -> String {
        let Some(info) = session_info::get(ctx) else {
            return String::new();
        };
        let total_ms = info.cost.total_duration_ms as i64;
        if total_ms <= 0 {
            return String::new();
        }
        let api_ms = info.cost.total_api_duration_ms as i64;
        let api = if self.config.show_api_duration && api_ms > 0 {
            format_duration_ms(api_ms)
        } else {
            String::new()
        };

        let out = render_segment(
            &self.config.template,
            context! {
                icon => &self.config.icon,
                api_icon => &self.config.api_icon,
                total => format_duration_ms(total_ms),
                api,
            },
        );
        paint(&out, &self.config.color)
    }

    fn required_providers(&self) -> &[&str] {
        &[session_info::KEY]
    }
}

fn create(config: &Reader) -> Box<dyn Component> {
    Box::new(DurationComponent::new(config.get_component(NAME, Config::default())))
}

pub fn register(registry: &Registry) {
    registry.register_component(NAME, create);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::testing::*;
    use crate::models::SessionCost;
    use crate::providers::session_info::SessionInfo;
    use serial_test::serial;

    fn ctx(total: u64, api: u64) -> RenderContext {
        context_with(
            session_info::KEY,
            SessionInfo {
                cost: SessionCost {
                    total_duration_ms: total,
                    total_api_duration_ms: api,
                    ..SessionCost::default()
                },
                ..SessionInfo::default()
            },
        )
    }

    #[test]
    #[serial]
    fn total_and_api() {
        plain();
        let c = DurationComponent::new(Config::default());
        assert_eq!(c.render(&ctx(90_000, 30_000)), "\u{f520} 1m30s \u{f1616} 30s");
        assert_eq!(c.render(&ctx(3_600_000, 0)), "\u{f520} 1h");
        assert_eq!(c.render(&ctx(0, 1_000)), "");
    }

    #[test]
    #[serial]
    fn api_duration_can_be_hidden() {
        plain();
        let cfg = config("components:\n  duration:\n    show_api_duration: false\n");
        let c = DurationComponent::new(cfg.get_component(NAME, Config::default()));
        assert_eq!(c.render(&ctx(45_000, 30_000)), "\u{f520} 45s");
    }
}
