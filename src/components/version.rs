use minijinja::context;
use serde::{Deserialize, Serialize};

use crate::components::render_segment;
use crate::config::Reader;
use crate::core::{Component, Registry, RenderContext};
use crate::display::paint;
use crate::providers::session_info;

pub const NAME: &str = "version";

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    pub template: String,
    pub icon: String,
    pub color: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            template: "v{{ version }}".to_string(),
            icon: String::new(),
            color: "gray".to_string(),
        }
    }
}

/// Claude Code version from the session payload.
pub struct VersionComponent {
    config: Config,
}

impl Component for VersionComponent {
    fn render(&self, ctx: &RenderContext) -> String {
        let Some(info) = session_info::get(ctx) else {
            return String::new();
        };
        if info.version.is_empty() {
            return String::new();
        }
        let out = render_segment(
            &self.config.template,
            context! { icon => &self.config.icon, version => &info.version },
        );
        paint(&out, &self.config.color)
    }

    fn required_providers(&self) -> &[&str] {
        &[session_info::KEY]
    }
}

fn create(config: &Reader) -> Box<dyn Component> {
    Box::new(VersionComponent {
        config: config.get_component(NAME, Config::default()),
    })
}

pub fn register(registry: &Registry) {
    registry.register_component(NAME, create);
}
