use minijinja::context;
use serde::{Deserialize, Serialize};

use crate::components::render_segment;
use crate::config::Reader;
use crate::core::{Component, Registry, RenderContext};
use crate::display::paint;
use crate::providers::session_info;

pub const NAME: &str = "changes";

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    pub template: String,
    pub icon: String,
    /// Applied to the whole segment; empty leaves it uncolored.
    pub color: String,
    pub added_sign: String,
    pub removed_sign: String,
    pub added_color: String,
    pub removed_color: String,
    pub show_zero: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            template: "{{ added_sign }}{{ added }}{{ removed_sign }}{{ removed }}".to_string(),
            icon: String::new(),
            color: String::new(),
            added_sign: "+".to_string(),
            removed_sign: "-".to_string(),
            added_color: "green".to_string(),
            removed_color: "red".to_string(),
            show_zero: false,
        }
    }
}

/// Lines added and removed during the session.
pub struct ChangesComponent {
    config: Config,
}

impl ChangesComponent {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl Component for ChangesComponent {
    fn render(&self, ctx: &RenderContext) -> String {
        let Some(info) = session_info::get(ctx) else {
            return String::new();
        };
        let (added, removed) = (info.cost.total_lines_added, info.cost.total_lines_removed);
        if added == 0 && removed == 0 && !self.config.show_zero {
            return String::new();
        }

        let c = &self.config;
        let out = render_segment(
            &c.template,
            context! {
                icon => &c.icon,
                added_sign => paint(&c.added_sign, &c.added_color),
                added => paint(&added.to_string(), &c.added_color),
                removed_sign => paint(&c.removed_sign, &c.removed_color),
                removed => paint(&removed.to_string(), &c.removed_color),
            },
        );
        paint(&out, &c.color)
    }

    fn required_providers(&self) -> &[&str] {
        &[session_info::KEY]
    }
}

fn create(config: &Reader) -> Box<dyn Component> {
    Box::new(ChangesComponent::new(config.get_component(NAME, Config::default())))
}

pub fn register(registry: &Registry) {
    registry.register_component(NAME, create);
}
