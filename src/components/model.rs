use std::collections::BTreeMap;

use minijinja::context;
use serde::{Deserialize, Serialize};

use crate::components::render_segment;
use crate::config::Reader;
use crate::core::{Component, Registry, RenderContext};
use crate::display::paint;
use crate::providers::session_info;

pub const NAME: &str = "model";
const FAMILIES: [(&str, &str); 3] = [("opus", "Opus"), ("sonnet", "Sonnet"), ("haiku", "Haiku")];
const MAX_NAME_LEN: usize = 20;

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    pub template: String,
    /// Icon per model family (`opus`, `sonnet`, `haiku`).
    pub icons: BTreeMap<String, String>,
    pub colors: BTreeMap<String, String>,
    /// Color for models outside the known families.
    pub default_color: String,
}

impl Default for Config {
    fn default() -> Self {
        let family_map = |values: [&str; 3]| -> BTreeMap<String, String> {
            FAMILIES
                .iter()
                .zip(values)
                .map(|((family, _), v)| (family.to_string(), v.to_string()))
                .collect()
        };
        Self {
            template: "{{ icon }} {{ short_name }}".to_string(),
            icons: family_map(["\u{f2db}"; 3]),
            colors: family_map(["magenta", "cyan", "green"]),
            default_color: "gray".to_string(),
        }
    }
}

/// Model family matched case-insensitively in the display name, then the id.
fn family(display_name: &str, id: &str) -> Option<(&'static str, &'static str)> {
    let name = display_name.to_lowercase();
    let id = id.to_lowercase();
    FAMILIES
        .iter()
        .find(|(key, _)| name.contains(key))
        .or_else(|| FAMILIES.iter().find(|(key, _)| id.contains(key)))
        .copied()
}

pub struct ModelComponent {
    config: Config,
}

impl ModelComponent {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl Component for ModelComponent {
    fn render(&self, ctx: &RenderContext) -> String {
        let Some(info) = session_info::get(ctx) else {
            return String::new();
        };
        let model = &info.model;
        if model.display_name.is_empty() {
            return String::new();
        }

        let matched = family(&model.display_name, &model.id);
        let short_name = match matched {
            Some((_, short)) => short.to_string(),
            None if model.display_name.chars().count() > MAX_NAME_LEN => "Claude".to_string(),
            None => model.display_name.clone(),
        };
        let (icon, color) = match matched {
            Some((key, _)) => (
                self.config.icons.get(key).cloned().unwrap_or_default(),
                self.config
                    .colors
                    .get(key)
                    .unwrap_or(&self.config.default_color)
                    .clone(),
            ),
            None => (String::new(), self.config.default_color.clone()),
        };

        let out = render_segment(
            &self.config.template,
            context! {
                icon,
                short_name,
                name => &model.display_name,
                id => &model.id,
            },
        );
        paint(&out, &color)
    }

    fn required_providers(&self) -> &[&str] {
        &[session_info::KEY]
    }
}

fn create(config: &Reader) -> Box<dyn Component> {
    Box::new(ModelComponent::new(config.get_component(NAME, Config::default())))
}

pub fn register(registry: &Registry) {
    registry.register_component(NAME, create);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::testing::*;
    use crate::models::SessionModel;
    use crate::providers::session_info::SessionInfo;
    use serial_test::serial;

    fn ctx(id: &str, display_name: &str) -> RenderContext {
        let info = SessionInfo {
            model: SessionModel {
                id: id.into(),
                display_name: display_name.into(),
            },
            ..SessionInfo::default()
        };
        context_with(session_info::KEY, info)
    }

    fn render(config: Config, ctx: &RenderContext) -> String {
        ModelComponent::new(config).render(ctx)
    }

    #[test]
    #[serial]
    fn known_families() {
        plain();
        let c = Config::default();
        assert_eq!(render(c.clone(), &ctx("claude-opus-4-1", "Opus 4.1")), "\u{f2db} Opus");
        assert_eq!(
            render(c.clone(), &ctx("claude-3-5-sonnet", "Claude 3.5 Sonnet (October 2024)")),
            "\u{f2db} Sonnet"
        );
        assert_eq!(render(c, &ctx("x", "claude haiku model")), "\u{f2db} Haiku");
    }

    #[test]
    #[serial]
    fn unknown_models() {
        plain();
        let c = Config::default();
        assert_eq!(render(c.clone(), &ctx("custom", "CustomAI")), "CustomAI");
        assert_eq!(
            render(c.clone(), &ctx("x", "12345678901234567890")),
            "12345678901234567890"
        );
        assert_eq!(
            render(c, &ctx("x", "A display name well over twenty chars")),
            "Claude"
        );
    }

    #[test]
    #[serial]
    fn family_colors() {
        colored();
        let c = Config::default();
        assert_eq!(
            render(c.clone(), &ctx("claude-opus-4-1", "Opus 4.1")),
            paint("\u{f2db} Opus", "magenta")
        );
        assert_eq!(render(c, &ctx("custom", "CustomAI")), paint("CustomAI", "gray"));
        plain();
    }

    #[test]
    #[serial]
    fn custom_template_and_partial_override() {
        plain();
        let cfg = config("components:\n  model:\n    template: '{{ icon }} {{ name }} ({{ short_name }}) [{{ id }}]'\n    icons:\n      haiku: H\n");
        let c: Config = cfg.get_component(NAME, Config::default());
        assert_eq!(c.icons.get("opus").map(String::as_str), Some("\u{f2db}"));
        assert_eq!(
            render(c, &ctx("claude-haiku-3", "Haiku 3")),
            "H Haiku 3 (Haiku) [claude-haiku-3]"
        );
    }

    #[test]
    #[serial]
    fn empty_template_and_missing_data() {
        plain();
        let c = Config {
            template: String::new(),
            ..Config::default()
        };
        assert_eq!(render(c, &ctx("claude-opus-4-1", "Opus 4.1")), "");
        assert_eq!(render(Config::default(), &empty_context()), "");
        assert_eq!(render(Config::default(), &ctx("", "")), "");
    }

    #[test]
    #[serial]
    fn broken_template_marks_error() {
        plain();
        let c = Config {
            template: "{{ icon ".to_string(),
            ..Config::default()
        };
        assert_eq!(render(c, &ctx("claude-opus-4-1", "Opus 4.1")), crate::template::TEMPLATE_ERROR);
    }
}
