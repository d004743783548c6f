use std::path::Path;

use minijinja::context;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::components::render_segment;
use crate::config::Reader;
use crate::core::{Component, Registry, RenderContext};
use crate::display::paint;
use crate::providers::session_info;
use crate::utils::truncate_middle;

pub const NAME: &str = "cwd";

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    pub template: String,
    pub icon: String,
    pub color: String,
    /// Regexes matched against the directory name; a match hides the segment.
    pub ignore: Vec<String>,
    /// Zero disables truncation.
    pub max_length: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            template: "{{ icon }} {{ dir }}".to_string(),
            icon: "\u{f07b}".to_string(),
            color: "gray".to_string(),
            ignore: Vec::new(),
            max_length: 20,
        }
    }
}

/// Basename of the session's current directory.
pub struct CwdComponent {
    config: Config,
    ignore: Vec<Regex>,
}

impl CwdComponent {
    pub fn new(config: Config) -> Self {
        let ignore = config
            .ignore
            .iter()
            .filter_map(|pattern| match Regex::new(pattern) {
                Ok(re) => Some(re),
                Err(e) => {
                    debug!(pattern, error = %e, "skipping invalid cwd ignore pattern");
                    None
                }
            })
            .collect();
        Self { config, ignore }
    }
}

impl Component for CwdComponent {
    fn render(&self, ctx: &RenderContext) -> String {
        let Some(info) = session_info::get(ctx) else {
            return String::new();
        };
        let current = [info.workspace.current_dir.as_str(), info.cwd.as_str()]
            .into_iter()
            .find(|d| !d.is_empty());
        let Some(current) = current else {
            return String::new();
        };

        let dir = Path::new(current)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| current.to_string());
        if self.ignore.iter().any(|re| re.is_match(&dir)) {
            return String::new();
        }

        let out = render_segment(
            &self.config.template,
            context! {
                icon => &self.config.icon,
                dir => truncate_middle(&dir, self.config.max_length),
                path => current,
            },
        );
        paint(&out, &self.config.color)
    }

    fn required_providers(&self) -> &[&str] {
        &[session_info::KEY]
    }
}

fn create(config: &Reader) -> Box<dyn Component> {
    Box::new(CwdComponent::new(config.get_component(NAME, Config::default())))
}

pub fn register(registry: &Registry) {
    registry.register_component(NAME, create);
}
