//! # Config Module
//!
//! Layered YAML configuration with dotted-path lookups and typed defaults.
//!
//! Files are merged lowest precedence first:
//!
//! 1. `~/.claude/ccstatus.yaml` (or `$CCSTATUS_CONFIG`, or `--config`)
//! 2. `<project>/.claude/ccstatus.yaml`
//! 3. `<project>/.claude/ccstatus.local.yaml`
//!
//! Any file that is missing or fails to parse is skipped.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};
use tracing::debug;

const USER_CONFIG_ENV: &str = "CCSTATUS_CONFIG";
const PROJECT_CONFIG: &str = "ccstatus.yaml";
const PROJECT_LOCAL_CONFIG: &str = "ccstatus.local.yaml";

#[derive(Debug, Clone)]
pub struct Reader {
    root: Value,
    sources: Vec<PathBuf>,
}

impl Default for Reader {
    fn default() -> Self {
        Self::empty()
    }
}

impl Reader {
    /// A reader with no values; every lookup yields its default.
    pub fn empty() -> Self {
        Self {
            root: Value::Mapping(Mapping::new()),
            sources: Vec::new(),
        }
    }

    pub fn from_value(root: Value) -> Self {
        let root = match root {
            Value::Mapping(_) => root,
            _ => Value::Mapping(Mapping::new()),
        };
        Self {
            root,
            sources: Vec::new(),
        }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        Ok(Self::from_value(serde_yaml::from_str(yaml)?))
    }

    /// Load and merge the user file and the project files under `project_dir`.
    pub fn load(project_dir: Option<&Path>, user_config: Option<&Path>) -> Self {
        let mut candidates = Vec::new();
        if let Some(path) = user_config.map(Path::to_path_buf).or_else(default_user_config) {
            candidates.push(path);
        }
        if let Some(project) = project_dir {
            let dot_claude = project.join(".claude");
            candidates.push(dot_claude.join(PROJECT_CONFIG));
            candidates.push(dot_claude.join(PROJECT_LOCAL_CONFIG));
        }
        Self::load_files(&candidates)
    }

    /// Merge `paths` in order; later files override earlier ones.
    pub fn load_files(paths: &[PathBuf]) -> Self {
        let mut reader = Self::empty();
        for path in paths {
            let Some(layer) = read_layer(path) else {
                continue;
            };
            merge(&mut reader.root, layer);
            reader.sources.push(path.clone());
        }
        reader
    }

    /// Files that contributed values, lowest precedence first.
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn lookup(&self, path: &str) -> Option<&Value> {
        if path.is_empty() {
            return None;
        }
        path.split('.')
            .try_fold(&self.root, |node, segment| node.get(segment))
    }

    /// Value at `path`, overlaid onto `default`.
    ///
    /// Struct defaults survive partial overrides: a file that only sets
    /// `components.model.icon` keeps every other default field of the model
    /// config. A value of the wrong shape yields `default`.
    pub fn get<T>(&self, path: &str, default: T) -> T
    where
        T: Serialize + DeserializeOwned,
    {
        let Some(found) = self.lookup(path) else {
            return default;
        };
        let mut base = match serde_yaml::to_value(&default) {
            Ok(base) => base,
            Err(_) => return default,
        };
        merge(&mut base, found.clone());
        match serde_yaml::from_value(base) {
            Ok(value) => value,
            Err(e) => {
                debug!(path, error = %e, "config value has the wrong shape, using default");
                default
            }
        }
    }

    pub fn get_component<T>(&self, name: &str, default: T) -> T
    where
        T: Serialize + DeserializeOwned,
    {
        self.get(&format!("components.{name}"), default)
    }

    pub fn get_provider<T>(&self, name: &str, default: T) -> T
    where
        T: Serialize + DeserializeOwned,
    {
        self.get(&format!("providers.{name}"), default)
    }
}

fn default_user_config() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(USER_CONFIG_ENV) {
        let path = path.trim();
        if !path.is_empty() {
            return Some(crate::utils::expand_home(path));
        }
    }
    directories::BaseDirs::new().map(|b| b.home_dir().join(".claude").join(PROJECT_CONFIG))
}

fn read_layer(path: &Path) -> Option<Value> {
    let text = fs::read_to_string(path).ok()?;
    match serde_yaml::from_str::<Value>(&text) {
        Ok(value @ Value::Mapping(_)) => Some(value),
        Ok(Value::Null) => None,
        Ok(_) => {
            debug!(path = %path.display(), "config root is not a mapping, skipping");
            None
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "invalid config file, skipping");
            None
        }
    }
}

/// Deep-merge `overlay` into `base`. Mappings merge key by key, anything else replaces.
fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base), Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
