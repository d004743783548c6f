//! Git segments: branch, working tree status, upstream sync and stash.
//!
//! All four read the `git` provider and render nothing outside a repository.

use minijinja::context;
use serde::{Deserialize, Serialize};

use crate::components::render_segment;
use crate::config::Reader;
use crate::core::{Component, Registry, RenderContext};
use crate::display::paint;
use crate::models::GitInfo;
use crate::providers::git as git_provider;
use crate::utils::truncate_end;

pub const BRANCH: &str = "git.branch";
pub const STATUS: &str = "git.status";
pub const SYNC: &str = "git.sync";
pub const STASH: &str = "git.stash";

const REQUIRED: &[&str] = &[git_provider::KEY];

fn repo_info(ctx: &RenderContext) -> Option<std::sync::Arc<GitInfo>> {
    git_provider::get(ctx).filter(|info| info.is_repo)
}

/// `icon` followed by `count`, painted; empty when the count is zero.
fn counter(count: u32, icon: &str, color: &str) -> String {
    if count == 0 {
        return String::new();
    }
    paint(&format!("{icon}{count}"), color)
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct BranchConfig {
    pub template: String,
    pub icon: String,
    pub color: String,
    pub max_length: usize,
}

impl Default for BranchConfig {
    fn default() -> Self {
        Self {
            template: "{{ icon }} {{ branch }}".to_string(),
            icon: "\u{e725}".to_string(),
            color: "gray".to_string(),
            max_length: 20,
        }
    }
}

pub struct BranchComponent {
    config: BranchConfig,
}

impl Component for BranchComponent {
    fn render(&self, ctx: &RenderContext) -> String {
        let Some(info) = repo_info(ctx) else {
            return String::new();
        };
        if info.branch.is_empty() {
            return String::new();
        }
        let out = render_segment(
            &self.config.template,
            context! {
                icon => &self.config.icon,
                branch => truncate_end(&info.branch, self.config.max_length),
            },
        );
        paint(&out, &self.config.color)
    }

    fn required_providers(&self) -> &[&str] {
        REQUIRED
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct StatusConfig {
    pub template: String,
    pub staged_icon: String,
    pub modified_icon: String,
    pub untracked_icon: String,
    pub conflict_icon: String,
    pub staged_color: String,
    pub modified_color: String,
    pub untracked_color: String,
    pub conflict_color: String,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            template: "{% if staged %} {{ staged }}{% endif %}{% if modified %} {{ modified }}{% endif %}{% if untracked %} {{ untracked }}{% endif %}{% if conflicts %} {{ conflicts }}{% endif %}".to_string(),
            staged_icon: "\u{f05d} ".to_string(),
            modified_icon: "\u{f044} ".to_string(),
            untracked_icon: "\u{f420} ".to_string(),
            conflict_icon: "\u{f421} ".to_string(),
            staged_color: "green".to_string(),
            modified_color: "yellow".to_string(),
            untracked_color: "gray".to_string(),
            conflict_color: "red".to_string(),
        }
    }
}

pub struct StatusComponent {
    config: StatusConfig,
}

impl Component for StatusComponent {
    fn render(&self, ctx: &RenderContext) -> String {
        let Some(info) = repo_info(ctx) else {
            return String::new();
        };
        if info.is_clean() {
            return String::new();
        }
        let c = &self.config;
        render_segment(
            &c.template,
            context! {
                staged => counter(info.staged, &c.staged_icon, &c.staged_color),
                modified => counter(info.modified, &c.modified_icon, &c.modified_color),
                untracked => counter(info.untracked, &c.untracked_icon, &c.untracked_color),
                conflicts => counter(info.conflicts, &c.conflict_icon, &c.conflict_color),
            },
        )
    }

    fn required_providers(&self) -> &[&str] {
        REQUIRED
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SyncConfig {
    pub template: String,
    pub ahead_icon: String,
    pub behind_icon: String,
    pub ahead_color: String,
    pub behind_color: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            template: "{% if ahead %} {{ ahead }}{% endif %}{% if behind %} {{ behind }}{% endif %}"
                .to_string(),
            ahead_icon: "\u{eaa1} ".to_string(),
            behind_icon: "\u{ea9a} ".to_string(),
            ahead_color: "green".to_string(),
            behind_color: "red".to_string(),
        }
    }
}

pub struct SyncComponent {
    config: SyncConfig,
}

impl Component for SyncComponent {
    fn render(&self, ctx: &RenderContext) -> String {
        let Some(info) = repo_info(ctx) else {
            return String::new();
        };
        if !info.has_upstream || (info.ahead == 0 && info.behind == 0) {
            return String::new();
        }
        let c = &self.config;
        render_segment(
            &c.template,
            context! {
                ahead => counter(info.ahead, &c.ahead_icon, &c.ahead_color),
                behind => counter(info.behind, &c.behind_icon, &c.behind_color),
            },
        )
    }

    fn required_providers(&self) -> &[&str] {
        REQUIRED
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct StashConfig {
    pub template: String,
    pub icon: String,
    pub color: String,
}

impl Default for StashConfig {
    fn default() -> Self {
        Self {
            template: "{{ icon }} {{ count }}".to_string(),
            icon: "\u{f48d}".to_string(),
            color: "cyan".to_string(),
        }
    }
}

pub struct StashComponent {
    config: StashConfig,
}

impl Component for StashComponent {
    fn render(&self, ctx: &RenderContext) -> String {
        let Some(info) = repo_info(ctx) else {
            return String::new();
        };
        if info.stash == 0 {
            return String::new();
        }
        let out = render_segment(
            &self.config.template,
            context! { icon => &self.config.icon, count => info.stash },
        );
        paint(&out, &self.config.color)
    }

    fn required_providers(&self) -> &[&str] {
        REQUIRED
    }
}

pub fn register(registry: &Registry) {
    registry.register_component(BRANCH, |config: &Reader| -> Box<dyn Component> {
        Box::new(BranchComponent {
            config: config.get_component(BRANCH, BranchConfig::default()),
        })
    });
    registry.register_component(STATUS, |config: &Reader| -> Box<dyn Component> {
        Box::new(StatusComponent {
            config: config.get_component(STATUS, StatusConfig::default()),
        })
    });
    registry.register_component(SYNC, |config: &Reader| -> Box<dyn Component> {
        Box::new(SyncComponent {
            config: config.get_component(SYNC, SyncConfig::default()),
        })
    });
    registry.register_component(STASH, |config: &Reader| -> Box<dyn Component> {
        Box::new(StashComponent {
            config: config.get_component(STASH, StashConfig::default()),
        })
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::testing::*;
    use serial_test::serial;

    fn repo() -> GitInfo {
        GitInfo {
            is_repo: true,
            branch: "main".into(),
            ..GitInfo::default()
        }
    }

    fn render(name: &str, info: GitInfo) -> String {
        let registry = Registry::new();
        register(&registry);
        let component = registry.create_component(name, &Reader::empty()).unwrap();
        component.render(&context_with(git_provider::KEY, info))
    }

    #[test]
    #[serial]
    fn nothing_outside_a_repo() {
        plain();
        for name in [BRANCH, STATUS, SYNC, STASH] {
            assert_eq!(render(name, GitInfo::default()), "", "{name}");
        }
    }

    #[test]
    #[serial]
    fn branch_is_truncated() {
        plain();
        assert_eq!(render(BRANCH, repo()), "\u{e725} main");
        let long = GitInfo {
            branch: "feature/a-very-long-branch-name".into(),
            ..repo()
        };
        let out = render(BRANCH, long);
        assert_eq!(out, "\u{e725} feature/a-very-long…");
    }

    #[test]
    #[serial]
    fn status_lists_only_nonzero_counts() {
        plain();
        assert_eq!(render(STATUS, repo()), "");
        let dirty = GitInfo {
            staged: 2,
            untracked: 1,
            ..repo()
        };
        assert_eq!(render(STATUS, dirty), "\u{f05d} 2 \u{f420} 1");
    }

    #[test]
    #[serial]
    fn status_counts_are_colored() {
        colored();
        let dirty = GitInfo {
            conflicts: 1,
            ..repo()
        };
        assert_eq!(render(STATUS, dirty), paint("\u{f421} 1", "red"));
        plain();
    }

    #[test]
    #[serial]
    fn sync_needs_upstream_and_drift() {
        plain();
        let no_upstream = GitInfo { ahead: 1, ..repo() };
        assert_eq!(render(SYNC, no_upstream), "");
        let in_sync = GitInfo {
            has_upstream: true,
            ..repo()
        };
        assert_eq!(render(SYNC, in_sync), "");
        let drifted = GitInfo {
            has_upstream: true,
            ahead: 3,
            behind: 1,
            ..repo()
        };
        assert_eq!(render(SYNC, drifted), "\u{eaa1} 3 \u{ea9a} 1");
    }

    #[test]
    #[serial]
    fn stash_count() {
        plain();
        assert_eq!(render(STASH, repo()), "");
        assert_eq!(render(STASH, GitInfo { stash: 2, ..repo() }), "\u{f48d} 2");
    }
}
