use serde::{Deserialize, Serialize};

/// Repository state of the session's working directory.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct GitInfo {
    pub is_repo: bool,
    /// Branch name, or `@<short sha>` when HEAD is detached.
    pub branch: String,
    pub staged: u32,
    pub modified: u32,
    pub untracked: u32,
    pub conflicts: u32,
    pub ahead: u32,
    pub behind: u32,
    pub has_upstream: bool,
    pub stash: u32,
}

impl GitInfo {
    pub fn is_clean(&self) -> bool {
        self.staged == 0 && self.modified == 0 && self.untracked == 0 && self.conflicts == 0
    }
}
