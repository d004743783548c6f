//! # Git Module
//!
//! Repository inspection for the `git` provider.
//!
//! With the `git` feature, discovery and the branch come from `gix`. Upstream
//! ahead/behind, working tree counts and the stash always come from short
//! `git` subprocesses, each bounded by [`GIT_TIMEOUT`].

use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::core::ProvideContext;
use crate::models::GitInfo;
use crate::process;

pub const GIT_TIMEOUT: Duration = Duration::from_millis(500);

/// Inspect the repository containing `dir`.
///
/// A directory outside any repository yields `GitInfo::default()` (with
/// `is_repo == false`); that is not an error.
pub fn read_git_info(dir: &Path, ctx: &ProvideContext) -> GitInfo {
    let Some(head) = read_head(dir, ctx) else {
        debug!(dir = %dir.display(), "not a git repository");
        return GitInfo::default();
    };

    let mut info = GitInfo {
        is_repo: true,
        branch: head.branch,
        ..GitInfo::default()
    };
    if let Some((ahead, behind)) = head.upstream {
        info.has_upstream = true;
        info.ahead = ahead;
        info.behind = behind;
    }

    if let Some(status) = git(dir, ctx, &["status", "--porcelain"]) {
        let counts = parse_porcelain(&status);
        info.staged = counts.staged;
        info.modified = counts.modified;
        info.untracked = counts.untracked;
        info.conflicts = counts.conflicts;
    }
    if let Some(stash) = git(dir, ctx, &["stash", "list"]) {
        info.stash = count_lines(&stash);
    }
    info
}

struct Head {
    branch: String,
    upstream: Option<(u32, u32)>,
}

#[cfg(feature = "git")]
fn read_head(dir: &Path, ctx: &ProvideContext) -> Option<Head> {
    let repo = gix::discover(dir).ok()?;
    let mut head = repo.head().ok()?;

    let referent = head.referent_name().map(|name| name.shorten().to_string());
    let branch = match referent {
        Some(name) => name,
        None => {
            let hex = head
                .try_peel_to_id()
                .ok()
                .flatten()
                .map(|id| id.to_hex().to_string())
                .unwrap_or_default();
            format!("@{}", hex.chars().take(7).collect::<String>())
        }
    };

    Some(Head {
        branch,
        upstream: upstream_counts(dir, ctx),
    })
}

#[cfg(not(feature = "git"))]
fn read_head(dir: &Path, ctx: &ProvideContext) -> Option<Head> {
    let abbrev = git(dir, ctx, &["rev-parse", "--abbrev-ref", "HEAD"])?;
    let abbrev = abbrev.trim();
    let branch = if abbrev == "HEAD" {
        let short = git(dir, ctx, &["rev-parse", "--short", "HEAD"])?;
        format!("@{}", short.trim())
    } else {
        abbrev.to_string()
    };

    Some(Head {
        branch,
        upstream: upstream_counts(dir, ctx),
    })
}

/// Commits only on HEAD and only on its upstream. `None` without an upstream.
fn upstream_counts(dir: &Path, ctx: &ProvideContext) -> Option<(u32, u32)> {
    let out = git(dir, ctx, &["rev-list", "--left-right", "--count", "HEAD...@{upstream}"])?;
    parse_left_right(&out)
}

/// Run `git` in `dir`, returning stdout on success.
fn git(dir: &Path, ctx: &ProvideContext, args: &[&str]) -> Option<String> {
    if ctx.is_done() {
        return None;
    }
    match process::run_checked("git", args, Some(dir), ctx.clamp(GIT_TIMEOUT)) {
        Ok(out) => Some(out),
        Err(e) => {
            debug!(?args, error = %e, "git command failed");
            None
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub staged: u32,
    pub modified: u32,
    pub untracked: u32,
    pub conflicts: u32,
}

/// Count entries of `git status --porcelain` (v1) output.
///
/// Unmerged entries count only as conflicts; an entry changed in both the
/// index and the worktree counts as staged and modified.
pub fn parse_porcelain(output: &str) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for line in output.lines() {
        let bytes = line.as_bytes();
        if bytes.len() < 2 {
            continue;
        }
        let (x, y) = (bytes[0], bytes[1]);
        match (x, y) {
            (b'?', b'?') => counts.untracked += 1,
            (b'!', b'!') => {}
            (b'U', _) | (_, b'U') | (b'D', b'D') | (b'A', b'A') => counts.conflicts += 1,
            _ => {
                if x != b' ' {
                    counts.staged += 1;
                }
                if y != b' ' {
                    counts.modified += 1;
                }
            }
        }
    }
    counts
}

fn parse_left_right(output: &str) -> Option<(u32, u32)> {
    let mut parts = output.split_whitespace();
    let ahead = parts.next()?.parse().ok()?;
    let behind = parts.next()?.parse().ok()?;
    Some((ahead, behind))
}

fn count_lines(output: &str) -> u32 {
    output.lines().filter(|l| !l.trim().is_empty()).count() as u32
}
