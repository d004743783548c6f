use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use walkdir::WalkDir;

use super::{Cache, CacheError};

pub const CACHE_FILE_PREFIX: &str = "ccstatus_";
pub const CACHE_FORMAT_VERSION: &str = "2.0";

/// Files from other sessions older than this are removed by [`FileCache::cleanup`].
const STALE_AFTER: Duration = Duration::from_secs(24 * 60 * 60);

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheEntry {
    pub data: serde_json::Value,
    pub expires_at: DateTime<Utc>,
    pub cached_at: DateTime<Utc>,
}

/// On-disk layout of a session cache file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheFile {
    pub session_id: String,
    pub last_updated: DateTime<Utc>,
    pub providers: HashMap<String, CacheEntry>,
    pub version: String,
}

#[derive(Default)]
struct State {
    entries: HashMap<String, CacheEntry>,
    dirty: bool,
}

/// File-backed cache scoped to one session id.
pub struct FileCache {
    dir: PathBuf,
    path: PathBuf,
    session_id: String,
    state: RwLock<State>,
    clock: Clock,
}

impl FileCache {
    pub fn open(dir: impl Into<PathBuf>, session_id: &str) -> Self {
        Self::open_with_clock(dir, session_id, Arc::new(Utc::now))
    }

    pub fn open_with_clock(dir: impl Into<PathBuf>, session_id: &str, clock: Clock) -> Self {
        let dir = dir.into();
        let path = dir.join(cache_file_name(session_id));
        let cache = Self {
            dir,
            path,
            session_id: session_id.to_string(),
            state: RwLock::new(State::default()),
            clock,
        };
        cache.load();
        cache
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    fn load(&self) {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "unreadable cache file");
                return;
            }
        };

        let file: CacheFile = match serde_json::from_slice(&raw) {
            Ok(file) => file,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "corrupt cache file, starting empty");
                return;
            }
        };

        if file.session_id != self.session_id {
            debug!(
                expected = %self.session_id,
                found = %file.session_id,
                "cache file belongs to another session"
            );
            return;
        }

        let now = self.now();
        let mut state = self.state.write().unwrap_or_else(|p| p.into_inner());
        state.entries = file
            .providers
            .into_iter()
            .filter(|(_, entry)| entry.expires_at > now)
            .collect();
    }

    fn should_cleanup(&self) -> bool {
        self.session_id
            .as_bytes()
            .last()
            .is_some_and(|b| b % 10 == 0)
    }
}

impl Cache for FileCache {
    fn get_value(&self, key: &str) -> Option<serde_json::Value> {
        let now = self.now();
        let state = self.state.read().unwrap_or_else(|p| p.into_inner());
        state
            .entries
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.data.clone())
    }

    fn set_value(&self, key: &str, value: serde_json::Value, ttl: Duration) {
        let now = self.now();
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        let entry = CacheEntry {
            data: value,
            expires_at: now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
            cached_at: now,
        };
        let mut state = self.state.write().unwrap_or_else(|p| p.into_inner());
        state.entries.insert(key.to_string(), entry);
        state.dirty = true;
    }

    fn delete(&self, key: &str) {
        let mut state = self.state.write().unwrap_or_else(|p| p.into_inner());
        if state.entries.remove(key).is_some() {
            state.dirty = true;
        }
    }

    fn save(&self) -> Result<(), CacheError> {
        let mut state = self.state.write().unwrap_or_else(|p| p.into_inner());
        if !state.dirty {
            return Ok(());
        }

        let now = self.now();
        state.entries.retain(|_, entry| entry.expires_at > now);
        let file = CacheFile {
            session_id: self.session_id.clone(),
            last_updated: now,
            providers: state.entries.clone(),
            version: CACHE_FORMAT_VERSION.to_string(),
        };
        let body = serde_json::to_vec_pretty(&file).map_err(CacheError::Encode)?;

        write_atomic(&self.dir, &self.path, &body)?;

        state.dirty = false;
        debug!(path = %self.path.display(), entries = file.providers.len(), "cache saved");
        Ok(())
    }

    fn cleanup(&self) -> Result<usize, CacheError> {
        let cutoff = SystemTime::from(self.now())
            .checked_sub(STALE_AFTER)
            .unwrap_or(SystemTime::UNIX_EPOCH);
        let own = cache_file_name(&self.session_id);
        let mut removed = 0;

        for entry in WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(Result::ok)
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if !name.starts_with(CACHE_FILE_PREFIX) || !name.ends_with(".json") || name == own.as_str() {
                continue;
            }
            let modified = match entry.metadata().ok().and_then(|m| m.modified().ok()) {
                Some(t) => t,
                None => continue,
            };
            if modified < cutoff {
                match fs::remove_file(entry.path()) {
                    Ok(()) => removed += 1,
                    Err(e) => debug!(path = %entry.path().display(), error = %e, "failed to remove stale cache"),
                }
            }
        }

        if removed > 0 {
            debug!(removed, "removed stale cache files");
        }
        Ok(removed)
    }

    fn close(&self) -> Result<(), CacheError> {
        self.save()?;
        if self.should_cleanup() {
            if let Err(e) = self.cleanup() {
                debug!(error = %e, "cache cleanup failed");
            }
        }
        Ok(())
    }
}

/// `ccstatus_<session>.json`, with anything outside `[A-Za-z0-9_-]` replaced.
fn cache_file_name(session_id: &str) -> String {
    let mut safe: String = session_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if safe.is_empty() {
        safe.push_str("default");
    }
    format!("{CACHE_FILE_PREFIX}{safe}.json")
}

/// Write `body` to `path` through a temp file in `dir` and an atomic rename.
///
/// The directory is created owner-only and the file is written `0600`. A
/// failed rename removes the temp file.
pub(crate) fn write_atomic(dir: &Path, path: &Path, body: &[u8]) -> Result<(), CacheError> {
    create_private_dir(dir).map_err(|source| CacheError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let tmp = path.with_extension(format!("json.{}.tmp", std::process::id()));
    write_private(&tmp, body).map_err(|source| CacheError::Io {
        path: tmp.clone(),
        source,
    })?;

    if let Err(source) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(CacheError::Rename {
            from: tmp,
            to: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

fn create_private_dir(dir: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        fs::DirBuilder::new().recursive(true).mode(0o700).create(dir)
    }
    #[cfg(not(unix))]
    {
        fs::create_dir_all(dir)
    }
}

fn write_private(path: &Path, body: &[u8]) -> io::Result<()> {
    let mut opts = OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o600);
    }
    let mut file = opts.open(path)?;
    file.write_all(body)?;
    file.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheExt;
    use serde::Deserialize;
    use std::sync::Mutex;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Info {
        branch: String,
        ahead: u32,
    }

    fn info() -> Info {
        Info {
            branch: "main".into(),
            ahead: 2,
        }
    }

    /// A clock the test can move forward.
    fn manual_clock() -> (Clock, Arc<Mutex<DateTime<Utc>>>) {
        let now = Arc::new(Mutex::new(Utc::now()));
        let handle = Arc::clone(&now);
        let clock: Clock = Arc::new(move || *handle.lock().unwrap());
        (clock, now)
    }

    #[test]
    fn set_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::open(dir.path(), "s1");
        cache.set("git", &info(), Duration::from_secs(10)).unwrap();
        assert_eq!(cache.get::<Info>("git").unwrap(), Some(info()));
    }

    #[test]
    fn entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::open(dir.path(), "s1");
        cache.set("git", &info(), Duration::from_secs(60)).unwrap();
        cache.save().unwrap();

        let reopened = FileCache::open(dir.path(), "s1");
        assert_eq!(reopened.get::<Info>("git").unwrap(), Some(info()));

        let raw: CacheFile =
            serde_json::from_slice(&fs::read(reopened.path()).unwrap()).unwrap();
        assert_eq!(raw.session_id, "s1");
        assert_eq!(raw.version, CACHE_FORMAT_VERSION);
        assert!(raw.providers.contains_key("git"));
    }

    #[test]
    fn expired_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let (clock, now) = manual_clock();
        let cache = FileCache::open_with_clock(dir.path(), "s1", clock);
        cache.set("tokens", &42u64, Duration::from_secs(2)).unwrap();
        assert_eq!(cache.get::<u64>("tokens").unwrap(), Some(42));

        *now.lock().unwrap() += chrono::Duration::seconds(3);
        assert_eq!(cache.get::<u64>("tokens").unwrap(), None);
    }

    #[test]
    fn expired_entries_dropped_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let (clock, now) = manual_clock();
        let cache = FileCache::open_with_clock(dir.path(), "s1", Arc::clone(&clock));
        cache.set("short", &1u8, Duration::from_secs(1)).unwrap();
        cache.set("long", &2u8, Duration::from_secs(600)).unwrap();
        cache.save().unwrap();

        *now.lock().unwrap() += chrono::Duration::seconds(5);
        let reopened = FileCache::open_with_clock(dir.path(), "s1", clock);
        assert_eq!(reopened.get::<u8>("short").unwrap(), None);
        assert_eq!(reopened.get::<u8>("long").unwrap(), Some(2));
    }

    #[test]
    fn other_session_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let a = FileCache::open(dir.path(), "A");
        a.set("git", &info(), Duration::from_secs(60)).unwrap();
        a.save().unwrap();

        // Same file contents under B's file name: the embedded id still says A.
        fs::copy(a.path(), dir.path().join(cache_file_name("B"))).unwrap();
        let b = FileCache::open(dir.path(), "B");
        assert_eq!(b.get::<Info>("git").unwrap(), None);
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(cache_file_name("s1")), b"{not json").unwrap();
        let cache = FileCache::open(dir.path(), "s1");
        assert_eq!(cache.get_value("anything"), None);
        cache.set("k", &1u8, Duration::from_secs(60)).unwrap();
        cache.save().unwrap();
        assert_eq!(FileCache::open(dir.path(), "s1").get::<u8>("k").unwrap(), Some(1));
    }

    #[test]
    fn save_without_changes_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"").unwrap();
        // A directory below a regular file can never be created.
        let cache = FileCache::open(blocker.join("cache"), "s1");
        assert!(cache.save().is_ok());

        cache.delete("missing");
        assert!(cache.save().is_ok());

        cache.set("k", &1u8, Duration::from_secs(60)).unwrap();
        assert!(matches!(cache.save(), Err(CacheError::Io { .. })));
    }

    #[test]
    fn save_clears_dirty_flag() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::open(dir.path(), "s1");
        cache.set("k", &1u8, Duration::from_secs(60)).unwrap();
        cache.save().unwrap();

        fs::remove_file(cache.path()).unwrap();
        cache.save().unwrap();
        assert!(!cache.path().exists(), "second save should be skipped");
    }

    #[test]
    fn delete_removes_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::open(dir.path(), "s1");
        cache.set("k", &1u8, Duration::from_secs(60)).unwrap();
        cache.save().unwrap();
        cache.delete("k");
        cache.save().unwrap();
        assert_eq!(FileCache::open(dir.path(), "s1").get::<u8>("k").unwrap(), None);
    }

    #[test]
    fn decode_failure_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::open(dir.path(), "s1");
        cache.set("k", &"text", Duration::from_secs(60)).unwrap();
        assert!(matches!(cache.get::<Info>("k"), Err(CacheError::Decode(_))));
    }

    #[test]
    fn rename_failure_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::open(dir.path(), "s1");
        fs::create_dir(cache.path()).unwrap();
        fs::write(cache.path().join("keep"), b"x").unwrap();

        cache.set("k", &1u8, Duration::from_secs(60)).unwrap();
        assert!(matches!(cache.save(), Err(CacheError::Rename { .. })));

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    fn age(path: &Path, by: Duration) {
        let file = OpenOptions::new().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - by).unwrap();
    }

    #[test]
    fn cleanup_removes_only_stale_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let old = Duration::from_secs(25 * 60 * 60);

        let stale = dir.path().join("ccstatus_other.json");
        let fresh = dir.path().join("ccstatus_recent.json");
        let unrelated = dir.path().join("notes.json");
        for p in [&stale, &fresh, &unrelated] {
            fs::write(p, b"{}").unwrap();
        }
        age(&stale, old);
        age(&unrelated, old);

        let cache = FileCache::open(dir.path(), "mine");
        cache.set("k", &1u8, Duration::from_secs(60)).unwrap();
        cache.save().unwrap();
        age(cache.path(), old);

        assert_eq!(cache.cleanup().unwrap(), 1);
        assert!(!stale.exists());
        assert!(fresh.exists());
        assert!(unrelated.exists());
        assert!(cache.path().exists());
    }

    #[test]
    fn close_cleans_up_for_selected_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join("ccstatus_old.json");
        fs::write(&stale, b"{}").unwrap();
        age(&stale, Duration::from_secs(48 * 60 * 60));

        // '1' is 49: no cleanup.
        FileCache::open(dir.path(), "sess-1").close().unwrap();
        assert!(stale.exists());

        // '2' is 50: cleanup runs.
        FileCache::open(dir.path(), "sess-2").close().unwrap();
        assert!(!stale.exists());
    }

    #[test]
    fn session_id_is_sanitised_in_file_name() {
        assert_eq!(cache_file_name("abc-123"), "ccstatus_abc-123.json");
        assert_eq!(cache_file_name("../etc"), "ccstatus____etc.json");
        assert_eq!(cache_file_name(""), "ccstatus_default.json");
    }

    #[cfg(unix)]
    #[test]
    fn cache_file_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::open(dir.path().join("nested"), "s1");
        cache.set("k", &1u8, Duration::from_secs(60)).unwrap();
        cache.save().unwrap();
        let mode = fs::metadata(cache.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
