//! Blacklist of forbidden request paths.
//!
//! The blacklist file is a JSON array of path strings. Entries ending in `/`
//! forbid every path below them (and the directory path itself); all other
//! entries forbid exactly one path.
//!
//! Loading is fail-open: an unreadable or malformed file yields an empty
//! blacklist and a log line, never a startup failure.
//!
//! # Reloading
//!
//! ```text
//!   request threads             watcher thread
//!   is_forbidden() ──load()──▶ ┌──────────────────┐ ◀──store()── reload()
//!   (lock-free)                │ ArcSwap<Blacklist>│  (whole snapshot)
//!                              └──────────────────┘
//! ```

use crate::log;
use arc_swap::ArcSwap;
use compact_str::CompactString;
use rustc_hash::FxHashSet;
use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlacklistError {
    #[error("cannot read blacklist `{0}`")]
    Io(PathBuf, #[source] io::Error),

    #[error("blacklist must be a JSON array of strings")]
    Json(#[from] serde_json::Error),
}

/// Immutable set of exact and prefix entries.
#[derive(Debug, Clone, Default)]
pub struct Blacklist {
    exact: FxHashSet<CompactString>,
    prefixes: Vec<CompactString>,
}

impl Blacklist {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut blacklist = Self::default();
        for entry in entries {
            let entry = entry.as_ref();
            if entry.ends_with('/') {
                blacklist.prefixes.push(entry.into());
            }
            blacklist.exact.insert(entry.into());
        }
        blacklist
    }

    pub fn from_json(text: &str) -> Result<Self, BlacklistError> {
        let entries: Vec<String> = serde_json::from_str(text)?;
        Ok(Self::new(entries))
    }

    pub fn len(&self) -> usize {
        self.exact.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
    }

    /// Exact match, or a `/`-suffixed entry is a prefix of `path`.
    ///
    /// A prefix entry also covers the directory path without its slash,
    /// since request paths are normalized without trailing slashes.
    pub fn is_forbidden(&self, path: &str) -> bool {
        self.exact.contains(path)
            || self.prefixes.iter().any(|prefix| {
                path.starts_with(prefix.as_str()) || path == &prefix[..prefix.len() - 1]
            })
    }
}

/// Read and parse a blacklist file, returning it with its content digest.
fn read_blacklist(path: &Path) -> Result<(Blacklist, u64), BlacklistError> {
    let content = fs::read(path).map_err(|err| BlacklistError::Io(path.to_path_buf(), err))?;
    let text = String::from_utf8_lossy(&content);
    Ok((Blacklist::from_json(&text)?, digest(&content)))
}

/// First 8 bytes of the blake3 hash, never 0 (0 means "no file loaded").
fn digest(content: &[u8]) -> u64 {
    let hash = blake3::hash(content);
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes).max(1)
}

/// Process-wide blacklist, consulted before any path resolution.
pub struct AccessGuard {
    source: PathBuf,
    current: ArcSwap<Blacklist>,
    digest: AtomicU64,
}

impl AccessGuard {
    /// Load the blacklist from `source`, falling back to an empty one.
    pub fn load(source: impl Into<PathBuf>) -> Self {
        let guard = Self {
            source: source.into(),
            current: ArcSwap::from_pointee(Blacklist::default()),
            digest: AtomicU64::new(0),
        };
        guard.reload();
        guard
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn snapshot(&self) -> Arc<Blacklist> {
        self.current.load_full()
    }

    pub fn is_forbidden(&self, path: &str) -> bool {
        self.current.load().is_forbidden(path)
    }

    /// Re-read the source file and swap in the new snapshot.
    ///
    /// Returns `true` if the snapshot was replaced. Unchanged content is
    /// skipped; unreadable or malformed content installs an empty blacklist.
    pub fn reload(&self) -> bool {
        match read_blacklist(&self.source) {
            Ok((blacklist, digest)) => {
                if self.digest.load(Ordering::Relaxed) == digest {
                    return false;
                }
                log!("access"; "blacklist loaded: {} rules", blacklist.len());
                self.current.store(Arc::new(blacklist));
                self.digest.store(digest, Ordering::Relaxed);
                true
            }
            Err(err) => {
                let cause = std::error::Error::source(&err)
                    .map(|source| format!(": {source}"))
                    .unwrap_or_default();
                log!("access"; "{err}{cause}, serving without blacklist rules");
                self.current.store(Arc::new(Blacklist::default()));
                self.digest.store(0, Ordering::Relaxed);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_exact_entries_match_only_exactly() {
        let blacklist = Blacklist::new(["/secret", "/drafts/wip"]);

        assert!(blacklist.is_forbidden("/secret"));
        assert!(blacklist.is_forbidden("/drafts/wip"));
        assert!(!blacklist.is_forbidden("/secret/child"));
        assert!(!blacklist.is_forbidden("/secrets"));
        assert!(!blacklist.is_forbidden("/drafts"));
    }

    #[test]
    fn test_prefix_entries_cover_subtree() {
        let blacklist = Blacklist::new(["/private/"]);

        for path in ["/private/a", "/private/a/b/c", "/private/"] {
            assert!(blacklist.is_forbidden(path), "{path}");
        }
        assert!(blacklist.is_forbidden("/private"));
        assert!(!blacklist.is_forbidden("/privateer"));
        assert!(!blacklist.is_forbidden("/public/private"));
    }

    #[test]
    fn test_from_json() {
        let blacklist = Blacklist::from_json(r#"["/a", "/b/"]"#).unwrap();
        assert_eq!(blacklist.len(), 2);
        assert!(blacklist.is_forbidden("/b/c"));

        assert!(Blacklist::from_json(r#"{"a": 1}"#).is_err());
        assert!(Blacklist::from_json("[1, 2]").is_err());
        assert!(Blacklist::from_json("not json").is_err());
    }

    #[test]
    fn test_load_missing_file_fails_open() {
        let dir = TempDir::new().unwrap();
        let guard = AccessGuard::load(dir.path().join("blacklist.json"));

        assert!(guard.snapshot().is_empty());
        assert!(!guard.is_forbidden("/anything"));
    }

    #[test]
    fn test_load_malformed_file_fails_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blacklist.json");
        fs::write(&path, r#"{"not": "an array"}"#).unwrap();

        let guard = AccessGuard::load(&path);
        assert!(guard.snapshot().is_empty());
    }

    #[test]
    fn test_reload_replaces_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blacklist.json");
        fs::write(&path, r#"["/old"]"#).unwrap();

        let guard = AccessGuard::load(&path);
        let before = guard.snapshot();
        assert!(guard.is_forbidden("/old"));

        // unchanged content is not swapped
        assert!(!guard.reload());

        fs::write(&path, r#"["/new/"]"#).unwrap();
        assert!(guard.reload());
        assert!(!guard.is_forbidden("/old"));
        assert!(guard.is_forbidden("/new/page"));

        // readers holding the old snapshot keep a consistent view
        assert!(before.is_forbidden("/old"));
        assert!(!before.is_forbidden("/new/page"));
    }

    #[test]
    fn test_reload_of_broken_file_clears_rules() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blacklist.json");
        fs::write(&path, r#"["/old"]"#).unwrap();

        let guard = AccessGuard::load(&path);
        fs::write(&path, "[").unwrap();
        assert!(guard.reload());
        assert!(!guard.is_forbidden("/old"));
    }
}
