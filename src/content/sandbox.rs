//! Path confinement helpers.
//!
//! Every filesystem path derived from a request or a document reference goes
//! through [`confine`] before it is touched. The check is done twice: once on
//! the lexically normalized path (`.`/`..` collapsed without touching the
//! disk) and once on its canonical form, so symlinks pointing out of the
//! root are rejected as well.

use std::path::{Component, Path, PathBuf};

/// Collapse `.` and `..` components without consulting the filesystem.
///
/// `..` at the filesystem root stays at the root.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Canonicalize the longest existing ancestor of `path` and re-append the rest.
///
/// Falls back to `path` itself when no ancestor can be canonicalized.
fn canonicalize_existing(path: &Path) -> PathBuf {
    let mut tail = Vec::new();
    let mut current = path;
    loop {
        if let Ok(canonical) = current.canonicalize() {
            return tail
                .iter()
                .rev()
                .fold(canonical, |acc: PathBuf, part| acc.join(part));
        }
        match (current.parent(), current.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name.to_os_string());
                current = parent;
            }
            _ => return path.to_path_buf(),
        }
    }
}

/// Return the normalized `path` if it stays inside `root`, `None` otherwise.
///
/// `root` must already be canonical. The root itself counts as inside.
pub fn confine(root: &Path, path: &Path) -> Option<PathBuf> {
    let normalized = normalize_lexically(path);
    if !normalized.starts_with(root) {
        return None;
    }
    canonicalize_existing(&normalized)
        .starts_with(root)
        .then_some(normalized)
}

/// Whether `path` is inside any of `roots`.
pub fn is_within_any(roots: &[&Path], path: &Path) -> bool {
    roots.iter().any(|root| confine(root, path).is_some())
}
