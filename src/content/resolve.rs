//! Request path → content location.
//!
//! Resolution order for a request path `p`:
//!
//! | Case                                | Target                              |
//! |-------------------------------------|-------------------------------------|
//! | `root/p` escapes the content root   | `NotFound`                          |
//! | `root/p` is a directory             | `Directory(root/p/<category index>)`|
//! | otherwise                           | `Document(root/p.md)`               |
//!
//! A directory always wins over a sibling `p.md`. The category index is not
//! checked for existence here; a missing index surfaces at render time.

use super::{RequestPath, sandbox};
use crate::{config::SiteConfig, log};
use std::path::PathBuf;

/// Document extension appended to file requests.
pub const DOCUMENT_EXTENSION: &str = "md";

/// Outcome of resolving a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedTarget {
    /// Directory request; holds the path of its mandatory index document.
    Directory(PathBuf),
    /// File request; holds the path of the `.md` document.
    Document(PathBuf),
    /// Escapes the sandbox or cannot name a document.
    NotFound,
}

/// Maps request paths onto the content root.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
    category_index: String,
}

impl PathResolver {
    /// `root` must be canonical.
    pub fn new(root: impl Into<PathBuf>, category_index: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            category_index: category_index.into(),
        }
    }

    pub fn from_config(config: &SiteConfig) -> Self {
        Self::new(&config.content.root, &config.content.category_index)
    }

    pub fn resolve(&self, request: &RequestPath) -> ResolvedTarget {
        let relative = request.relative();
        if relative.contains('\0') {
            return ResolvedTarget::NotFound;
        }

        let Some(candidate) = sandbox::confine(&self.root, &self.root.join(relative)) else {
            log!("resolve"; "path escape attempt prevented: {request}");
            return ResolvedTarget::NotFound;
        };

        if candidate.is_dir() {
            return ResolvedTarget::Directory(candidate.join(&self.category_index));
        }

        let mut document = candidate.into_os_string();
        document.push(".");
        document.push(DOCUMENT_EXTENSION);
        let document = PathBuf::from(document);

        match sandbox::confine(&self.root, &document) {
            Some(document) if document != self.root => ResolvedTarget::Document(document),
            _ => {
                log!("resolve"; "path escape attempt prevented: {request}");
                ResolvedTarget::NotFound
            }
        }
    }
}
