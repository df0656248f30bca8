//! Relative image and link references.
//!
//! Documents refer to their images and attachments relative to their own
//! location (`../img/x.png`). Pages are served from URLs that do not mirror
//! that layout, so such references are turned into server-rooted asset
//! URLs: `<assets_prefix>/<path relative to the project root>`.
//!
//! Only files below the content root or the public root can be addressed.
//! Anything resolving elsewhere is replaced by `#`.

use crate::{config::SiteConfig, content::sandbox, log};
use regex::Regex;
use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

/// `http:`, `mailto:`, `data:` ...
static SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").unwrap());

/// Rewrites references found in one document.
#[derive(Debug, Clone)]
pub struct ReferenceRewriter<'a> {
    project_root: &'a Path,
    roots: [&'a Path; 2],
    assets_prefix: &'a str,
    doc_dir: PathBuf,
}

impl<'a> ReferenceRewriter<'a> {
    pub fn new(
        project_root: &'a Path,
        content_root: &'a Path,
        public_root: &'a Path,
        assets_prefix: &'a str,
        doc_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            project_root,
            roots: [content_root, public_root],
            assets_prefix,
            doc_dir: doc_dir.into(),
        }
    }

    /// Rewriter for references inside `document`.
    pub fn for_document(config: &'a SiteConfig, document: &Path) -> Self {
        Self::new(
            &config.root,
            &config.content.root,
            &config.content.public,
            &config.serve.assets_prefix,
            document.parent().unwrap_or(config.content.root.as_path()),
        )
    }

    /// References left exactly as written.
    fn is_passthrough(reference: &str) -> bool {
        if reference.is_empty()
            || reference.starts_with('/')
            || reference.starts_with('#')
            || SCHEME_RE.is_match(reference)
        {
            return true;
        }
        let (path, _) = split_suffix(reference);
        path.len()
            .checked_sub(3)
            .and_then(|start| path.get(start..))
            .is_some_and(|ext| ext.eq_ignore_ascii_case(".md"))
    }

    pub fn rewrite(&self, reference: &str) -> String {
        if Self::is_passthrough(reference) {
            return reference.to_owned();
        }

        let (path, suffix) = split_suffix(reference);
        let decoded = urlencoding::decode(path)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| path.to_owned());
        let candidate = sandbox::normalize_lexically(&self.doc_dir.join(&decoded));

        let relative = sandbox::is_within_any(&self.roots, &candidate)
            .then(|| candidate.strip_prefix(self.project_root).ok())
            .flatten();

        match relative {
            Some(relative) => format!("{}/{}{suffix}", self.assets_prefix, encode_path(relative)),
            None => {
                log!("render"; "reference `{reference}` in {} leaves the content roots", self.doc_dir.display());
                "#".to_owned()
            }
        }
    }
}

/// Split `path?query#fragment` into the path and the rest.
fn split_suffix(reference: &str) -> (&str, &str) {
    match reference.find(['?', '#']) {
        Some(pos) => reference.split_at(pos),
        None => (reference, ""),
    }
}

/// Percent-encode each component and join with `/`.
fn encode_path(path: &Path) -> String {
    path.components()
        .map(|c| urlencoding::encode(&c.as_os_str().to_string_lossy()).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
