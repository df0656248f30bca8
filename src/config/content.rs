//! `[content]` section configuration.
//!
//! Locations of the content root, templates, public files and the blacklist.
//! Directory paths are relative to the project root until
//! [`SiteConfig::load`](super::SiteConfig::load) makes them absolute.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// `[content]` section in mdpress.toml.
///
/// # Example
/// ```toml
/// [content]
/// root = "data"              # Sandbox for servable documents
/// templates = "template"     # `!{{name}{...}}` fragments, header.md, footer.md
/// public = "public"          # landing.md, 404.html, stylesheet, favicon
/// blacklist = "blacklist.json"
/// category_index = "default.md"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct ContentConfig {
    /// Content root: every served document lives below it.
    #[serde(default = "defaults::content::root")]
    #[educe(Default = defaults::content::root())]
    pub root: PathBuf,

    /// Template fragment directory.
    #[serde(default = "defaults::content::templates")]
    #[educe(Default = defaults::content::templates())]
    pub templates: PathBuf,

    /// Public directory (landing page, not-found page, stylesheet, favicon).
    #[serde(default = "defaults::content::public")]
    #[educe(Default = defaults::content::public())]
    pub public: PathBuf,

    /// JSON array of forbidden request paths.
    #[serde(default = "defaults::content::blacklist")]
    #[educe(Default = defaults::content::blacklist())]
    pub blacklist: PathBuf,

    /// Mandatory index document rendered for directory requests.
    #[serde(default = "defaults::content::category_index")]
    #[educe(Default = defaults::content::category_index())]
    pub category_index: String,

    /// Landing document inside the public directory.
    #[serde(default = "defaults::content::landing")]
    #[educe(Default = defaults::content::landing())]
    pub landing: String,

    /// Not-found page inside the public directory. Must exist at startup.
    #[serde(default = "defaults::content::not_found")]
    #[educe(Default = defaults::content::not_found())]
    pub not_found: String,

    /// Header fragment inside the templates directory.
    #[serde(default = "defaults::content::header")]
    #[educe(Default = defaults::content::header())]
    pub header: String,

    /// Footer fragment inside the templates directory.
    #[serde(default = "defaults::content::footer")]
    #[educe(Default = defaults::content::footer())]
    pub footer: String,
}

impl ContentConfig {
    pub fn header_path(&self) -> PathBuf {
        self.templates.join(&self.header)
    }

    pub fn footer_path(&self) -> PathBuf {
        self.templates.join(&self.footer)
    }

    pub fn landing_path(&self) -> PathBuf {
        self.public.join(&self.landing)
    }

    pub fn not_found_path(&self) -> PathBuf {
        self.public.join(&self.not_found)
    }

    /// Whether `name` is a bare file name (no separators, no `..`).
    pub fn is_bare_file_name(name: &str) -> bool {
        !name.is_empty()
            && name != "."
            && name != ".."
            && Path::new(name).file_name().is_some_and(|n| n == name)
    }
}
