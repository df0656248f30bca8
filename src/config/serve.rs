//! `[serve]` section configuration.
//!
//! Contains HTTP server settings.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[serve]` section in mdpress.toml - HTTP server settings.
///
/// # Example
/// ```toml
/// [serve]
/// interface = "0.0.0.0"  # Listen on all interfaces
/// port = 3000
/// workers = 8            # 0 = one per CPU
/// watch = true           # Reload blacklist.json on change
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    #[serde(default = "defaults::serve::interface")]
    #[educe(Default = defaults::serve::interface())]
    pub interface: String,

    /// HTTP port number (default: 3000).
    #[serde(default = "defaults::serve::port")]
    #[educe(Default = defaults::serve::port())]
    pub port: u16,

    /// Request worker threads; 0 picks the available parallelism.
    #[serde(default = "defaults::serve::workers")]
    #[educe(Default = defaults::serve::workers())]
    pub workers: usize,

    /// Watch the blacklist file and reload it on change.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub watch: bool,

    /// URL prefix for raw files referenced from documents.
    #[serde(default = "defaults::serve::assets_prefix")]
    #[educe(Default = defaults::serve::assets_prefix())]
    pub assets_prefix: String,

    /// URL prefix for media files looked up by base name.
    #[serde(default = "defaults::serve::media_prefix")]
    #[educe(Default = defaults::serve::media_prefix())]
    pub media_prefix: String,

    /// Extensions tried, in order, for media requests without one.
    #[serde(default = "defaults::serve::media_extensions")]
    #[educe(Default = defaults::serve::media_extensions())]
    pub media_extensions: Vec<String>,
}

impl ServeConfig {
    /// Number of worker threads to spawn.
    pub fn worker_count(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism().map_or(4, std::num::NonZeroUsize::get)
    }
}
