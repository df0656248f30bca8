//! `[render]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[render]` section in mdpress.toml - document pipeline settings.
///
/// # Example
/// ```toml
/// [render]
/// max_template_depth = 8
/// max_expansions = 256
/// math = true
/// highlight = true
/// minify = false
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Maximum nesting of templates inside templates.
    #[serde(default = "defaults::render::max_template_depth")]
    #[educe(Default = defaults::render::max_template_depth())]
    pub max_template_depth: usize,

    /// Maximum tag substitutions performed for a single document.
    #[serde(default = "defaults::render::max_expansions")]
    #[educe(Default = defaults::render::max_expansions())]
    pub max_expansions: usize,

    /// Render `$...$` and `$$...$$` spans.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub math: bool,

    /// Syntax-highlight fenced code blocks.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub highlight: bool,

    /// Minify the final page.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub minify: bool,
}
