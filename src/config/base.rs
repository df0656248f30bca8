//! `[base]` section configuration.
//!
//! Page shell settings shared by every rendered document.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[base]` section in mdpress.toml - page shell metadata.
///
/// # Example
/// ```toml
/// [base]
/// landing_title = "Welcome"
/// language = "en"
/// stylesheet = "style_2.css"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BaseConfig {
    /// Page title used for the root path `/`.
    #[serde(default = "defaults::base::landing_title")]
    #[educe(Default = defaults::base::landing_title())]
    pub landing_title: String,

    /// BCP 47 language code placed on the `<html>` element.
    #[serde(default = "defaults::base::language")]
    #[educe(Default = defaults::base::language())]
    pub language: String,

    /// Stylesheet file name inside the public directory, served at `/<stylesheet>`.
    #[serde(default = "defaults::base::stylesheet")]
    #[educe(Default = defaults::base::stylesheet())]
    pub stylesheet: String,
}
