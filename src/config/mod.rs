//! Site configuration management for `mdpress.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                           |
//! |-------------|---------------------------------------------------|
//! | `[base]`    | Page shell (landing title, language, stylesheet)  |
//! | `[content]` | Content root, templates, public dir, blacklist    |
//! | `[render]`  | Template limits, math, highlighting, minify       |
//! | `[serve]`   | HTTP server (port, interface, workers, prefixes)  |
//!
//! # Example
//!
//! ```toml
//! [base]
//! landing_title = "Home"
//!
//! [content]
//! root = "data"
//! templates = "template"
//!
//! [render]
//! max_template_depth = 16
//!
//! [serve]
//! port = 3000
//! ```

mod base;
mod content;
pub mod defaults;
mod error;
mod render;
mod serve;

pub use base::BaseConfig;
pub use content::ContentConfig;
pub use error::ConfigError;
pub use render::RenderConfig;
pub use serve::ServeConfig;

use crate::{
    cli::{Cli, Commands},
    content::sandbox::normalize_lexically,
};
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing mdpress.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute project root (set after loading)
    #[serde(skip)]
    pub root: PathBuf,

    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Page shell settings
    #[serde(default)]
    pub base: BaseConfig,

    /// Content locations
    #[serde(default)]
    pub content: ContentConfig,

    /// Document pipeline settings
    #[serde(default)]
    pub render: RenderConfig,

    /// HTTP server settings
    #[serde(default)]
    pub serve: ServeConfig,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Load the config for a CLI invocation.
    ///
    /// A missing config file is not an error: defaults are used and every
    /// path is still resolved against the project root.
    pub fn load(cli: &Cli) -> Result<Self> {
        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        let config_path = root.join(&cli.config);

        let mut config = if config_path.exists() {
            Self::from_path(&config_path)?
        } else {
            Self::default()
        };
        config.config_path = cli.config.clone();
        config.update_with_cli(cli);
        config.resolve_paths(root);
        Ok(config)
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        if let Commands::Serve {
            interface,
            port,
            watch,
            workers,
        } = &cli.command
        {
            Self::update_option(&mut self.serve.interface, interface.as_ref());
            Self::update_option(&mut self.serve.port, port.as_ref());
            Self::update_option(&mut self.serve.watch, watch.as_ref());
            Self::update_option(&mut self.serve.workers, workers.as_ref());
        }
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Make every directory path absolute, relative to the project root.
    pub fn resolve_paths(&mut self, root: &Path) {
        let root = Self::normalize_path(root);

        self.config_path = Self::normalize_path(&root.join(&self.config_path));
        self.content.root = Self::normalize_path(&root.join(&self.content.root));
        self.content.templates = Self::normalize_path(&root.join(&self.content.templates));
        self.content.public = Self::normalize_path(&root.join(&self.content.public));
        self.content.blacklist = Self::normalize_path(&root.join(&self.content.blacklist));
        self.root = root;
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    pub fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            // For non-existent paths, manually make them absolute
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration before serving.
    pub fn validate(&self) -> Result<()> {
        if !self.content.root.is_dir() {
            bail!(ConfigError::Validation(format!(
                "[content.root] `{}` is not a directory",
                self.content.root.display()
            )));
        }

        // asset URLs are paths relative to the project root
        for (field, dir) in [
            ("[content.root]", &self.content.root),
            ("[content.public]", &self.content.public),
        ] {
            if !normalize_lexically(dir).starts_with(&self.root) {
                bail!(ConfigError::Validation(format!(
                    "{field} `{}` must be inside the project root `{}`",
                    dir.display(),
                    self.root.display()
                )));
            }
        }

        if !ContentConfig::is_bare_file_name(&self.content.category_index) {
            bail!(ConfigError::Validation(
                "[content.category_index] must be a bare file name".into()
            ));
        }

        if !ContentConfig::is_bare_file_name(&self.base.stylesheet) {
            bail!(ConfigError::Validation(
                "[base.stylesheet] must be a bare file name".into()
            ));
        }

        for (field, prefix) in [
            ("[serve.assets_prefix]", &self.serve.assets_prefix),
            ("[serve.media_prefix]", &self.serve.media_prefix),
        ] {
            if !prefix.starts_with('/') || prefix.ends_with('/') {
                bail!(ConfigError::Validation(format!(
                    "{field} must start with `/` and must not end with `/`"
                )));
            }
        }

        if self.render.max_template_depth == 0 {
            bail!(ConfigError::Validation(
                "[render.max_template_depth] must be at least 1".into()
            ));
        }

        if self.render.max_expansions == 0 {
            bail!(ConfigError::Validation(
                "[render.max_expansions] must be at least 1".into()
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
