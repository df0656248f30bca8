//! Errors raised while loading `mdpress.toml`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("malformed mdpress.toml")]
    Toml(#[from] toml::de::Error),

    /// A value parsed but cannot be served with.
    #[error("invalid config: {0}")]
    Validation(String),
}
