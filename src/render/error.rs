//! Page-level outcomes that replace a rendered document.

use thiserror::Error;

/// Why a request did not produce a page.
///
/// Clients never see these messages: every variant is answered with the
/// not-found page body and the status from [`PageError::status`].
#[derive(Debug, Error)]
pub enum PageError {
    #[error("path resolves outside the content root")]
    SandboxViolation,

    #[error("document not found")]
    NotFoundDocument,

    #[error("category index not found")]
    NotFoundIndex,

    #[error("render failed")]
    Render(#[source] anyhow::Error),
}

impl PageError {
    /// HTTP status sent for this outcome.
    pub fn status(&self) -> u16 {
        match self {
            Self::SandboxViolation | Self::NotFoundDocument | Self::NotFoundIndex => 404,
            Self::Render(_) => 500,
        }
    }
}
