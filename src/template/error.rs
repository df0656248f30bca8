//! Per-tag template failures.
//!
//! None of these abort a document: each one replaces the offending tag with
//! an HTML comment produced by [`TemplateError::to_comment`].

use compact_str::CompactString;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Invalid JSON: {0}")]
    PayloadInvalid(#[from] serde_json::Error),

    #[error("Template {0}.md not found")]
    NotFound(CompactString),

    #[error("Template {0}.md read error ({1})")]
    Read(CompactString, #[source] io::Error),

    #[error("Template {name}.md recursion ({chain})")]
    Recursion { name: CompactString, chain: String },

    #[error("Template {0}.md nested too deep")]
    TooDeep(CompactString),
}

impl TemplateError {
    /// Inline diagnostic substituted for the failed tag.
    pub fn to_comment(&self) -> String {
        // `--` would terminate the comment early
        let mut message = self.to_string();
        while message.contains("--") {
            message = message.replace("--", "- -");
        }
        format!("<!-- {message} -->")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comments() {
        assert_eq!(
            TemplateError::NotFound("box".into()).to_comment(),
            "<!-- Template box.md not found -->"
        );
        assert_eq!(
            TemplateError::TooDeep("box".into()).to_comment(),
            "<!-- Template box.md nested too deep -->"
        );

        let err = TemplateError::Recursion {
            name: "a".into(),
            chain: "a -> b -> a".into(),
        };
        assert_eq!(err.to_comment(), "<!-- Template a.md recursion (a -> b -> a) -->");
    }

    #[test]
    fn test_read_error_keeps_cause() {
        let err = TemplateError::Read(
            "box".into(),
            io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
        );
        assert_eq!(
            err.to_comment(),
            "<!-- Template box.md read error (permission denied) -->"
        );
    }

    #[test]
    fn test_comment_cannot_be_closed_early() {
        let comment = TemplateError::NotFound("--><b>x</b><!--".into()).to_comment();
        assert_eq!(comment.matches("-->").count(), 1);
        assert!(comment.ends_with(" -->"));
    }
}
