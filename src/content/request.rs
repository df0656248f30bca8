//! Normalized request paths.

use compact_str::CompactString;
use std::fmt;

/// A normalized URL path.
///
/// Built once per request: query string removed, percent-decoding applied,
/// empty segments dropped. The result always starts with `/` and never ends
/// with one, except for the root path itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestPath(CompactString);

impl RequestPath {
    /// Build from a raw request URL such as `/blog/post/?t=1`.
    pub fn from_url(url: &str) -> Self {
        let path = url.split(['?', '#']).next().unwrap_or_default();
        let decoded = urlencoding::decode(path).unwrap_or(std::borrow::Cow::Borrowed(path));
        Self::normalize(&decoded)
    }

    /// Build from an already-decoded path.
    pub fn normalize(path: &str) -> Self {
        let mut out = CompactString::with_capacity(path.len() + 1);
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            out.push('/');
            out.push_str(segment);
        }
        if out.is_empty() {
            out.push('/');
        }
        Self(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// The path without its leading slash, relative to the content root.
    pub fn relative(&self) -> &str {
        &self.0[1..]
    }

    /// The path with `.` and `..` segments collapsed, clamped at the root.
    ///
    /// This is the content location the path names when it stays inside the
    /// root, so blacklist checks use this form.
    pub fn without_dot_segments(&self) -> Self {
        let mut segments: Vec<&str> = Vec::new();
        for segment in self.relative().split('/') {
            match segment {
                "." => {}
                ".." => {
                    segments.pop();
                }
                other => segments.push(other),
            }
        }
        Self::normalize(&segments.join("/"))
    }

    /// The final path segment, if any.
    pub fn last_segment(&self) -> Option<&str> {
        self.relative().rsplit('/').next().filter(|s| !s.is_empty())
    }
}

impl fmt::Display for RequestPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
