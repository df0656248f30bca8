//! Page shell and title.

use crate::{config::SiteConfig, content::RequestPath};

/// Shell wrapped around every rendered document (embedded at compile time)
const PAGE_TEMPLATE: &str = include_str!("../embed/page.html");

/// Title for a request path.
///
/// The last path segment with a trailing `.md` removed and its first letter
/// capitalized; the root path gets `landing_title`.
pub fn page_title(request: &RequestPath, landing_title: &str) -> String {
    let Some(segment) = request.last_segment() else {
        return landing_title.to_owned();
    };
    let stem = segment.strip_suffix(".md").unwrap_or(segment);

    let mut chars = stem.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => landing_title.to_owned(),
    }
}

/// Wrap rendered markdown in the page shell.
pub fn wrap_page(content: &str, title: &str, config: &SiteConfig) -> String {
    let (head, tail) = PAGE_TEMPLATE
        .split_once("{content}")
        .unwrap_or((PAGE_TEMPLATE, ""));

    let head = head
        .replace("{lang}", &html_escape::encode_double_quoted_attribute(&config.base.language))
        .replace(
            "{stylesheet}",
            &html_escape::encode_double_quoted_attribute(&config.base.stylesheet),
        )
        .replace("{title}", &html_escape::encode_text(title));

    let mut page = String::with_capacity(head.len() + content.len() + tail.len());
    page.push_str(&head);
    page.push_str(content);
    page.push_str(tail);
    page
}
