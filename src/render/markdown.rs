//! Markdown to HTML with reference and code block hooks.

use super::{
    highlight::{Highlighter, code_block_html},
    rewrite::ReferenceRewriter,
};
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd, html::push_html};

/// GFM-style extensions.
fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES
}

struct CodeBlock {
    lang: String,
    source: String,
}

/// Language hint of a fenced block: the first token of its info string.
fn fence_language(info: &str) -> &str {
    info.split(|c: char| c.is_whitespace() || c == ',')
        .next()
        .unwrap_or_default()
}

/// Render `markdown`, routing image and link targets through `rewriter`
/// and code blocks through `highlighter`.
pub fn to_html(
    markdown: &str,
    highlighter: &dyn Highlighter,
    rewriter: &ReferenceRewriter<'_>,
) -> String {
    let mut events = Vec::new();
    let mut code: Option<CodeBlock> = None;

    for event in Parser::new_ext(markdown, options()) {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let lang = match &kind {
                    CodeBlockKind::Fenced(info) => fence_language(info).to_owned(),
                    CodeBlockKind::Indented => String::new(),
                };
                code = Some(CodeBlock {
                    lang,
                    source: String::new(),
                });
            }
            Event::Text(text) if code.is_some() => {
                if let Some(block) = code.as_mut() {
                    block.source.push_str(&text);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some(block) = code.take() {
                    let html = code_block_html(&block.source, &block.lang, highlighter);
                    events.push(Event::Html(html.into()));
                }
            }
            Event::Start(Tag::Image {
                link_type,
                dest_url,
                title,
                id,
            }) => events.push(Event::Start(Tag::Image {
                link_type,
                dest_url: rewriter.rewrite(&dest_url).into(),
                title,
                id,
            })),
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            }) => events.push(Event::Start(Tag::Link {
                link_type,
                dest_url: rewriter.rewrite(&dest_url).into(),
                title,
                id,
            })),
            other => events.push(other),
        }
    }

    let mut html = String::with_capacity(markdown.len() * 3 / 2);
    push_html(&mut html, events.into_iter());
    html
}
