//! Document pipeline: source files to a complete HTML page.
//!
//! # Pipeline
//!
//! ```text
//! header.md ─┐                ┌─ expand ─┐
//! main.md   ─┼─ rayon::join ──┼─ expand ─┼─ concat ── math ── markdown ── shell ── minify?
//! footer.md ─┘                └─ expand ─┘               (highlight, rewrite)
//! ```
//!
//! Nothing is cached: every request re-reads and re-renders its files.

mod error;
pub mod highlight;
mod markdown;
pub mod math;
mod page;
pub mod rewrite;

pub use error::PageError;
pub use highlight::{Highlighter, PlainHighlighter, SyntectHighlighter, highlight_css};
pub use math::{KatexMarkup, MathRenderer};
pub use page::page_title;
pub use rewrite::ReferenceRewriter;

use crate::{config::SiteConfig, content::RequestPath, log, template::TemplateExpander};
use anyhow::Context;
use std::{fs, io, path::Path, sync::Arc};

/// Renders documents for one site configuration.
pub struct Renderer {
    config: Arc<SiteConfig>,
    expander: TemplateExpander,
    highlighter: Box<dyn Highlighter>,
    math: Box<dyn MathRenderer>,
}

impl Renderer {
    /// Renderer with the default backends, honoring `[render].highlight`.
    pub fn new(config: Arc<SiteConfig>) -> Self {
        let highlighter: Box<dyn Highlighter> = if config.render.highlight {
            Box::new(SyntectHighlighter)
        } else {
            Box::new(PlainHighlighter)
        };
        Self::with_backends(config, highlighter, Box::new(KatexMarkup))
    }

    pub fn with_backends(
        config: Arc<SiteConfig>,
        highlighter: Box<dyn Highlighter>,
        math: Box<dyn MathRenderer>,
    ) -> Self {
        Self {
            expander: TemplateExpander::from_config(&config),
            config,
            highlighter,
            math,
        }
    }

    /// Render `document` as the page for `request`.
    ///
    /// A missing document is [`PageError::NotFoundDocument`]; header and
    /// footer are optional.
    pub fn render(&self, document: &Path, request: &RequestPath) -> Result<String, PageError> {
        let header_path = self.config.content.header_path();
        let footer_path = self.config.content.footer_path();

        let (main, (header, footer)) = rayon::join(
            || fs::read_to_string(document),
            || {
                rayon::join(
                    || read_optional(&header_path),
                    || read_optional(&footer_path),
                )
            },
        );
        let main = main.map_err(|err| match err.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::NotADirectory => PageError::NotFoundDocument,
            _ if document.is_dir() => PageError::NotFoundDocument,
            _ => PageError::Render(
                anyhow::Error::new(err).context(format!("cannot read {}", document.display())),
            ),
        })?;

        let header = self.expander.expand(&header, &header_path);
        let main = self.expander.expand(&main, document);
        let footer = self.expander.expand(&footer, &footer_path);
        let mut source = format!("{header}\n\n{main}\n\n{footer}");

        if self.config.render.math {
            source = math::render_math(&source, self.math.as_ref());
        }

        let rewriter = ReferenceRewriter::for_document(&self.config, document);
        let body = markdown::to_html(&source, self.highlighter.as_ref(), &rewriter);

        let title = page_title(request, &self.config.base.landing_title);
        let html = page::wrap_page(&body, &title, &self.config);

        if self.config.render.minify {
            minify(&html).map_err(PageError::Render)
        } else {
            Ok(html)
        }
    }
}

/// Header and footer: a missing file is an empty fragment.
fn read_optional(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|err| {
        if err.kind() != io::ErrorKind::NotFound {
            log!("render"; "cannot read {}: {err}", path.display());
        }
        String::new()
    })
}

/// Minify a page with `minify_html`, keeping comments (template diagnostics).
fn minify(html: &str) -> anyhow::Result<String> {
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = true;
    cfg.minify_css = true;
    cfg.minify_js = true;
    cfg.remove_bangs = false;
    cfg.remove_processing_instructions = true;

    let minified = minify_html::minify(html.as_bytes(), &cfg);
    String::from_utf8(minified).context("minified page is not valid UTF-8")
}
