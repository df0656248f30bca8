//! Fenced code block highlighting.
//!
//! Highlighters emit class-based markup (`hl-` prefixed syntect scopes); the
//! matching stylesheet is served from `/highlight.css`.

use crate::log;
use std::sync::{LazyLock, OnceLock};
use syntect::{
    highlighting::ThemeSet,
    html::{ClassStyle, ClassedHTMLGenerator, css_for_theme_with_class_style},
    parsing::SyntaxSet,
    util::LinesWithEndings,
};
use thiserror::Error;

const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "hl-" };

/// Theme used for the generated stylesheet.
const THEME: &str = "InspiredGitHub";

static SYNTAXES: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);

static HIGHLIGHT_CSS: OnceLock<String> = OnceLock::new();

#[derive(Debug, Error)]
pub enum HighlightError {
    #[error("syntax highlighting failed: {0}")]
    Syntect(#[from] syntect::Error),
}

/// Turns source code into highlighted HTML (the inside of `<code>`).
pub trait Highlighter: Send + Sync {
    fn highlight(&self, code: &str, lang: &str) -> Result<String, HighlightError>;
}

/// Highlighting with syntect's bundled syntaxes.
///
/// Unknown language hints are highlighted as plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntectHighlighter;

impl Highlighter for SyntectHighlighter {
    fn highlight(&self, code: &str, lang: &str) -> Result<String, HighlightError> {
        let syntaxes = &*SYNTAXES;
        let syntax = syntaxes
            .find_syntax_by_token(lang)
            .unwrap_or_else(|| syntaxes.find_syntax_plain_text());

        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, syntaxes, CLASS_STYLE);
        for line in LinesWithEndings::from(code) {
            generator.parse_html_for_line_which_includes_newline(line)?;
        }
        Ok(generator.finalize())
    }
}

/// Escapes code without highlighting, used when `[render].highlight` is off.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainHighlighter;

impl Highlighter for PlainHighlighter {
    fn highlight(&self, code: &str, _lang: &str) -> Result<String, HighlightError> {
        Ok(html_escape::encode_text(code).into_owned())
    }
}

/// Complete `<pre><code>` block for a fenced code block.
///
/// Highlighter failures fall back to the escaped source.
pub fn code_block_html(code: &str, lang: &str, highlighter: &dyn Highlighter) -> String {
    let body = if lang.is_empty() {
        html_escape::encode_text(code).into_owned()
    } else {
        highlighter.highlight(code, lang).unwrap_or_else(|err| {
            log!("render"; "highlight `{lang}`: {err}");
            html_escape::encode_text(code).into_owned()
        })
    };

    if lang.is_empty() {
        format!("<pre><code>{body}</code></pre>\n")
    } else {
        let lang = html_escape::encode_double_quoted_attribute(lang);
        format!("<pre><code class=\"hljs language-{lang}\">{body}</code></pre>\n")
    }
}

/// Stylesheet for the `hl-` classes.
pub fn highlight_css() -> &'static str {
    HIGHLIGHT_CSS.get_or_init(|| {
        let themes = ThemeSet::load_defaults();
        themes
            .themes
            .get(THEME)
            .or_else(|| themes.themes.values().next())
            .and_then(|theme| css_for_theme_with_class_style(theme, CLASS_STYLE).ok())
            .unwrap_or_default()
    })
}
