//! `$...$` and `$$...$$` spans.
//!
//! Runs on the concatenated markdown source before it is parsed. Display
//! spans are replaced first so their `$$` delimiters are never taken apart
//! by the inline pass. Fenced code blocks are left alone.
//!
//! Rendered output is encoded with numeric character references, which
//! keeps markdown from interpreting `*`, `_`, `\` and friends inside an
//! expression and keeps `$` out of the way of later passes.

use crate::log;
use regex::{Captures, Regex};
use std::{fmt::Write, sync::LazyLock};
use thiserror::Error;

/// `$$ ... $$`, may span lines.
static DISPLAY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\$\$(.+?)\$\$").unwrap());

/// `$ ... $` on a single line.
static INLINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$(.+?)\$").unwrap());

#[derive(Debug, Error)]
pub enum MathError {
    #[error("empty expression")]
    Empty,

    #[error("unbalanced braces")]
    UnbalancedBraces,
}

/// Turns a TeX expression into HTML.
pub trait MathRenderer: Send + Sync {
    fn render(&self, expr: &str, display: bool) -> Result<String, MathError>;
}

/// Markup picked up by KaTeX auto-render in the browser.
///
/// Inline spans become `<span class="math math-inline">\(..\)</span>`,
/// display spans `<div class="math math-display">\[..\]</div>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct KatexMarkup;

impl MathRenderer for KatexMarkup {
    fn render(&self, expr: &str, display: bool) -> Result<String, MathError> {
        let expr = expr.trim();
        if expr.is_empty() {
            return Err(MathError::Empty);
        }
        check_braces(expr)?;

        Ok(if display {
            format!(
                r#"<div class="math math-display">{}</div>"#,
                encode_entities(&format!(r"\[{expr}\]"))
            )
        } else {
            format!(
                r#"<span class="math math-inline">{}</span>"#,
                encode_entities(&format!(r"\({expr}\)"))
            )
        })
    }
}

/// `{` and `}` must pair up, ignoring `\{` and `\}`.
fn check_braces(expr: &str) -> Result<(), MathError> {
    let mut depth = 0usize;
    let mut chars = expr.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '{' => depth += 1,
            '}' => depth = depth.checked_sub(1).ok_or(MathError::UnbalancedBraces)?,
            _ => {}
        }
    }
    if depth == 0 {
        Ok(())
    } else {
        Err(MathError::UnbalancedBraces)
    }
}

/// Escape HTML and every character markdown would act on.
fn encode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    for c in text.chars() {
        match c {
            '&' | '<' | '>' | '"' | '\'' | '\\' | '*' | '_' | '[' | ']' | '$' | '`' | '~'
            | '|' | '\n' => {
                let _ = write!(out, "&#{};", c as u32);
            }
            '\r' => {}
            c => out.push(c),
        }
    }
    out
}

/// Escaped source shown when an expression cannot be rendered.
fn fallback(expr: &str, display: bool) -> String {
    if display {
        format!("<pre><code>{}</code></pre>", encode_entities(expr))
    } else {
        format!("<code>{}</code>", encode_entities(expr))
    }
}

fn render_span(renderer: &dyn MathRenderer, expr: &str, display: bool) -> String {
    renderer.render(expr, display).unwrap_or_else(|err| {
        log!("render"; "math `{}`: {err}", expr.trim());
        fallback(expr, display)
    })
}

fn render_prose(text: &str, renderer: &dyn MathRenderer) -> String {
    if !text.contains('$') {
        return text.to_owned();
    }
    let text = DISPLAY_RE.replace_all(text, |caps: &Captures| render_span(renderer, &caps[1], true));
    INLINE_RE
        .replace_all(&text, |caps: &Captures| render_span(renderer, &caps[1], false))
        .into_owned()
}

/// Opening marker of a fenced code block, if `line` starts one.
fn fence_marker(line: &str) -> Option<&'static str> {
    let line = line.trim_start();
    if line.starts_with("```") {
        Some("```")
    } else if line.starts_with("~~~") {
        Some("~~~")
    } else {
        None
    }
}

/// Replace every math span in `text` outside fenced code.
pub fn render_math(text: &str, renderer: &dyn MathRenderer) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prose = String::new();
    let mut fence: Option<&'static str> = None;

    for line in text.split_inclusive('\n') {
        match fence {
            Some(marker) => {
                out.push_str(line);
                if line.trim_start().starts_with(marker) {
                    fence = None;
                }
            }
            None => match fence_marker(line) {
                Some(marker) => {
                    out.push_str(&render_prose(&prose, renderer));
                    prose.clear();
                    out.push_str(line);
                    fence = Some(marker);
                }
                None => prose.push_str(line),
            },
        }
    }
    out.push_str(&render_prose(&prose, renderer));
    out
}
