//! Recursive template tag expansion.
//!
//! Documents embed fragments with `!{{name}{payload}}`, where `name` selects
//! `<templates>/<name>.md` and `payload` is a JSON object (braces optional)
//! whose keys fill `{{key}}` placeholders in the fragment.
//!
//! # Expansion
//!
//! ```text
//! text ──scan──▶ tag ──parse payload──▶ params
//!                 │
//!                 └──read name.md──▶ body ──expand(body)──▶ params.apply(body)
//!                                                               │
//! text[tag] ◀──────────────── substitute ◀──────────────────────┘
//! ```
//!
//! Tags are handled left to right. After a substitution the scan restarts at
//! the first remaining `!{{`, so tags produced by placeholder values, or
//! completed by them, are expanded as well. A fragment's own tags are
//! expanded before its placeholders are filled.
//!
//! Failures never abort the document: the tag is replaced by an HTML comment
//! (see [`TemplateError`]). Cycles, nesting beyond the configured depth, and
//! documents exceeding the substitution budget all end in a comment too.

mod error;
mod params;

pub use error::TemplateError;
pub use params::Params;

use crate::{config::SiteConfig, content::sandbox, log};
use compact_str::CompactString;
use regex::Regex;
use smallvec::SmallVec;
use std::{
    fs, io,
    ops::Range,
    path::{Path, PathBuf},
    sync::LazyLock,
};

/// `!{{name}{payload}}`; payload is non-greedy and may span lines.
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)!\{\{([^}]+?)\}\{(.*?)\}\}").unwrap());

/// Inserted once, before the first tag left unexpanded.
const LIMIT_COMMENT: &str = "<!-- Template expansion limit reached -->";

/// One tag occurrence, detached from the text it was found in.
struct Tag {
    range: Range<usize>,
    name: CompactString,
    payload: String,
}

fn next_tag(text: &str, from: usize) -> Option<Tag> {
    let caps = TAG_RE.captures_at(text, from)?;
    let whole = caps.get(0)?;
    Some(Tag {
        range: whole.range(),
        name: caps[1].into(),
        payload: caps[2].to_owned(),
    })
}

/// Where an expansion happens: the file being expanded and the chain of
/// template names that led to it.
pub struct ExpansionContext<'a> {
    document: &'a Path,
    chain: SmallVec<[CompactString; 8]>,
}

impl<'a> ExpansionContext<'a> {
    pub fn new(document: &'a Path) -> Self {
        Self {
            document,
            chain: SmallVec::new(),
        }
    }

    pub fn depth(&self) -> usize {
        self.chain.len()
    }

    fn contains(&self, name: &str) -> bool {
        self.chain.iter().any(|n| n == name)
    }

    fn enter<'b>(&self, name: &str, template: &'b Path) -> ExpansionContext<'b> {
        let mut chain = self.chain.clone();
        chain.push(name.into());
        ExpansionContext {
            document: template,
            chain,
        }
    }

    /// `a -> b -> name`
    fn describe_cycle(&self, name: &str) -> String {
        self.chain
            .iter()
            .map(CompactString::as_str)
            .chain(std::iter::once(name))
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

/// Substitutions performed so far for one top-level document.
#[derive(Default)]
struct Budget {
    used: usize,
    exhausted: bool,
}

/// Expands template tags against a templates directory.
#[derive(Debug, Clone)]
pub struct TemplateExpander {
    templates: PathBuf,
    max_depth: usize,
    max_expansions: usize,
}

impl TemplateExpander {
    pub fn new(templates: impl Into<PathBuf>, max_depth: usize, max_expansions: usize) -> Self {
        Self {
            templates: templates.into(),
            max_depth,
            max_expansions,
        }
    }

    pub fn from_config(config: &SiteConfig) -> Self {
        Self::new(
            &config.content.templates,
            config.render.max_template_depth,
            config.render.max_expansions,
        )
    }

    /// Expand every tag in `text`, which was read from `document`.
    pub fn expand(&self, text: &str, document: &Path) -> String {
        let mut budget = Budget::default();
        self.expand_in(text, &ExpansionContext::new(document), &mut budget)
    }

    fn expand_in(&self, text: &str, ctx: &ExpansionContext<'_>, budget: &mut Budget) -> String {
        let mut out = text.to_owned();
        let mut cursor = 0;

        while let Some(tag) = next_tag(&out, cursor) {
            if budget.used >= self.max_expansions {
                if !budget.exhausted {
                    budget.exhausted = true;
                    log!("template"; "{}: expansion limit of {} reached", ctx.document.display(), self.max_expansions);
                    out.insert_str(tag.range.start, LIMIT_COMMENT);
                }
                break;
            }
            budget.used += 1;

            let replacement = match self.expand_tag(&tag, ctx, budget) {
                Ok(body) => body,
                Err(err) => {
                    log!("template"; "{}: {err}", ctx.document.display());
                    err.to_comment()
                }
            };
            out.replace_range(tag.range.clone(), &replacement);
            // an opener left of the substitution may now be closed by it
            cursor = out.find("!{{").unwrap_or(out.len());
        }

        out
    }

    fn expand_tag(
        &self,
        tag: &Tag,
        ctx: &ExpansionContext<'_>,
        budget: &mut Budget,
    ) -> Result<String, TemplateError> {
        let params = Params::parse(&tag.payload)?;
        let name = tag.name.as_str();

        if ctx.contains(name) {
            return Err(TemplateError::Recursion {
                name: name.into(),
                chain: ctx.describe_cycle(name),
            });
        }
        if ctx.depth() >= self.max_depth {
            return Err(TemplateError::TooDeep(name.into()));
        }

        let path = self
            .template_path(name)
            .ok_or_else(|| TemplateError::NotFound(name.into()))?;
        let body = fs::read_to_string(&path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => TemplateError::NotFound(name.into()),
            _ => TemplateError::Read(name.into(), err),
        })?;

        let body = self.expand_in(&body, &ctx.enter(name, &path), budget);
        Ok(params.apply(&body))
    }

    /// `<templates>/<name>.md`, if `name` is a plain file stem inside the
    /// templates directory.
    fn template_path(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
            return None;
        }
        sandbox::confine(&self.templates, &self.templates.join(format!("{name}.md")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        templates: PathBuf,
        expander: TemplateExpander,
    }

    impl Fixture {
        fn template(&self, name: &str, body: &str) -> &Self {
            fs::write(self.templates.join(format!("{name}.md")), body).unwrap();
            self
        }

        fn expand(&self, text: &str) -> String {
            self.expander.expand(text, Path::new("/doc.md"))
        }
    }

    fn fixture_with_limits(max_depth: usize, max_expansions: usize) -> Fixture {
        let dir = TempDir::new().unwrap();
        let templates = dir.path().canonicalize().unwrap().join("template");
        fs::create_dir(&templates).unwrap();
        Fixture {
            _dir: dir,
            expander: TemplateExpander::new(&templates, max_depth, max_expansions),
            templates,
        }
    }

    fn fixture() -> Fixture {
        fixture_with_limits(16, 1024)
    }

    #[test]
    fn test_text_without_tags_is_unchanged() {
        let fx = fixture();
        let text = "# Title\n\nSome {{braces}} and !{not a tag} text.\n";
        assert_eq!(fx.expand(text), text);
    }

    #[test]
    fn test_simple_substitution() {
        let fx = fixture();
        fx.template("box", "<div class=\"box\">{{title}}: {{body}}</div>");

        assert_eq!(
            fx.expand(r#"a !{{box}{"title": "Note", "body": "hi"}} b"#),
            r#"a <div class="box">Note: hi</div> b"#
        );
    }

    #[test]
    fn test_empty_payload_leaves_placeholders() {
        let fx = fixture();
        fx.template("box", "[{{title}}]");

        assert_eq!(fx.expand("!{{box}{}}"), "[{{title}}]");
        assert_eq!(fx.expand("!{{box}{  }}"), "[{{title}}]");
    }

    #[test]
    fn test_multiline_payload() {
        let fx = fixture();
        fx.template("card", "{{a}}/{{b}}");

        assert_eq!(fx.expand("!{{card}{\n  \"a\": 1,\n  \"b\": false\n}}"), "1/false");
    }

    #[test]
    fn test_multiple_tags_left_to_right() {
        let fx = fixture();
        fx.template("x", "X{{n}}");

        assert_eq!(
            fx.expand(r#"!{{x}{"n": 1}} - !{{x}{"n": 2}} - !{{x}{"n": 3}}"#),
            "X1 - X2 - X3"
        );
    }

    #[test]
    fn test_nested_templates_expand_first() {
        let fx = fixture();
        fx.template("inner", "<i>inner</i>");
        fx.template("outer", "<o>!{{inner}{}} {{label}}</o>");

        assert_eq!(
            fx.expand(r#"!{{outer}{"label": "L"}}"#),
            "<o><i>inner</i> L</o>"
        );
    }

    #[test]
    fn test_tags_introduced_by_values_are_expanded() {
        let fx = fixture();
        fx.template("wrap", "<w>{{content}}</w>");
        fx.template("leaf", "leaf");

        // `}}` cannot appear raw inside a payload, but JSON escapes can produce it
        assert_eq!(
            fx.expand(r#"!{{wrap}{"content": "!{{leaf}{\u007d\u007d"}}"#),
            "<w>leaf</w>"
        );
        // an incomplete tag in a value stays literal
        assert_eq!(
            fx.expand(r#"!{{wrap}{"content": "!{{leaf}{"}}"#),
            "<w>!{{leaf}{</w>"
        );
    }

    #[test]
    fn test_substitution_completes_earlier_opener() {
        let fx = fixture();
        fx.template("a", r#"{"v": 1}}"#);
        fx.template("z", "Z{{v}}");

        // `!{{z}` only becomes a tag once `a` has been substituted after it
        assert_eq!(fx.expand("!{{z}!{{a}{}}"), "Z1");
        assert_eq!(fx.expand("x !{{z}!{{a}{}} y"), "x Z1 y");
    }

    #[test]
    fn test_invalid_json_becomes_comment() {
        let fx = fixture();
        fx.template("box", "BOX");

        let out = fx.expand("before !{{box}{not json}} after !{{box}{}}");
        assert!(out.starts_with("before <!-- Invalid JSON: "), "{out}");
        assert!(out.ends_with(" --> after BOX"), "{out}");
    }

    #[test]
    fn test_missing_template_becomes_comment() {
        let fx = fixture();
        assert_eq!(
            fx.expand("x !{{nope}{}} y"),
            "x <!-- Template nope.md not found --> y"
        );
    }

    #[test]
    fn test_path_like_names_are_not_found() {
        let fx = fixture();
        fs::write(fx.templates.parent().unwrap().join("secret.md"), "SECRET").unwrap();

        for name in ["../secret", "a/b", "..", "."] {
            let out = fx.expand(&format!("!{{{{{name}}}{{}}}}"));
            assert!(!out.contains("SECRET"), "{name}: {out}");
            assert!(out.contains("not found"), "{name}: {out}");
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_read_error_is_distinguished() {
        let fx = fixture();
        // a directory named like a template cannot be read as a file
        fs::create_dir(fx.templates.join("dir.md")).unwrap();

        let out = fx.expand("!{{dir}{}}");
        assert!(out.starts_with("<!-- Template dir.md read error ("), "{out}");
    }

    #[test]
    fn test_self_reference_terminates() {
        let fx = fixture();
        fx.template("loop", "L !{{loop}{}}");

        assert_eq!(
            fx.expand("!{{loop}{}}"),
            "L <!-- Template loop.md recursion (loop -> loop) -->"
        );
    }

    #[test]
    fn test_indirect_cycle_terminates() {
        let fx = fixture();
        fx.template("a", "A(!{{b}{}})");
        fx.template("b", "B(!{{a}{}})");

        assert_eq!(
            fx.expand("!{{a}{}}"),
            "A(B(<!-- Template a.md recursion (a -> b -> a) -->))"
        );
    }

    #[test]
    fn test_same_template_twice_is_not_a_cycle() {
        let fx = fixture();
        fx.template("leaf", "*");
        fx.template("pair", "!{{leaf}{}}!{{leaf}{}}");

        assert_eq!(fx.expand("!{{pair}{}}"), "**");
    }

    #[test]
    fn test_depth_limit() {
        let fx = fixture_with_limits(2, 1024);
        fx.template("one", "1!{{two}{}}");
        fx.template("two", "2!{{three}{}}");
        fx.template("three", "3");

        assert_eq!(
            fx.expand("!{{one}{}}"),
            "12<!-- Template three.md nested too deep -->"
        );
    }

    #[test]
    fn test_expansion_budget() {
        let fx = fixture_with_limits(16, 2);
        fx.template("x", "x");

        assert_eq!(
            fx.expand("!{{x}{}} !{{x}{}} !{{x}{}} !{{x}{}}"),
            format!("x x {LIMIT_COMMENT}!{{{{x}}{{}}}} !{{{{x}}{{}}}}")
        );
    }
}
