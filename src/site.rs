//! Request flow independent of HTTP.
//!
//! ```text
//! url ─▶ RequestPath ─┬─ "/" ─────────────────────────────▶ render(landing)
//!                     └─ blacklist? ─▶ resolve ─▶ target ─▶ render(document)
//! ```
//!
//! Every failure is a [`PageError`]; the HTTP layer maps it to a status and
//! answers with [`Site::not_found_page`].

use crate::{
    config::SiteConfig,
    content::{AccessGuard, PathResolver, RequestPath, ResolvedTarget, sandbox},
    log,
    render::{PageError, Renderer},
};
use std::{
    fs, io,
    path::{Component, Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("not-found page `{0}` cannot be read")]
    NotFoundPage(PathBuf, #[source] io::Error),
}

/// Everything needed to answer requests for one project.
pub struct Site {
    config: Arc<SiteConfig>,
    guard: AccessGuard,
    resolver: PathResolver,
    renderer: Renderer,
    not_found_page: String,
}

impl Site {
    /// Load the blacklist and the not-found page.
    ///
    /// The not-found page is mandatory; the blacklist is not.
    pub fn open(config: Arc<SiteConfig>) -> Result<Self, StartupError> {
        let not_found_path = config.content.not_found_path();
        let not_found_page = fs::read_to_string(&not_found_path)
            .map_err(|err| StartupError::NotFoundPage(not_found_path, err))?;

        Ok(Self {
            guard: AccessGuard::load(&config.content.blacklist),
            resolver: PathResolver::from_config(&config),
            renderer: Renderer::new(Arc::clone(&config)),
            not_found_page,
            config,
        })
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn guard(&self) -> &AccessGuard {
        &self.guard
    }

    /// Body sent with every 404 and 500 response.
    pub fn not_found_page(&self) -> &str {
        &self.not_found_page
    }

    /// Render the page for a raw request URL.
    pub fn handle(&self, url: &str) -> Result<String, PageError> {
        let request = RequestPath::from_url(url);
        if request.is_root() {
            return self
                .renderer
                .render(&self.config.content.landing_path(), &request);
        }

        if self.guard.is_forbidden(request.without_dot_segments().as_str()) {
            log!("access"; "blocked {request}");
            return Err(PageError::NotFoundDocument);
        }

        match self.resolver.resolve(&request) {
            ResolvedTarget::Directory(index) => {
                self.renderer
                    .render(&index, &request)
                    .map_err(|err| match err {
                        PageError::NotFoundDocument => PageError::NotFoundIndex,
                        other => other,
                    })
            }
            ResolvedTarget::Document(document) => self.renderer.render(&document, &request),
            ResolvedTarget::NotFound => Err(PageError::SandboxViolation),
        }
    }

    /// A raw file for `<assets_prefix>/<rel>`, where `rel` is relative to
    /// the project root.
    ///
    /// Only files under the content root or the public root are served, and
    /// content files fall under the blacklist like the pages they belong to.
    pub fn asset_file(&self, rel: &str) -> Option<PathBuf> {
        let rel = RequestPath::from_url(rel);
        if rel.is_root() || rel.relative().contains('\0') {
            return None;
        }
        let roots = [
            self.config.content.root.as_path(),
            self.config.content.public.as_path(),
        ];
        let candidate = self.config.root.join(rel.relative());
        self.servable_file(&roots, &candidate)
    }

    /// A media file for `<media_prefix>/<name>`: `name` under the content
    /// root, as given or with one of the configured media extensions.
    pub fn media_file(&self, name: &str) -> Option<PathBuf> {
        let name = RequestPath::from_url(name);
        if name.is_root() || name.relative().contains('\0') {
            return None;
        }
        let roots = [self.config.content.root.as_path()];
        let base = self.config.content.root.join(name.relative());

        std::iter::once(base.clone())
            .chain(self.config.serve.media_extensions.iter().map(|ext| {
                let mut path = base.clone().into_os_string();
                path.push(".");
                path.push(ext);
                PathBuf::from(path)
            }))
            .find_map(|candidate| self.servable_file(&roots, &candidate))
    }

    fn servable_file(&self, roots: &[&Path], candidate: &Path) -> Option<PathBuf> {
        let file = roots
            .iter()
            .find_map(|root| sandbox::confine(root, candidate))
            .filter(|path| path.is_file())?;

        if self.is_blocked_content(&file) {
            log!("access"; "blocked file {}", file.display());
            return None;
        }
        Some(file)
    }

    /// Whether a file inside the content root belongs to a blacklisted path.
    fn is_blocked_content(&self, file: &Path) -> bool {
        let Ok(inner) = file.strip_prefix(&self.config.content.root) else {
            return false;
        };
        let segments: Vec<_> = inner
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy()),
                _ => None,
            })
            .collect();
        let path = RequestPath::normalize(&segments.join("/"));
        let page = path.as_str().strip_suffix(".md").unwrap_or(path.as_str());

        self.guard.is_forbidden(path.as_str()) || self.guard.is_forbidden(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Project {
        _dir: TempDir,
        root: PathBuf,
    }

    impl Project {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let root = dir.path().canonicalize().unwrap();
            let project = Self { _dir: dir, root };

            project.write("public/404.html", "<h1>not here</h1>");
            project.write("public/landing.md", "# Welcome\n\n![logo](logo.png)");
            project.write("template/header.md", "header");
            project.write("template/box.md", "<div class=\"box\">{{text}}</div>");
            project.write("data/blog/default.md", "# Blog index");
            project.write("data/blog/post.md", "# First\n\n![x](../img/x.png)");
            project.write("data/img/x.png", "png");
            project.write("data/post.md", "post file");
            project.write("data/post/default.md", "post directory");
            project.write("data/private/diary.md", "dear diary");
            project.write("data/secret.md", "secret page");
            project.write("data/clip.webm", "webm");
            project.write("data/json.md", "before !{{box}{not json}} after\n\n!{{box}{\"text\": \"ok\"}}");
            project.write("blacklist.json", r#"["/private/", "/secret"]"#);
            project.write("outside.md", "outside");
            project.write("data/empty/other.md", "# Sibling");
            project
        }

        fn write(&self, rel: &str, text: &str) {
            let path = self.root.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, text).unwrap();
        }

        fn config(&self) -> SiteConfig {
            let mut config = SiteConfig::default();
            config.resolve_paths(&self.root);
            config
        }

        fn site(&self) -> Site {
            Site::open(Arc::new(self.config())).unwrap()
        }
    }

    #[test]
    fn test_missing_not_found_page_is_fatal() {
        let project = Project::new();
        fs::remove_file(project.root.join("public/404.html")).unwrap();

        let err = Site::open(Arc::new(project.config())).err().unwrap();
        assert!(matches!(err, StartupError::NotFoundPage(..)));
    }

    #[test]
    fn test_landing_page() {
        let project = Project::new();
        let site = project.site();
        let html = site.handle("/").unwrap();

        assert!(html.contains("<h1>Welcome</h1>"), "{html}");
        assert!(html.contains("<title>Home</title>"), "{html}");
        assert!(html.contains(r#"src="/assets/public/logo.png""#), "{html}");
        assert!(html.contains("header"), "{html}");
    }

    #[test]
    fn test_category_index() {
        let project = Project::new();
        let site = project.site();

        let html = site.handle("/blog/").unwrap();
        assert!(html.contains("<h1>Blog index</h1>"), "{html}");
        assert!(html.contains("<title>Blog</title>"), "{html}");

        // no fallback to other documents in a directory without an index
        assert!(matches!(site.handle("/empty/"), Err(PageError::NotFoundIndex)));
        assert!(matches!(site.handle("/empty"), Err(PageError::NotFoundIndex)));
        assert!(site.handle("/empty/other").unwrap().contains("<h1>Sibling</h1>"));
    }

    #[test]
    fn test_directory_wins_over_document() {
        let project = Project::new();
        let site = project.site();
        let html = site.handle("/post").unwrap();

        assert!(html.contains("post directory"), "{html}");
        assert!(!html.contains("post file"), "{html}");
    }

    #[test]
    fn test_missing_document() {
        let project = Project::new();
        let site = project.site();
        let err = site.handle("/nope").unwrap_err();
        assert!(matches!(err, PageError::NotFoundDocument));
        assert_eq!(err.status(), 404);
    }

    #[test]
    fn test_blacklist() {
        let project = Project::new();
        let site = project.site();

        for url in ["/private/diary", "/private", "/private/", "/secret", "/blog/../secret"] {
            assert!(
                matches!(site.handle(url), Err(PageError::NotFoundDocument)),
                "{url}"
            );
        }
        assert!(site.handle("/blog/post").is_ok());
    }

    #[test]
    fn test_traversal() {
        let project = Project::new();
        let site = project.site();

        for url in ["/../outside", "/%2e%2e/outside", "/blog/../../outside"] {
            let err = site.handle(url).unwrap_err();
            assert!(matches!(err, PageError::SandboxViolation), "{url}: {err}");
            assert_eq!(err.status(), 404);
        }
    }

    #[test]
    fn test_invalid_payload_does_not_break_page() {
        let project = Project::new();
        let site = project.site();
        let html = site.handle("/json").unwrap();

        assert!(html.contains("<!-- Invalid JSON: "), "{html}");
        assert!(html.contains("before"), "{html}");
        assert!(html.contains("after"), "{html}");
        assert!(html.contains(r#"<div class="box">ok</div>"#), "{html}");
    }

    #[test]
    fn test_image_reference_rewritten() {
        let project = Project::new();
        let site = project.site();
        let html = site.handle("/blog/post").unwrap();

        assert!(html.contains(r#"src="/assets/data/img/x.png""#), "{html}");
        assert!(html.contains("<title>Post</title>"), "{html}");
    }

    #[test]
    fn test_asset_files() {
        let project = Project::new();
        let site = project.site();

        assert_eq!(
            site.asset_file("data/img/x.png"),
            Some(project.root.join("data/img/x.png"))
        );
        assert_eq!(
            site.asset_file("public/404.html"),
            Some(project.root.join("public/404.html"))
        );
        for rel in [
            "outside.md",
            "blacklist.json",
            "../outside.md",
            "data/../outside.md",
            "data/img",
            "data/private/diary.md",
            "data/secret.md",
            "",
        ] {
            assert_eq!(site.asset_file(rel), None, "{rel}");
        }
    }

    #[test]
    fn test_media_files() {
        let project = Project::new();
        let site = project.site();

        assert_eq!(site.media_file("clip"), Some(project.root.join("data/clip.webm")));
        assert_eq!(
            site.media_file("clip.webm"),
            Some(project.root.join("data/clip.webm"))
        );
        assert_eq!(site.media_file("nothing"), None);
        assert_eq!(site.media_file("../outside.md"), None);
    }

    #[test]
    fn test_blacklist_reload_applies_to_requests() {
        let project = Project::new();
        let site = project.site();
        assert!(site.handle("/blog/post").is_ok());

        project.write("blacklist.json", r#"["/blog/"]"#);
        assert!(site.guard().reload());
        assert!(site.handle("/blog/post").is_err());
        assert!(site.handle("/secret").is_ok());
    }
}
