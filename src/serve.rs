//! HTTP front end.
//!
//! Built on `tiny_http`. A fixed pool of worker threads pulls requests from
//! one shared server, so a slow render never holds up other requests.
//!
//! # Routes
//!
//! | Request                    | Response                                    |
//! |----------------------------|---------------------------------------------|
//! | `/`                        | landing document                            |
//! | `/<stylesheet>`            | stylesheet from the public directory        |
//! | `/favicon.ico`             | favicon from the public directory           |
//! | `/highlight.css`           | generated code highlighting stylesheet      |
//! | `<assets_prefix>/<path>`   | raw file under the content or public root   |
//! | `<media_prefix>/<name>`    | media file under the content root           |
//! | anything else              | rendered document                           |
//!
//! Only `GET` and `HEAD` are answered; other methods get 405. Missing
//! content gets 404 and render failures 500, both with the not-found page.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  ┌──────────────┐       ┌──────────────────┐
//! │  Worker 0    │  │  Worker N    │  ...  │  Watcher Thread  │
//! │ server.recv  │  │ server.recv  │       │ (blacklist.json) │
//! └──────┬───────┘  └──────┬───────┘       └────────┬─────────┘
//!        └────────┬────────┘                        │
//!                 ▼                                 ▼
//!          Site::handle ◀──── snapshot ──── AccessGuard::reload
//! ```

use crate::{
    config::SiteConfig,
    log,
    logger::log_error,
    render::{PageError, highlight_css},
    site::Site,
    watch::watch_blacklist_blocking,
};
use anyhow::{Context, Result};
use std::{
    fs,
    net::{IpAddr, SocketAddr},
    path::Path,
    sync::Arc,
    thread,
};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

/// Try binding to port, retry with incremented port if in use
const MAX_PORT_RETRIES: u16 = 10;

const HTML: &str = "text/html; charset=utf-8";

// ============================================================================
// Server Entry Point
// ============================================================================

/// Serve `site` until Ctrl+C.
///
/// 1. Binds to the configured interface and port (with auto-retry on port conflict)
/// 2. Sets up Ctrl+C handler that releases every worker
/// 3. Spawns the blacklist watcher (if enabled)
/// 4. Runs the worker pool and waits for it to drain
pub fn serve_site(site: Arc<Site>) -> Result<()> {
    let config = site.config();
    let interface: IpAddr = config
        .serve
        .interface
        .parse()
        .with_context(|| format!("Invalid interface `{}`", config.serve.interface))?;
    let workers = config.serve.worker_count();

    let (server, addr) = try_bind_port(interface, config.serve.port, MAX_PORT_RETRIES)?;
    let server = Arc::new(server);

    // Each unblock releases one waiting worker
    let server_for_signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down...");
        for _ in 0..workers {
            server_for_signal.unblock();
        }
    })
    .context("Failed to set Ctrl+C handler")?;

    log!("serve"; "http://{} ({} workers)", addr, workers);

    if config.serve.watch {
        let site = Arc::clone(&site);
        thread::spawn(move || {
            if let Err(err) = watch_blacklist_blocking(site.guard()) {
                log!("watch"; "{err}");
            }
        });
    }

    let handles = (0..workers)
        .map(|id| {
            let server = Arc::clone(&server);
            let site = Arc::clone(&site);
            thread::Builder::new()
                .name(format!("worker-{id}"))
                .spawn(move || {
                    for request in server.incoming_requests() {
                        if let Err(e) = handle_request(request, &site) {
                            log!("serve"; "request error: {e}");
                        }
                    }
                })
        })
        .collect::<std::io::Result<Vec<_>>>()
        .context("Failed to spawn worker threads")?;

    for handle in handles {
        if handle.join().is_err() {
            log!("serve"; "worker panicked");
        }
    }

    Ok(())
}

/// Try to bind to a port, retrying with incremented port numbers if in use.
fn try_bind_port(interface: IpAddr, base_port: u16, max_retries: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;
    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        max_retries,
        base_port,
        base_port.saturating_add(max_retries.saturating_sub(1)),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

// ============================================================================
// Routing
// ============================================================================

/// What a request path asks for.
#[derive(Debug, PartialEq, Eq)]
enum Route<'a> {
    /// A rendered document (including the landing page).
    Page,
    HighlightCss,
    /// A file directly inside the public directory.
    Public(&'a str),
    /// Remainder after the assets prefix.
    Asset(&'a str),
    /// Remainder after the media prefix.
    Media(&'a str),
}

fn route<'a>(path: &'a str, config: &'a SiteConfig) -> Route<'a> {
    let strip = |prefix: &str| {
        path.strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('/'))
    };

    if let Some(name) = path.strip_prefix('/')
        && (name == config.base.stylesheet || name == "favicon.ico")
    {
        return Route::Public(name);
    }
    if path == "/highlight.css" {
        return Route::HighlightCss;
    }
    if let Some(rest) = strip(&config.serve.assets_prefix) {
        return Route::Asset(rest);
    }
    if let Some(rest) = strip(&config.serve.media_prefix) {
        return Route::Media(rest);
    }
    Route::Page
}

// ============================================================================
// Request Handling
// ============================================================================

/// Handle a single HTTP request.
fn handle_request(request: Request, site: &Site) -> Result<()> {
    if !matches!(request.method(), Method::Get | Method::Head) {
        return respond(request, 405, Vec::new(), "text/plain; charset=utf-8");
    }

    let url = request.url().to_owned();
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let config = site.config();

    match route(path, config) {
        Route::Page => match site.handle(&url) {
            Ok(html) => respond(request, 200, html.into_bytes(), HTML),
            Err(err) => serve_error(request, site, &url, &err),
        },
        Route::HighlightCss => respond(
            request,
            200,
            highlight_css().as_bytes().to_vec(),
            "text/css; charset=utf-8",
        ),
        Route::Public(name) => {
            let file = config.content.public.join(name);
            if file.is_file() {
                serve_file(request, &file)
            } else {
                serve_not_found(request, site, &url)
            }
        }
        Route::Asset(rest) => match site.asset_file(rest) {
            Some(file) => serve_file(request, &file),
            None => serve_not_found(request, site, &url),
        },
        Route::Media(rest) => match site.media_file(rest) {
            Some(file) => serve_file(request, &file),
            None => serve_not_found(request, site, &url),
        },
    }
}

// ============================================================================
// Response Helpers
// ============================================================================

fn respond(request: Request, status: u16, body: Vec<u8>, content_type: &str) -> Result<()> {
    let header = Header::from_bytes("Content-Type", content_type)
        .map_err(|()| anyhow::anyhow!("Invalid content type `{content_type}`"))?;
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(header);
    request.respond(response)?;
    Ok(())
}

/// Serve a file with appropriate content type.
fn serve_file(request: Request, path: &Path) -> Result<()> {
    let content = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    respond(request, 200, content, guess_content_type(path))
}

fn serve_not_found(request: Request, site: &Site, url: &str) -> Result<()> {
    log!("serve"; "404 {url}");
    respond(request, 404, site.not_found_page().as_bytes().to_vec(), HTML)
}

/// Answer a failed page with the not-found body; details stay in the log.
fn serve_error(request: Request, site: &Site, url: &str, err: &PageError) -> Result<()> {
    let status = err.status();
    match err {
        PageError::Render(cause) => log_error("serve", &format!("{status} {url}: {err}"), cause),
        _ => log!("serve"; "{status} {url}: {err}"),
    }
    respond(request, status, site.not_found_page().as_bytes().to_vec(), HTML)
}

// ============================================================================
// Content Type Detection
// ============================================================================

/// Guess MIME content type from file extension.
///
/// Returns `application/octet-stream` for unknown extensions.
fn guess_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        // Web content
        Some("html" | "htm") => HTML,
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("xml") => "application/xml; charset=utf-8",

        // Images
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        Some("ico") => "image/x-icon",

        // Media
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("ogg") => "video/ogg",
        Some("mp3") => "audio/mpeg",

        // Fonts
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",

        // Documents
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain; charset=utf-8",
        Some("md") => "text/markdown; charset=utf-8",

        // Default binary
        _ => "application/octet-stream",
    }
}
