//! Development server with live reload.
//!
//! Serves the build output over `tiny_http` and upgrades `GET /ws` to a
//! websocket registered in the [`ReloadHub`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐
//! │   Main Thread   │     │  Watcher Thread  │
//! │  (HTTP Server)  │     │  (File Monitor)  │
//! └────────┬────────┘     └────────┬─────────┘
//!          │                       │
//!          ▼                       ▼
//!    Serve build/            Debounce, rebuild
//!    Register /ws  ───────►  hub.broadcast()
//! ```
//!
//! Ctrl+C unblocks the server and raises the shutdown flag. The watcher
//! notices at its next tick, every socket is closed, and the listener is
//! dropped.
//!
//! # Request resolution
//!
//! 1. `/ws` with `Upgrade: websocket` → websocket
//! 2. Path escaping the output root → 404
//! 3. Directory → its `index.html`
//! 4. File → contents; HTML gets the reload script
//! 5. Nothing found → 404

use crate::config::SiteConfig;
use crate::imaging::ImageBackend;
use crate::livereload::{ReloadHub, Transport, inject_reload_script};
use crate::watch;
use log::{error, info, warn};
use std::borrow::Cow;
use std::fs;
use std::io::Cursor;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tiny_http::{Header, Request, Response, Server, StatusCode};
use tungstenite::WebSocket;
use tungstenite::handshake::derive_accept_key;
use tungstenite::protocol::Role;

pub const RELOAD_PATH: &str = "/ws";

/// Hub type used by the server: any upgraded connection, boxed.
pub type LiveHub = ReloadHub<Box<dyn Transport>>;

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot bind {addr}: {message}")]
    Bind { addr: String, message: String },
    #[error("Invalid header {0}")]
    Header(String),
    #[error("Failed to set Ctrl+C handler: {0}")]
    Signal(#[from] ctrlc::Error),
    #[error("Watcher error: {0}")]
    Watch(#[from] notify::Error),
}

/// Serve `output_dir` at `host:port` and rebuild on source changes until
/// Ctrl+C. The watcher runs on its own thread; requests are handled here.
pub fn serve<B>(
    config: SiteConfig,
    root: PathBuf,
    backend: B,
    host: &str,
    port: u16,
) -> Result<(), ServeError>
where
    B: ImageBackend + Send + 'static,
{
    let addr = format!("{host}:{port}");
    let server = Server::http(&addr).map_err(|e| ServeError::Bind {
        addr: addr.clone(),
        message: e.to_string(),
    })?;
    let server = Arc::new(server);
    let hub: Arc<LiveHub> = Arc::new(ReloadHub::new());
    let shutdown = Arc::new(AtomicBool::new(false));

    let server_for_signal = Arc::clone(&server);
    let shutdown_for_signal = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        info!("Shutting down...");
        shutdown_for_signal.store(true, Ordering::SeqCst);
        server_for_signal.unblock();
    })?;

    let output_dir = config.paths.resolve(&root).output;
    let (fs_watcher, events) = watch::start_watcher(&config, &root)?;
    let watcher = {
        let hub = Arc::clone(&hub);
        let shutdown = Arc::clone(&shutdown);
        std::thread::spawn(move || {
            watch::rebuild_loop(&events, &config, &root, &backend, &*hub, &shutdown);
        })
    };

    info!("Serving {} at http://{addr}", output_dir.display());

    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, &output_dir, &hub) {
            warn!("Request error: {e}");
        }
    }

    shutdown.store(true, Ordering::SeqCst);
    if watcher.join().is_err() {
        error!("Watcher thread panicked");
    }
    drop(fs_watcher);
    hub.close_all();
    info!("Dev server stopped");
    Ok(())
}

/// Route one request.
pub fn handle_request(request: Request, root: &Path, hub: &LiveHub) -> Result<(), ServeError> {
    if is_reload_upgrade(&request) {
        return upgrade(request, hub);
    }

    let url = request.url().to_string();
    match resolve_path(root, &url) {
        Some(path) => serve_file(request, &path),
        None => serve_not_found(request),
    }
}

fn header_value<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
    request
        .headers()
        .iter()
        .find(|h| h.field.as_str().as_str().eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

fn is_reload_upgrade(request: &Request) -> bool {
    let path = request.url().split('?').next().unwrap_or_default();
    path == RELOAD_PATH
        && header_value(request, "Upgrade").is_some_and(|v| v.eq_ignore_ascii_case("websocket"))
}

/// Complete the websocket handshake and hand the socket to the hub.
fn upgrade(request: Request, hub: &LiveHub) -> Result<(), ServeError> {
    let Some(key) = header_value(&request, "Sec-WebSocket-Key").map(str::to_owned) else {
        let response =
            Response::from_string("missing Sec-WebSocket-Key").with_status_code(StatusCode(400));
        request.respond(response)?;
        return Ok(());
    };

    let response = Response::empty(StatusCode(101))
        .with_header(header("Upgrade", "websocket")?)
        .with_header(header("Connection", "Upgrade")?)
        .with_header(header(
            "Sec-WebSocket-Accept",
            &derive_accept_key(key.as_bytes()),
        )?);
    let stream = request.upgrade("websocket", response);
    hub.register(Box::new(WebSocket::from_raw_socket(stream, Role::Server, None)));
    Ok(())
}

fn header(name: &str, value: &str) -> Result<Header, ServeError> {
    Header::from_bytes(name.as_bytes(), value.as_bytes())
        .map_err(|()| ServeError::Header(format!("{name}: {value}")))
}

/// Map a request URL to a file under `root`.
///
/// The query string is ignored and `%xx` escapes are decoded. Any `..`
/// component, or anything else that would leave `root`, resolves to
/// nothing. Directories resolve to their `index.html`.
pub fn resolve_path(root: &Path, url: &str) -> Option<PathBuf> {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let decoded = urlencoding::decode(path).unwrap_or(Cow::Borrowed(path));

    let mut local = root.to_path_buf();
    for component in Path::new(decoded.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => local.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }

    if local.is_dir() {
        local.push("index.html");
    }
    local.is_file().then_some(local)
}

fn is_html(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"))
}

/// Serve a file with its content type. HTML pages get the reload script.
fn serve_file(request: Request, path: &Path) -> Result<(), ServeError> {
    let content_type = header("Content-Type", guess_content_type(path))?;
    let no_cache = header("Cache-Control", "no-store")?;

    if is_html(path) {
        let html = fs::read_to_string(path)?;
        let response = Response::from_string(inject_reload_script(&html))
            .with_header(content_type)
            .with_header(no_cache);
        request.respond(response)?;
    } else {
        let response = Response::from_data(fs::read(path)?)
            .with_header(content_type)
            .with_header(no_cache);
        request.respond(response)?;
    }
    Ok(())
}

fn serve_not_found(request: Request) -> Result<(), ServeError> {
    let body = "404 Not Found";
    let response = Response::new(
        StatusCode(404),
        vec![header("Content-Type", "text/plain")?],
        Cursor::new(body),
        Some(body.len()),
        None,
    );
    request.respond(response)?;
    Ok(())
}

/// Guess MIME content type from file extension.
///
/// Returns `application/octet-stream` for unknown extensions.
pub fn guess_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("xml") => "application/xml; charset=utf-8",
        Some("txt") => "text/plain; charset=utf-8",

        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        Some("ico") => "image/x-icon",

        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",

        _ => "application/octet-stream",
    }
}
