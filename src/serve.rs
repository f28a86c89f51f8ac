// Copyright © 2024 Leafpress. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Development Server
//!
//! A small `tiny_http` server over the build output. Requests map onto
//! files below the output directory; directories resolve to their
//! `index.html`. Anything else is a plain-text 404. Ctrl+C unblocks the
//! accept loop so the process exits cleanly.

use std::fs;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};
use tiny_http::{Header, Request, Response, Server};

use crate::paths::INDEX_FILE;
use crate::{LeafpressError, Result};

/// Interface the server binds to.
pub const BIND_ADDRESS: Ipv4Addr = Ipv4Addr::LOCALHOST;

/// Serves `root` on `port` until interrupted.
///
/// # Errors
///
/// Fails when the port cannot be bound or the interrupt handler cannot
/// be installed. Errors while answering a single request are logged.
pub fn serve_site(root: &Path, port: u16) -> Result<()> {
    let addr = SocketAddr::from((BIND_ADDRESS, port));
    let server = Server::http(addr).map_err(|e| {
        LeafpressError::internal_error(format!("Failed to bind {}: {}", addr, e))
    })?;
    let server = Arc::new(server);

    let signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        info!("Shutting down server");
        signal.unblock();
    })
    .map_err(|e| {
        LeafpressError::internal_error(format!("Failed to set Ctrl+C handler: {}", e))
    })?;

    info!("Serving {} at http://{}", root.display(), addr);

    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, root) {
            warn!("Request failed: {}", e);
        }
    }

    Ok(())
}

fn handle_request(request: Request, root: &Path) -> Result<()> {
    let resolved = resolve_request_path(root, request.url());
    debug!("{} {} -> {:?}", request.method(), request.url(), resolved);

    match resolved {
        Some(path) => {
            let body = fs::read(&path).map_err(|e| LeafpressError::io_error(path.clone(), e))?;
            let mut response = Response::from_data(body);
            if let Ok(header) = Header::from_bytes("Content-Type", content_type(&path)) {
                response.add_header(header);
            }
            request.respond(response)?;
        }
        None => {
            let mut response = Response::from_string("404 Not Found").with_status_code(404);
            if let Ok(header) = Header::from_bytes("Content-Type", "text/plain; charset=utf-8") {
                response.add_header(header);
            }
            request.respond(response)?;
        }
    }
    Ok(())
}

/// Maps a request target onto a path relative to the served root.
///
/// The query string and fragment are dropped and the path is
/// percent-decoded. Returns `None` for targets that try to leave the
/// root or do not decode.
///
/// ```rust
/// use leafpress::serve::request_relative_path;
/// use std::path::PathBuf;
///
/// assert_eq!(
///     request_relative_path("/posts/hello%20world/?ref=feed"),
///     Some(PathBuf::from("posts/hello world"))
/// );
/// assert_eq!(request_relative_path("/../secret"), None);
/// ```
pub fn request_relative_path(target: &str) -> Option<PathBuf> {
    let path = target.split(['?', '#']).next().unwrap_or_default();
    let decoded = urlencoding::decode(path).ok()?;

    let mut relative = PathBuf::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => return None,
            s if s.contains('\\') || s.contains('\0') => return None,
            s => relative.push(s),
        }
    }

    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)));
    (!escapes).then_some(relative)
}

/// Resolves a request target to an existing file below `root`.
///
/// Directories resolve to their `index.html`.
pub fn resolve_request_path(root: &Path, target: &str) -> Option<PathBuf> {
    let candidate = root.join(request_relative_path(target)?);
    if candidate.is_file() {
        return Some(candidate);
    }
    let index = candidate.join(INDEX_FILE);
    index.is_file().then_some(index)
}

/// Guesses a `Content-Type` from the file extension.
pub fn content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
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
        Some("ico") => "image/x-icon",
        Some("woff2") => "font/woff2",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}
