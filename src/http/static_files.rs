//! Static file serving rooted at the configured directory.
//!
//! # Responsibilities
//! - Resolve request paths under the root, refusing traversal outside it
//! - Read file contents and infer a content type from the extension
//! - Inject the reload-client script into served HTML when configured

use std::path::{Component, Path, PathBuf};

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use percent_encoding::percent_decode_str;

use crate::config::ServeConfig;

/// Reload client appended to served HTML when `config.inject` is set.
///
/// Opens a WebSocket back to the serving host; CSS-type changes hot-swap
/// stylesheets, anything else reloads the page, and the terminal
/// `close-socket` message stops the client for good.
const RELOAD_CLIENT_SCRIPT: &str = r#"<script>
(function () {
  var proto = location.protocol === 'https:' ? 'wss://' : 'ws://';
  var socket = new WebSocket(proto + location.host + '/');
  socket.onmessage = function (event) {
    var msg = JSON.parse(event.data);
    if (msg.message === 'close-socket') { socket.close(); return; }
    if (msg.fileExtension === '.css' || msg.fileExtension === '.scss' || msg.fileExtension === '.less') {
      var links = document.querySelectorAll('link[rel=stylesheet]');
      for (var i = 0; i < links.length; i++) {
        links[i].href = links[i].href.split('?')[0] + '?t=' + Date.now();
      }
      return;
    }
    location.reload();
  };
})();
</script>"#;

/// Serve the file at `request_path` under `config.root`.
pub async fn serve(config: &ServeConfig, request_path: &str) -> Response {
    let Some(mut path) = resolve(&config.root, request_path) else {
        return (StatusCode::NOT_FOUND, "File not found").into_response();
    };

    if path.is_dir() {
        path.push("index.html");
    }

    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let content_type = content_type_for(&path);
            let body = if config.inject && is_html(&path) {
                inject_reload_script(bytes)
            } else {
                bytes
            };
            ([(header::CONTENT_TYPE, content_type)], body).into_response()
        }
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "File not served");
            (StatusCode::NOT_FOUND, "File not found").into_response()
        }
    }
}

/// Resolve a request path to a filesystem path under `root`.
///
/// Percent-encoded paths are decoded first; the traversal check runs on the
/// decoded form. Returns `None` for paths that would escape the root.
fn resolve(root: &Path, request_path: &str) -> Option<PathBuf> {
    let relative = request_path.trim_start_matches('/');
    let decoded = percent_decode_str(relative).decode_utf8().ok()?;
    let candidate = Path::new(decoded.as_ref());

    for component in candidate.components() {
        match component {
            Component::Normal(_) => {}
            // `..`, absolute prefixes, and the like never resolve.
            _ => return None,
        }
    }

    Some(root.join(candidate))
}

fn is_html(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("html") | Some("htm") | Some("xhtml")
    )
}

/// Append the reload client, before `</body>` when one exists.
fn inject_reload_script(bytes: Vec<u8>) -> Vec<u8> {
    let mut html = match String::from_utf8(bytes) {
        Ok(html) => html,
        // Not valid UTF-8; serve the bytes untouched.
        Err(e) => return e.into_bytes(),
    };

    match html.rfind("</body>") {
        Some(index) => html.insert_str(index, RELOAD_CLIENT_SCRIPT),
        None => html.push_str(RELOAD_CLIENT_SCRIPT),
    }
    html.into_bytes()
}

/// Best-effort content-type inference from the file extension.
fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("html") | Some("htm") | Some("xhtml") => "text/html; charset=utf-8",
        Some("css") | Some("scss") | Some("less") => "text/css; charset=utf-8",
        Some("js") | Some("mjs") => "text/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("txt") => "text/plain; charset=utf-8",
        Some("wasm") => "application/wasm",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_rejects_traversal() {
        let root = Path::new("/site");
        assert!(resolve(root, "/../etc/passwd").is_none());
        assert!(resolve(root, "/app/../../etc/passwd").is_none());
        assert_eq!(
            resolve(root, "/app/app.js"),
            Some(PathBuf::from("/site/app/app.js"))
        );
        assert_eq!(resolve(root, "/"), Some(PathBuf::from("/site")));
    }

    #[test]
    fn resolve_decodes_percent_encoding() {
        let root = Path::new("/site");
        assert_eq!(
            resolve(root, "/my%20file.txt"),
            Some(PathBuf::from("/site/my file.txt"))
        );
        // Traversal hidden behind encoding is still rejected.
        assert!(resolve(root, "/%2e%2e/etc/passwd").is_none());
        assert!(resolve(root, "/app/%2E%2E/%2E%2E/etc/passwd").is_none());
        // Invalid UTF-8 after decoding never resolves.
        assert!(resolve(root, "/%ff%fe").is_none());
    }

    #[test]
    fn content_types_cover_common_extensions() {
        assert_eq!(
            content_type_for(Path::new("index.html")),
            "text/html; charset=utf-8"
        );
        assert_eq!(
            content_type_for(Path::new("app.js")),
            "text/javascript; charset=utf-8"
        );
        assert_eq!(content_type_for(Path::new("data.json")), "application/json");
        assert_eq!(
            content_type_for(Path::new("blob.bin")),
            "application/octet-stream"
        );
    }

    #[test]
    fn injects_before_closing_body() {
        let html = b"<html><body><h1>hi</h1></body></html>".to_vec();
        let injected = String::from_utf8(inject_reload_script(html)).unwrap();
        assert!(injected.contains("new WebSocket"));
        let script_at = injected.find("<script>").unwrap();
        let body_close_at = injected.find("</body>").unwrap();
        assert!(script_at < body_close_at);
    }

    #[test]
    fn appends_when_no_body_tag() {
        let html = b"<h1>fragment</h1>".to_vec();
        let injected = String::from_utf8(inject_reload_script(html)).unwrap();
        assert!(injected.starts_with("<h1>fragment</h1>"));
        assert!(injected.ends_with("</script>"));
    }
}
