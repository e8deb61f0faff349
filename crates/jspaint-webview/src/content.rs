//! Local content serving via custom protocol.
//!
//! Registers a `jspaint://` custom protocol so the WebView loads the bundled
//! paint UI without a local HTTP server. Every response carries the app's
//! Content Security Policy.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use wry::http::{Response, StatusCode};

/// Custom protocol scheme.
pub const SCHEME: &str = "jspaint";

/// Content Security Policy applied to every served document.
pub const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; \
     style-src 'self' 'unsafe-inline' https://fonts.googleapis.com; \
     img-src 'self' data: blob: http: https:; \
     font-src 'self' https://fonts.gstatic.com; \
     connect-src * data: blob:;";

/// Serves files from the UI asset directory.
///
/// A request for `jspaint://localhost/help/index.html` resolves to
/// `{base_dir}/help/index.html`. The root resolves to the entry page.
#[derive(Debug, Clone)]
pub struct ContentProvider {
    base_dir: PathBuf,
    entry: String,
}

impl ContentProvider {
    pub fn new(base_dir: impl Into<PathBuf>, entry: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            entry: entry.into(),
        }
    }

    /// Resolve a request path to a MIME type and content bytes.
    ///
    /// Returns `None` for missing files and for anything that escapes the
    /// base directory (`..`, symlinks).
    pub fn resolve(&self, path: &str) -> Option<(&'static str, Vec<u8>)> {
        let decoded = urlencoding::decode(path.trim_start_matches('/')).ok()?;
        let clean = if decoded.is_empty() {
            self.entry.as_str()
        } else {
            &*decoded
        };
        // `urlencoding` passes malformed escapes through verbatim; no bundled
        // asset name contains `%`.
        if clean.contains('%') {
            return None;
        }

        let file_path = self.base_dir.join(clean);

        let canonical_base = std::fs::canonicalize(&self.base_dir).ok()?;
        let canonical_file = std::fs::canonicalize(&file_path).ok()?;
        if !canonical_file.starts_with(&canonical_base) {
            return None;
        }

        let data = std::fs::read(&canonical_file).ok()?;
        Some((mime_from_extension(&canonical_file), data))
    }

    /// Build the protocol response for a request path.
    pub fn respond(&self, path: &str) -> Response<Cow<'static, [u8]>> {
        let built = match self.resolve(path) {
            Some((mime, data)) => Response::builder()
                .status(StatusCode::OK)
                .header("Content-Type", mime)
                .header("Content-Security-Policy", CONTENT_SECURITY_POLICY)
                .body(Cow::Owned(data)),
            None => {
                tracing::warn!(path = %path, "custom protocol: asset not found");
                Response::builder()
                    .status(StatusCode::NOT_FOUND)
                    .header("Content-Type", "text/plain")
                    .body(Cow::Borrowed(b"Not Found".as_slice()))
            }
        };
        // All header values above are static.
        built.unwrap_or_else(|_| Response::new(Cow::Borrowed(b"".as_slice())))
    }

}

/// Guess MIME type from file extension.
fn mime_from_extension(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") | Some("htm") => "text/html",
        Some("css") => "text/css",
        Some("js") | Some("mjs") => "application/javascript",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("cur") => "image/x-icon",
        Some("webp") => "image/webp",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("ogg") => "audio/ogg",
        Some("txt") => "text/plain",
        Some("xml") => "application/xml",
        Some("webmanifest") => "application/manifest+json",
        _ => "application/octet-stream",
    }
}
