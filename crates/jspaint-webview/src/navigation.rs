//! Navigation policy for the editor WebView.
//!
//! The page may only navigate within the app origin. Links to the web (the
//! help pages link to GitHub, the about dialog to the author's site) are
//! opened in the system browser and the in-app navigation is cancelled.

/// URL prefixes that belong to the app.
///
/// - `jspaint://` - custom protocol serving the UI assets
/// - `http://jspaint.localhost` - how WebView2 on Windows exposes that protocol
/// - `about:blank` - default empty page
pub const APP_URL_PREFIXES: &[&str] = &["jspaint://", "http://jspaint.localhost", "about:blank"];

/// Schemes handed to the operating system instead of being blocked.
const EXTERNAL_SCHEMES: &[&str] = &["https://", "http://", "mailto:"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Load it in the WebView.
    Allow,
    /// Cancel, and open in the default browser.
    OpenExternally,
    /// Cancel.
    Block,
}

pub fn is_app_url(url: &str) -> bool {
    APP_URL_PREFIXES.iter().any(|prefix| match url.strip_prefix(prefix) {
        None => false,
        // A host prefix must end at the host.
        Some(rest) if prefix.starts_with("http") => {
            rest.is_empty() || rest.starts_with(['/', '?', '#'])
        }
        Some(_) => true,
    })
}

/// Decide what to do with a navigation or new-window request.
pub fn classify(url: &str) -> Navigation {
    if is_app_url(url) {
        Navigation::Allow
    } else if EXTERNAL_SCHEMES.iter().any(|scheme| url.starts_with(scheme)) {
        Navigation::OpenExternally
    } else {
        Navigation::Block
    }
}

/// Open `url` in the default browser without waiting for it.
pub fn open_externally(url: &str) {
    match open::that_detached(url) {
        Ok(()) => tracing::info!(url = %url, "Opened link in system browser"),
        Err(e) => tracing::warn!(url = %url, "Failed to open link: {e}"),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_urls_are_allowed() {
        assert_eq!(classify("jspaint://localhost/index.html"), Navigation::Allow);
        assert_eq!(classify("jspaint://localhost/help/help.html#tools"), Navigation::Allow);
        assert_eq!(classify("http://jspaint.localhost/index.html"), Navigation::Allow);
        assert_eq!(classify("http://jspaint.localhost"), Navigation::Allow);
        assert_eq!(classify("about:blank"), Navigation::Allow);
    }

    #[test]
    fn lookalike_host_is_not_the_app() {
        assert!(!is_app_url("http://jspaint.localhost.evil.com/"));
        assert_eq!(
            classify("http://jspaint.localhost.evil.com/"),
            Navigation::OpenExternally
        );
    }

    #[test]
    fn web_links_open_externally() {
        assert_eq!(classify("https://github.com/1j01/jspaint"), Navigation::OpenExternally);
        assert_eq!(classify("http://example.com"), Navigation::OpenExternally);
        assert_eq!(classify("mailto:someone@example.com"), Navigation::OpenExternally);
    }

    #[test]
    fn other_schemes_are_blocked() {
        assert_eq!(classify("file:///etc/passwd"), Navigation::Block);
        assert_eq!(classify("javascript:alert(1)"), Navigation::Block);
        assert_eq!(classify("data:text/html,<h1>x</h1>"), Navigation::Block);
        assert_eq!(classify(""), Navigation::Block);
        assert_eq!(classify("not-a-url"), Navigation::Block);
    }
}
