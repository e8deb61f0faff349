use std::sync::Arc;

use tracing::{debug, warn};
use wry::raw_window_handle;
use wry::{WebView, WebViewBuilder};

use crate::content::{ContentProvider, SCHEME};
use crate::events::{EventSink, PageLoadState, WebViewEvent};
use crate::ipc::{OutboundMessage, IPC_INIT_SCRIPT};
use crate::navigation::{self, Navigation};

/// URL of an app asset as the WebView sees it.
///
/// WebView2 exposes custom protocols as `http://<scheme>.localhost/`; the
/// other engines use the scheme directly.
pub fn app_url(path: &str) -> String {
    let path = path.trim_start_matches('/');
    if cfg!(windows) {
        format!("http://{SCHEME}.localhost/{path}")
    } else {
        format!("{SCHEME}://localhost/{path}")
    }
}

/// Options for building the editor WebView.
#[derive(Debug, Clone)]
pub struct WebViewOptions {
    pub url: String,
    /// Dev mode only.
    pub devtools: bool,
    /// Position and size within the parent window.
    pub bounds: wry::Rect,
}

/// The WebView hosting the paint UI.
pub struct EditorWebView {
    webview: WebView,
    url: String,
}

impl EditorWebView {
    /// Build the WebView as a child of `window`.
    ///
    /// Every callback reports through `sink`; none of them touch
    /// application state directly.
    pub fn build<W: raw_window_handle::HasWindowHandle>(
        window: &W,
        options: WebViewOptions,
        content: ContentProvider,
        sink: EventSink,
    ) -> Result<Self, wry::Error> {
        let mut builder = WebViewBuilder::new()
            .with_bounds(options.bounds)
            .with_devtools(options.devtools)
            .with_clipboard(true)
            .with_initialization_script(IPC_INIT_SCRIPT)
            .with_url(&options.url);

        builder = attach_ipc_handler(builder, Arc::clone(&sink));
        builder = attach_page_load_handler(builder, Arc::clone(&sink));
        builder = attach_title_handler(builder, Arc::clone(&sink));
        builder = attach_navigation_handler(builder, Arc::clone(&sink));
        builder = attach_new_window_handler(builder, Arc::clone(&sink));
        builder = attach_custom_protocol(builder, Arc::new(content));

        let webview = builder.build_as_child(window)?;
        debug!(url = %options.url, "Editor WebView created");

        Ok(Self {
            webview,
            url: options.url,
        })
    }

    /// Deliver a notification or response to the UI.
    pub fn send(&self, message: &OutboundMessage) -> Result<(), wry::Error> {
        self.webview.evaluate_script(&message.to_script())
    }

    pub fn set_bounds(&self, bounds: wry::Rect) -> Result<(), wry::Error> {
        self.webview.set_bounds(bounds)
    }

    pub fn focus(&self) -> Result<(), wry::Error> {
        self.webview.focus()
    }

    pub fn open_devtools(&self) {
        self.webview.open_devtools();
    }

    /// The URL the WebView was built with.
    pub fn url(&self) -> &str {
        &self.url
    }
}

// =============================================================================
// HANDLER ATTACHMENTS
// =============================================================================

fn attach_ipc_handler(builder: WebViewBuilder<'_>, sink: EventSink) -> WebViewBuilder<'_> {
    builder.with_ipc_handler(move |request| {
        let body = request.body().to_string();
        debug!(body_len = body.len(), "IPC message from UI");
        sink(WebViewEvent::Ipc { body });
    })
}

fn attach_page_load_handler(builder: WebViewBuilder<'_>, sink: EventSink) -> WebViewBuilder<'_> {
    builder.with_on_page_load_handler(move |event, url| {
        let state = PageLoadState::from(event);
        debug!(?state, url = %url, "page load");
        sink(WebViewEvent::PageLoad { state, url });
    })
}

fn attach_title_handler(builder: WebViewBuilder<'_>, sink: EventSink) -> WebViewBuilder<'_> {
    builder.with_document_title_changed_handler(move |title| {
        debug!(title = %title, "title changed");
        sink(WebViewEvent::TitleChanged { title });
    })
}

fn attach_navigation_handler(builder: WebViewBuilder<'_>, sink: EventSink) -> WebViewBuilder<'_> {
    builder.with_navigation_handler(move |url| route_navigation(&url, &sink))
}

fn attach_new_window_handler(builder: WebViewBuilder<'_>, sink: EventSink) -> WebViewBuilder<'_> {
    // The app never opens a second WebView: app URLs are refused too.
    builder.with_new_window_req_handler(move |url| {
        route_navigation(&url, &sink);
        false
    })
}

/// Apply the navigation policy; `true` lets the WebView proceed.
fn route_navigation(url: &str, sink: &EventSink) -> bool {
    match navigation::classify(url) {
        Navigation::Allow => true,
        Navigation::OpenExternally => {
            navigation::open_externally(url);
            sink(WebViewEvent::ExternalLink {
                url: url.to_string(),
            });
            false
        }
        Navigation::Block => {
            warn!(url = %url, "navigation blocked");
            false
        }
    }
}

fn attach_custom_protocol(
    builder: WebViewBuilder<'_>,
    content: Arc<ContentProvider>,
) -> WebViewBuilder<'_> {
    builder.with_custom_protocol(SCHEME.to_string(), move |_webview_id, request| {
        content.respond(request.uri().path())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_url_uses_platform_form() {
        let url = app_url("/index.html");
        if cfg!(windows) {
            assert_eq!(url, "http://jspaint.localhost/index.html");
        } else {
            assert_eq!(url, "jspaint://localhost/index.html");
        }
        assert!(navigation::is_app_url(&url));
    }

    #[test]
    fn blocked_navigation_emits_nothing() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::<WebViewEvent>::new()));
        let sink: EventSink = {
            let seen = Arc::clone(&seen);
            Arc::new(move |event: WebViewEvent| seen.lock().unwrap().push(event))
        };
        assert!(!route_navigation("file:///etc/passwd", &sink));
        assert!(route_navigation(&app_url("index.html"), &sink));
        assert!(seen.lock().unwrap().is_empty());
    }
}
