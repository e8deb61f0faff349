//! WebView event types.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// State of a page load lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageLoadState {
    /// Navigation has started. For the app origin this means the previous
    /// document, and every request it had in flight, is gone.
    Started,
    Finished,
}

impl From<wry::PageLoadEvent> for PageLoadState {
    fn from(e: wry::PageLoadEvent) -> Self {
        match e {
            wry::PageLoadEvent::Started => Self::Started,
            wry::PageLoadEvent::Finished => Self::Finished,
        }
    }
}

/// Events emitted by the editor WebView.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebViewEvent {
    PageLoad { state: PageLoadState, url: String },
    /// `document.title` changed.
    TitleChanged { title: String },
    /// Raw body of a message posted by the bridge script.
    Ipc { body: String },
    /// A link to a non-app URL was handed to the system browser.
    ExternalLink { url: String },
}

/// Where WebView callbacks deliver their events. Called on the UI thread.
pub type EventSink = Arc<dyn Fn(WebViewEvent) + Send + Sync>;
