//! The embedded paint UI.
//!
//! Wraps the `wry` crate to provide:
//! - The editor WebView, built as a child of the native window
//! - Bidirectional IPC (Rust <-> JavaScript) with request ids and byte buffers
//! - The `jspaint://` custom protocol serving the bundled UI assets
//! - A navigation policy that keeps the app inside its own origin

pub mod content;
pub mod events;
pub mod ipc;
pub mod navigation;
pub mod view;

pub use content::ContentProvider;
pub use events::{EventSink, PageLoadState, WebViewEvent};
pub use ipc::{IpcMessage, OutboundMessage, RejectedMessage};
pub use view::{app_url, EditorWebView, WebViewOptions};
