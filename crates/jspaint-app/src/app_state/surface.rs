//! The editor surface: a native window hosting the paint UI WebView.

use std::path::Path;
use std::sync::Arc;

use jspaint_webview::{EditorWebView, OutboundMessage};
use winit::dpi::PhysicalSize;
use winit::window::Window;

/// What the Window Supervisor needs from a surface.
pub trait Surface {
    fn is_minimized(&self) -> bool;
    /// Un-minimize.
    fn restore(&self);
    fn show_and_focus(&self);
    /// Deliver a message to the UI. `false` if it could not be delivered.
    fn send(&self, message: &OutboundMessage) -> bool;
    /// Native unsaved-changes indicator.
    fn set_document_edited(&self, edited: bool);
    fn set_represented_path(&self, path: &Path);
}

pub struct EditorSurface {
    // Declared first so the WebView drops before its window.
    webview: EditorWebView,
    window: Arc<Window>,
    base_title: String,
}

impl EditorSurface {
    pub fn new(window: Arc<Window>, webview: EditorWebView, base_title: impl Into<String>) -> Self {
        Self {
            window,
            webview,
            base_title: base_title.into(),
        }
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    /// Keep the WebView filling the window.
    pub fn resize(&self, size: PhysicalSize<u32>) {
        if let Err(e) = self.webview.set_bounds(full_bounds(size)) {
            tracing::warn!("Failed to resize WebView: {e}");
        }
    }

    /// Mirror `document.title` onto the native window.
    pub fn set_title(&self, title: &str) {
        if title.is_empty() {
            self.window.set_title(&self.base_title);
        } else {
            self.window.set_title(title);
        }
    }
}

/// WebView bounds covering the whole client area.
pub fn full_bounds(size: PhysicalSize<u32>) -> wry::Rect {
    wry::Rect {
        position: wry::dpi::Position::Physical(wry::dpi::PhysicalPosition::new(0, 0)),
        size: wry::dpi::Size::Physical(wry::dpi::PhysicalSize::new(size.width, size.height)),
    }
}

impl Surface for EditorSurface {
    fn is_minimized(&self) -> bool {
        self.window.is_minimized().unwrap_or(false)
    }

    fn restore(&self) {
        self.window.set_minimized(false);
    }

    fn show_and_focus(&self) {
        self.window.set_visible(true);
        self.window.focus_window();
        if let Err(e) = self.webview.focus() {
            tracing::debug!("Failed to focus WebView: {e}");
        }
    }

    fn send(&self, message: &OutboundMessage) -> bool {
        match self.webview.send(message) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to deliver message to UI: {e}");
                false
            }
        }
    }

    #[cfg(target_os = "macos")]
    fn set_document_edited(&self, edited: bool) {
        use winit::platform::macos::WindowExtMacOS;
        self.window.set_document_edited(edited);
    }

    #[cfg(not(target_os = "macos"))]
    fn set_document_edited(&self, edited: bool) {
        tracing::debug!(edited, "No native edited indicator on this platform");
    }

    fn set_represented_path(&self, path: &Path) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.window
            .set_title(&format!("{name} - {}", self.base_title));
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::path::PathBuf;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recorded {
        minimized: bool,
        calls: Vec<&'static str>,
        sent: Vec<OutboundMessage>,
        edited: Vec<bool>,
        represented: Vec<PathBuf>,
    }

    /// Records every call; clones share the same record.
    #[derive(Clone, Default)]
    pub struct MockSurface {
        inner: Arc<Mutex<Recorded>>,
    }

    impl MockSurface {
        pub fn set_minimized(&self, minimized: bool) {
            self.inner.lock().unwrap().minimized = minimized;
        }

        pub fn calls(&self) -> Vec<&'static str> {
            self.inner.lock().unwrap().calls.clone()
        }

        pub fn sent(&self) -> Vec<OutboundMessage> {
            self.inner.lock().unwrap().sent.clone()
        }

        pub fn edited(&self) -> Vec<bool> {
            self.inner.lock().unwrap().edited.clone()
        }

        pub fn represented(&self) -> Vec<PathBuf> {
            self.inner.lock().unwrap().represented.clone()
        }
    }

    impl Surface for MockSurface {
        fn is_minimized(&self) -> bool {
            self.inner.lock().unwrap().minimized
        }

        fn restore(&self) {
            let mut inner = self.inner.lock().unwrap();
            inner.minimized = false;
            inner.calls.push("restore");
        }

        fn show_and_focus(&self) {
            self.inner.lock().unwrap().calls.push("show_and_focus");
        }

        fn send(&self, message: &OutboundMessage) -> bool {
            self.inner.lock().unwrap().sent.push(message.clone());
            true
        }

        fn set_document_edited(&self, edited: bool) {
            self.inner.lock().unwrap().edited.push(edited);
        }

        fn set_represented_path(&self, path: &Path) {
            self.inner
                .lock()
                .unwrap()
                .represented
                .push(path.to_path_buf());
        }
    }
}
