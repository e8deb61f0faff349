//! Editor window and WebView creation.

use std::path::PathBuf;
use std::sync::Arc;

use jspaint_config::MediatorConfig;
use jspaint_webview::{app_url, ContentProvider, EditorWebView, WebViewOptions};
use winit::dpi::LogicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::window::WindowAttributes;

use crate::icon;

use super::core::JsPaintApp;
use super::surface::{full_bounds, EditorSurface};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Asset directory next to the executable (or the working directory) when
/// the config does not name one.
const ASSETS_DIR: &str = "app";

#[derive(Debug, thiserror::Error)]
pub(super) enum SurfaceError {
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("failed to create WebView: {0}")]
    WebView(#[from] wry::Error),
}

// =============================================================================
// INITIALIZATION
// =============================================================================

impl JsPaintApp {
    /// Build the surface the supervisor asked for.
    ///
    /// A failure leaves the supervisor absent; with no window ever shown the
    /// process exits non-zero.
    pub(super) fn create_surface(&mut self, event_loop: &ActiveEventLoop) {
        match self.build_surface(event_loop) {
            Ok(surface) => {
                self.dialogs.set_parent(Some(Arc::clone(surface.window())));
                if self.supervisor.surface_ready(surface).is_err() {
                    tracing::debug!("Surface no longer wanted, dropping it");
                    self.dialogs.set_parent(None);
                    return;
                }
                tracing::info!("Editor window ready");
            }
            Err(e) => {
                tracing::error!("{e}");
                self.supervisor.surface_failed();
                self.exit_code = std::process::ExitCode::FAILURE;
                self.quitting = true;
                event_loop.exit();
            }
        }
    }

    fn build_surface(&self, event_loop: &ActiveEventLoop) -> Result<EditorSurface, SurfaceError> {
        let window_config = &self.config.window;
        let mut attrs = WindowAttributes::default()
            .with_title(window_config.title.as_str())
            .with_inner_size(LogicalSize::new(window_config.width, window_config.height))
            .with_min_inner_size(LogicalSize::new(
                window_config.min_width,
                window_config.min_height,
            ));

        let icon_path = self.assets_dir.join(&self.config.ui.icon);
        match icon::load_icon(&icon_path) {
            Ok(icon) => attrs = attrs.with_window_icon(Some(icon)),
            Err(e) => tracing::debug!(path = %icon_path.display(), "No window icon: {e}"),
        }

        let window = Arc::new(event_loop.create_window(attrs)?);

        let options = WebViewOptions {
            url: app_url(&self.config.ui.entry),
            devtools: self.is_dev,
            bounds: full_bounds(window.inner_size()),
        };
        let content = ContentProvider::new(&self.assets_dir, self.config.ui.entry.as_str());
        let webview = EditorWebView::build(
            window.as_ref(),
            options,
            content,
            self.sender.webview_sink(),
        )?;

        if self.is_dev {
            webview.open_devtools();
        }

        tracing::info!(
            url = %webview.url(),
            assets = %self.assets_dir.display(),
            "Editor WebView loading"
        );
        Ok(EditorSurface::new(window, webview, window_config.title.as_str()))
    }
}

/// Directory served as the UI origin.
pub(super) fn resolve_assets_dir(config: &MediatorConfig) -> PathBuf {
    if let Some(dir) = &config.ui.assets_dir {
        return dir.clone();
    }

    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(ASSETS_DIR)));
    if let Some(dir) = beside_exe.filter(|d| d.is_dir()) {
        return dir;
    }

    let fallback = std::env::current_dir().unwrap_or_default().join(ASSETS_DIR);
    if !fallback.is_dir() {
        tracing::warn!(
            path = %fallback.display(),
            "UI asset directory not found; the editor will have no content"
        );
    }
    fallback
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_assets_dir_wins() {
        let mut config = MediatorConfig::default();
        config.ui.assets_dir = Some(PathBuf::from("/opt/jspaint/ui"));
        assert_eq!(resolve_assets_dir(&config), PathBuf::from("/opt/jspaint/ui"));
    }

    #[test]
    fn default_assets_dir_is_named_app() {
        let dir = resolve_assets_dir(&MediatorConfig::default());
        assert!(dir.ends_with(ASSETS_DIR));
    }
}
