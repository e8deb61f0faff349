//! Window teardown and process exit.

use winit::event_loop::ActiveEventLoop;

use super::core::JsPaintApp;

// =============================================================================
// SHUTDOWN
// =============================================================================

impl JsPaintApp {
    /// The UI confirmed `close-window`.
    pub(super) fn close_surface(&mut self, event_loop: &ActiveEventLoop) {
        let Some(surface) = self.supervisor.confirm_close() else {
            return;
        };
        self.teardown(surface);

        if cfg!(target_os = "macos") {
            tracing::info!("Last window closed, staying resident");
        } else {
            tracing::info!("Last window closed, exiting");
            self.quitting = true;
            event_loop.exit();
        }
    }

    /// SIGTERM, Ctrl+C or session end: close without asking the UI, then exit.
    pub(super) fn force_quit(&mut self, event_loop: &ActiveEventLoop) {
        if self.quitting {
            return;
        }
        tracing::info!("Force quit");
        self.quitting = true;
        if let Some(surface) = self.supervisor.force_close() {
            self.teardown(surface);
        }
        event_loop.exit();
    }

    /// Release whatever is left when the event loop stops.
    pub(super) fn shutdown(&mut self) {
        tracing::info!("Initiating shutdown");
        if let Some(surface) = self.supervisor.force_close() {
            self.teardown(surface);
        }
        self.discard_pending();
        tracing::info!("Shutdown complete");
    }

    fn teardown(&mut self, surface: super::surface::EditorSurface) {
        self.dialogs.set_parent(None);
        self.discard_pending();
        drop(surface);
    }

    /// Fail every in-flight request; their results arrive after the UI is gone.
    fn discard_pending(&mut self) {
        let failed = self.dispatcher.disconnect();
        if !failed.is_empty() {
            tracing::debug!("Discarded {} pending response(s)", failed.len());
        }
    }
}
