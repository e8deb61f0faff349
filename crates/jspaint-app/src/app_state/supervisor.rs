//! Window Supervisor: owns the single editor surface and its lifecycle.
//!
//! `absent -> creating -> ready -> absent`. Creation is two-phase because
//! winit only creates windows from inside the event loop: [`activate`]
//! reports [`Activation::Create`] and the caller builds the surface, then
//! hands it back through [`surface_ready`].
//!
//! [`activate`]: WindowSupervisor::activate
//! [`surface_ready`]: WindowSupervisor::surface_ready

use std::path::{Path, PathBuf};
use std::sync::Arc;

use jspaint_broker::CapabilityStore;
use jspaint_common::protocol::{CLOSE_WINDOW_PROMPT, OPEN_FILE};
use jspaint_common::{ForwardedLaunch, LaunchRequest};
use jspaint_webview::OutboundMessage;
use serde_json::Value;

use crate::cli;

use super::surface::Surface;

/// What the caller must do after [`WindowSupervisor::activate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Build the surface now and pass it to `surface_ready`.
    Create,
    /// A surface is being built; nothing to do.
    Pending,
    /// The existing surface was brought to the foreground.
    Focused,
}

enum SurfaceState<S> {
    Absent,
    Creating,
    Ready(ReadySurface<S>),
}

struct ReadySurface<S> {
    surface: S,
    /// The page has loaded and its bridge can take notifications.
    ui_loaded: bool,
    /// `close-window-prompt` was sent and the UI has not answered.
    close_pending: bool,
}

pub struct WindowSupervisor<S> {
    state: SurfaceState<S>,
    store: Arc<CapabilityStore>,
    /// Handed to the UI once, through `get-environment-info`.
    initial_file_path: Option<PathBuf>,
    /// Files to announce with `open-file` once the UI can receive them.
    queued: Vec<PathBuf>,
}

impl<S: Surface> WindowSupervisor<S> {
    pub fn new(store: Arc<CapabilityStore>) -> Self {
        Self {
            state: SurfaceState::Absent,
            store,
            initial_file_path: None,
            queued: Vec::new(),
        }
    }

    /// Show the editor, optionally for `file_path`.
    ///
    /// The path is granted before anything can hand it to the UI. Safe to
    /// call repeatedly; calls while a surface is being built collapse.
    pub fn activate(&mut self, file_path: Option<PathBuf>) -> Activation {
        if let Some(path) = &file_path {
            self.store.grant(path.clone());
        }

        match &mut self.state {
            SurfaceState::Absent => {
                tracing::info!("Creating editor window");
                self.initial_file_path = file_path;
                self.state = SurfaceState::Creating;
                Activation::Create
            }
            SurfaceState::Creating => {
                if let Some(path) = file_path {
                    if self.initial_file_path.is_none() {
                        self.initial_file_path = Some(path);
                    } else {
                        self.queued.push(path);
                    }
                }
                Activation::Pending
            }
            SurfaceState::Ready(ready) => {
                if ready.surface.is_minimized() {
                    ready.surface.restore();
                }
                ready.surface.show_and_focus();

                if let Some(path) = file_path {
                    if ready.ui_loaded {
                        send_open_file(&ready.surface, &path);
                    } else {
                        self.queued.push(path);
                    }
                }
                Activation::Focused
            }
        }
    }

    /// A later launch forwarded its arguments. Its file is resolved against
    /// that launch's working directory, not ours.
    pub fn forwarded_launch(&mut self, launch: ForwardedLaunch) -> Activation {
        let file_arg = cli::parse_forwarded(&launch.args);
        let request = LaunchRequest::new(file_arg.as_deref(), launch.cwd);
        match &request.file_path {
            Some(path) => tracing::info!("Second launch with {}", path.display()),
            None => tracing::info!("Second launch"),
        }
        self.activate(request.file_path)
    }

    /// The surface requested by `Activation::Create` has been built.
    ///
    /// Returns the surface back if creation was abandoned in the meantime
    /// (a force quit while building).
    pub fn surface_ready(&mut self, surface: S) -> Result<(), S> {
        if !matches!(self.state, SurfaceState::Creating) {
            return Err(surface);
        }
        self.state = SurfaceState::Ready(ReadySurface {
            surface,
            ui_loaded: false,
            close_pending: false,
        });
        Ok(())
    }

    /// Building the surface failed.
    pub fn surface_failed(&mut self) {
        if matches!(self.state, SurfaceState::Creating) {
            self.state = SurfaceState::Absent;
        }
        self.initial_file_path = None;
        self.queued.clear();
    }

    /// The UI finished loading. Delivers any files queued meanwhile.
    pub fn ui_loaded(&mut self) {
        if let SurfaceState::Ready(ready) = &mut self.state {
            ready.ui_loaded = true;
            for path in self.queued.drain(..) {
                send_open_file(&ready.surface, &path);
            }
        }
    }

    /// The page is navigating away (reload). Notifications queue until it
    /// loads again.
    pub fn ui_unloaded(&mut self) {
        if let SurfaceState::Ready(ready) = &mut self.state {
            ready.ui_loaded = false;
        }
    }

    /// Read (and clear) the path the UI should open on startup.
    pub fn take_initial_file_path(&mut self) -> Option<PathBuf> {
        self.initial_file_path.take()
    }

    /// The OS asked to close the window. The UI decides: it is asked to
    /// confirm, and the window stays until it answers with `close-window`.
    pub fn on_close_requested(&mut self) {
        if let SurfaceState::Ready(ready) = &mut self.state {
            if ready.close_pending {
                tracing::debug!("Close requested again, re-prompting UI");
            } else {
                tracing::debug!("Close requested, prompting UI");
            }
            ready.close_pending = true;
            ready
                .surface
                .send(&OutboundMessage::notification(CLOSE_WINDOW_PROMPT, Value::Null));
        }
    }

    /// The UI confirmed closing. Returns the surface to tear down.
    pub fn confirm_close(&mut self) -> Option<S> {
        self.take_surface()
    }

    /// Close without asking the UI (SIGTERM, Ctrl+C, session end).
    pub fn force_close(&mut self) -> Option<S> {
        if matches!(self.state, SurfaceState::Creating) {
            self.state = SurfaceState::Absent;
        }
        self.take_surface()
    }

    fn take_surface(&mut self) -> Option<S> {
        match std::mem::replace(&mut self.state, SurfaceState::Absent) {
            SurfaceState::Ready(ready) => {
                tracing::info!("Editor window closed");
                self.queued.clear();
                Some(ready.surface)
            }
            other => {
                self.state = other;
                None
            }
        }
    }

    /// Show `path` as the window's document, but only if it was granted.
    pub fn set_represented_path(&self, path: &Path) {
        if !self.store.contains(path) {
            tracing::warn!("Ignoring represented path that was never granted: {}", path.display());
            return;
        }
        if let Some(surface) = self.surface() {
            surface.set_represented_path(path);
        }
    }

    pub fn set_document_edited(&self, edited: bool) {
        if let Some(surface) = self.surface() {
            surface.set_document_edited(edited);
        }
    }

    /// Send to the UI if a surface exists. `false` if nothing was sent.
    pub fn send(&self, message: &OutboundMessage) -> bool {
        self.surface().is_some_and(|s| s.send(message))
    }

    pub fn surface(&self) -> Option<&S> {
        match &self.state {
            SurfaceState::Ready(ready) => Some(&ready.surface),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn is_absent(&self) -> bool {
        matches!(self.state, SurfaceState::Absent)
    }

    pub fn is_creating(&self) -> bool {
        matches!(self.state, SurfaceState::Creating)
    }

    #[cfg(test)]
    pub fn close_pending(&self) -> bool {
        matches!(&self.state, SurfaceState::Ready(ready) if ready.close_pending)
    }
}

fn send_open_file<S: Surface>(surface: &S, path: &Path) {
    let payload = Value::String(path.to_string_lossy().into_owned());
    surface.send(&OutboundMessage::notification(OPEN_FILE, payload));
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_state::surface::testing::MockSurface;

    fn supervisor() -> WindowSupervisor<MockSurface> {
        WindowSupervisor::new(Arc::new(CapabilityStore::new()))
    }

    fn ready(sup: &mut WindowSupervisor<MockSurface>) -> MockSurface {
        let surface = MockSurface::default();
        assert!(sup.surface_ready(surface.clone()).is_ok());
        sup.ui_loaded();
        surface
    }

    #[test]
    fn first_activation_creates() {
        let mut sup = supervisor();
        assert!(sup.is_absent());
        assert_eq!(sup.activate(None), Activation::Create);
        assert!(sup.is_creating());
    }

    #[test]
    fn overlapping_activations_yield_one_surface() {
        let mut sup = supervisor();
        assert_eq!(sup.activate(None), Activation::Create);
        assert_eq!(sup.activate(None), Activation::Pending);
        assert_eq!(sup.activate(Some("/tmp/a.png".into())), Activation::Pending);
        ready(&mut sup);
        assert_eq!(sup.activate(None), Activation::Focused);
    }

    #[test]
    fn initial_path_is_granted_and_read_once() {
        let store = Arc::new(CapabilityStore::new());
        let mut sup: WindowSupervisor<MockSurface> = WindowSupervisor::new(Arc::clone(&store));
        sup.activate(Some("/home/user/photo.png".into()));

        assert!(store.contains(Path::new("/home/user/photo.png")));
        assert_eq!(
            sup.take_initial_file_path(),
            Some(PathBuf::from("/home/user/photo.png"))
        );
        assert_eq!(sup.take_initial_file_path(), None);
    }

    #[test]
    fn second_launch_raises_and_sends_open_file() {
        let mut sup = supervisor();
        sup.activate(None);
        let surface = ready(&mut sup);
        surface.set_minimized(true);

        let outcome = sup.activate(Some("/work/photo.png".into()));
        assert_eq!(outcome, Activation::Focused);

        assert!(!surface.is_minimized());
        assert_eq!(surface.calls(), vec!["restore", "show_and_focus"]);
        assert_eq!(
            surface.sent(),
            vec![OutboundMessage::notification(
                OPEN_FILE,
                Value::String("/work/photo.png".into())
            )]
        );
        assert!(sup.store.contains(Path::new("/work/photo.png")));
    }

    #[test]
    fn forwarded_relative_file_opens_against_its_cwd() {
        let mut sup = supervisor();
        sup.activate(None);
        let surface = ready(&mut sup);

        let launch = ForwardedLaunch::new(vec!["photo.png".into()], "/home/user/Pictures");
        assert_eq!(sup.forwarded_launch(launch), Activation::Focused);

        let expected = PathBuf::from("/home/user/Pictures/photo.png");
        assert!(sup.store.contains(&expected));
        assert_eq!(
            surface.sent(),
            vec![OutboundMessage::notification(
                OPEN_FILE,
                Value::String(expected.to_string_lossy().into_owned())
            )]
        );
    }

    #[test]
    fn forwarded_launch_without_file_only_raises() {
        let mut sup = supervisor();
        sup.activate(None);
        let surface = ready(&mut sup);

        let launch = ForwardedLaunch::new(vec!["--squirrel-firstrun".into()], "/tmp");
        assert_eq!(sup.forwarded_launch(launch), Activation::Focused);
        assert_eq!(surface.calls(), vec!["show_and_focus"]);
        assert!(surface.sent().is_empty());
    }

    #[test]
    fn forwarded_launch_after_close_recreates_with_file() {
        let mut sup = supervisor();
        sup.activate(None);
        ready(&mut sup);
        sup.confirm_close();

        let launch = ForwardedLaunch::new(vec!["a.png".into()], "/work");
        assert_eq!(sup.forwarded_launch(launch), Activation::Create);
        assert_eq!(sup.take_initial_file_path(), Some(PathBuf::from("/work/a.png")));
    }

    #[test]
    fn paths_during_creation_are_queued_until_ui_loads() {
        let mut sup = supervisor();
        sup.activate(Some("/a.png".into()));
        sup.activate(Some("/b.png".into()));

        let surface = MockSurface::default();
        assert!(sup.surface_ready(surface.clone()).is_ok());
        assert!(surface.sent().is_empty());

        sup.ui_loaded();
        assert_eq!(sup.take_initial_file_path(), Some(PathBuf::from("/a.png")));
        assert_eq!(
            surface.sent(),
            vec![OutboundMessage::notification(
                OPEN_FILE,
                Value::String("/b.png".into())
            )]
        );
    }

    #[test]
    fn close_request_prompts_instead_of_closing() {
        let mut sup = supervisor();
        sup.activate(None);
        let surface = ready(&mut sup);

        sup.on_close_requested();
        assert!(sup.surface().is_some());
        assert!(sup.close_pending());
        assert_eq!(
            surface.sent(),
            vec![OutboundMessage::notification(CLOSE_WINDOW_PROMPT, Value::Null)]
        );

        // A launch meanwhile keeps the prompt pending.
        sup.activate(None);
        assert!(sup.close_pending());

        assert!(sup.confirm_close().is_some());
        assert!(sup.is_absent());
    }

    #[test]
    fn force_close_skips_prompt() {
        let mut sup = supervisor();
        sup.activate(None);
        let surface = ready(&mut sup);

        assert!(sup.force_close().is_some());
        assert!(sup.is_absent());
        assert!(surface.sent().is_empty());
    }

    #[test]
    fn force_close_while_creating_abandons_surface() {
        let mut sup = supervisor();
        sup.activate(None);
        assert!(sup.force_close().is_none());
        assert!(sup.is_absent());
        assert!(sup.surface_ready(MockSurface::default()).is_err());
    }

    #[test]
    fn activation_after_close_recreates() {
        let mut sup = supervisor();
        sup.activate(None);
        ready(&mut sup);
        sup.confirm_close();
        assert_eq!(sup.activate(None), Activation::Create);
    }

    #[test]
    fn represented_path_requires_grant() {
        let mut sup = supervisor();
        sup.activate(Some("/granted.png".into()));
        let surface = ready(&mut sup);

        sup.set_represented_path(Path::new("/etc/passwd"));
        sup.set_represented_path(Path::new("/granted.png"));
        assert_eq!(surface.represented(), vec![PathBuf::from("/granted.png")]);
    }

    #[test]
    fn notifications_without_surface_are_dropped() {
        let sup = supervisor();
        assert!(!sup.send(&OutboundMessage::notification("x", Value::Null)));
        sup.set_document_edited(true);
    }
}
