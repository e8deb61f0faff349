//! JsPaintApp struct definition and constructor.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use jspaint_broker::{CapabilityStore, FileBroker};
use jspaint_config::MediatorConfig;
use jspaint_platform::WallpaperSetter;
use tokio::runtime::Handle;

use crate::dialogs::RfdDialogs;

use super::dispatch::Dispatcher;
use super::supervisor::{Activation, WindowSupervisor};
use super::surface::EditorSurface;
use super::types::AppEventSender;

/// Top-level application state.
pub struct JsPaintApp {
    pub(super) config: MediatorConfig,
    pub(super) is_dev: bool,
    pub(super) assets_dir: PathBuf,

    // The editor window and its UI connection
    pub(super) supervisor: WindowSupervisor<EditorSurface>,
    pub(super) dispatcher: Dispatcher,
    pub(super) dialogs: Arc<RfdDialogs>,

    pub(super) sender: AppEventSender,

    // Set once a force quit began; no new surface is built after it
    pub(super) quitting: bool,
    pub(super) exit_code: ExitCode,
}

impl JsPaintApp {
    pub fn new(config: MediatorConfig, is_dev: bool, runtime: Handle, sender: AppEventSender) -> Self {
        let store = Arc::new(CapabilityStore::new());
        let dialogs = Arc::new(RfdDialogs::new());

        let wallpaper_path = wallpaper_path(&config);
        tracing::debug!(path = %wallpaper_path.display(), "Wallpaper image location");
        let broker = Arc::new(FileBroker::new(
            Arc::clone(&store),
            dialogs.clone(),
            WallpaperSetter::new(config.wallpaper.tool_timeout()),
            wallpaper_path,
        ));

        let dispatcher = Dispatcher::new(broker, runtime, sender.completion_sink(), is_dev);
        let assets_dir = super::init::resolve_assets_dir(&config);

        Self {
            config,
            is_dev,
            assets_dir,
            supervisor: WindowSupervisor::new(store),
            dispatcher,
            dialogs,
            sender,
            quitting: false,
            exit_code: ExitCode::SUCCESS,
        }
    }

    /// Show the editor for the first launch. The surface itself is built
    /// once the event loop resumes.
    pub fn launch(&mut self, file_path: Option<PathBuf>) {
        if let Some(path) = &file_path {
            tracing::info!("Opening {}", path.display());
        }
        if self.supervisor.activate(file_path) != Activation::Create {
            tracing::debug!("Editor window already requested");
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        self.exit_code
    }
}

/// Where `set-wallpaper` writes its image: the data directory, or the temp
/// directory if that cannot be resolved.
fn wallpaper_path(config: &MediatorConfig) -> PathBuf {
    let dir = jspaint_platform::data_dir().unwrap_or_else(|e| {
        tracing::warn!("No data directory, using temp dir for wallpaper: {e}");
        std::env::temp_dir()
    });
    dir.join(&config.wallpaper.file_name)
}
