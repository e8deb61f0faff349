//! Native file dialogs backed by `rfd`.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use futures_util::future::BoxFuture;
use jspaint_broker::DialogProvider;
use jspaint_common::protocol::{FileFilter, OpenDialogOptions, SaveDialogOptions};
use rfd::AsyncFileDialog;
use winit::window::Window;

/// Opens dialogs modal to the editor window when there is one.
///
/// Dialogs are built on the event-loop thread (macOS requires it); only
/// the wait for the user's answer happens on the runtime.
#[derive(Default)]
pub struct RfdDialogs {
    parent: Mutex<Option<Arc<Window>>>,
}

impl RfdDialogs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_parent(&self, window: Option<Arc<Window>>) {
        if let Ok(mut parent) = self.parent.lock() {
            *parent = window;
        }
    }

    fn dialog(
        &self,
        title: Option<&str>,
        default_path: Option<&str>,
        filters: &[FileFilter],
    ) -> AsyncFileDialog {
        let mut dialog = AsyncFileDialog::new();
        if let Ok(parent) = self.parent.lock() {
            if let Some(window) = parent.as_ref() {
                dialog = dialog.set_parent(window.as_ref());
            }
        }
        if let Some(title) = title {
            dialog = dialog.set_title(title);
        }
        if let Some((directory, file_name)) = default_path.and_then(split_default_path) {
            if let Some(directory) = directory {
                dialog = dialog.set_directory(directory);
            }
            if let Some(file_name) = file_name {
                dialog = dialog.set_file_name(file_name);
            }
        }
        for filter in filters {
            if filter.extensions.iter().any(|e| e == "*") {
                continue;
            }
            dialog = dialog.add_filter(filter.name.as_str(), filter.extensions.as_slice());
        }
        dialog
    }
}

impl DialogProvider for RfdDialogs {
    fn save_file(&self, options: &SaveDialogOptions) -> BoxFuture<'static, Option<PathBuf>> {
        let mut dialog = self.dialog(
            options.title.as_deref(),
            options.default_path.as_deref(),
            &options.filters,
        );
        if let Some(name) = &options.default_file_name {
            dialog = dialog.set_file_name(name);
        }
        let picked = dialog.save_file();
        Box::pin(async move { picked.await.map(|handle| handle.path().to_path_buf()) })
    }

    fn open_files(&self, options: &OpenDialogOptions) -> BoxFuture<'static, Vec<PathBuf>> {
        let dialog = self.dialog(
            options.title.as_deref(),
            options.default_path.as_deref(),
            &options.filters,
        );
        let multiple = options.has_property("multiSelections");
        let folders = options.has_property("openDirectory");

        match (folders, multiple) {
            (true, true) => {
                let picked = dialog.pick_folders();
                Box::pin(async move { to_paths(picked.await.unwrap_or_default()) })
            }
            (true, false) => {
                let picked = dialog.pick_folder();
                Box::pin(async move { to_paths(picked.await.into_iter().collect()) })
            }
            (false, true) => {
                let picked = dialog.pick_files();
                Box::pin(async move { to_paths(picked.await.unwrap_or_default()) })
            }
            (false, false) => {
                let picked = dialog.pick_file();
                Box::pin(async move { to_paths(picked.await.into_iter().collect()) })
            }
        }
    }
}

fn to_paths(handles: Vec<rfd::FileHandle>) -> Vec<PathBuf> {
    handles.iter().map(|h| h.path().to_path_buf()).collect()
}

/// Split a `defaultPath` into the directory to start in and a suggested
/// file name. A path naming an existing directory has no file name.
fn split_default_path(default_path: &str) -> Option<(Option<PathBuf>, Option<String>)> {
    if default_path.is_empty() {
        return None;
    }
    let path = Path::new(default_path);
    if path.is_dir() {
        return Some((Some(path.to_path_buf()), None));
    }
    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf);
    let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned());
    Some((directory, file_name))
}
