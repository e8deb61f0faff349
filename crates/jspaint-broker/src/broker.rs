use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::future::BoxFuture;
use jspaint_common::protocol::{
    FileResponse, OpenDialogOptions, OpenDialogResponse, SaveDialogOptions, SaveDialogResponse,
};
use jspaint_common::{ByteBuffer, ResponseCode};
use jspaint_platform::WallpaperSetter;
use serde_json::Value;

use crate::capability::CapabilityStore;
use crate::dialogs::DialogProvider;

/// The eight bytes every PNG file starts with.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Mediates every filesystem operation the UI asks for.
pub struct FileBroker {
    store: Arc<CapabilityStore>,
    dialogs: Arc<dyn DialogProvider>,
    wallpaper: WallpaperSetter,
    wallpaper_path: PathBuf,
}

impl FileBroker {
    /// `wallpaper_path` is where `set_wallpaper` writes its image before
    /// handing it to the desktop.
    pub fn new(
        store: Arc<CapabilityStore>,
        dialogs: Arc<dyn DialogProvider>,
        wallpaper: WallpaperSetter,
        wallpaper_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            dialogs,
            wallpaper,
            wallpaper_path: wallpaper_path.into(),
        }
    }

    pub fn store(&self) -> &Arc<CapabilityStore> {
        &self.store
    }

    /// Grant a path outside of a dialog (command-line launches).
    pub fn grant(&self, path: impl Into<PathBuf>) {
        self.store.grant(path);
    }

    pub fn is_granted(&self, path: &Path) -> bool {
        self.store.contains(path)
    }

    // =========================================================================
    // FILES
    // =========================================================================

    pub async fn read_file(&self, path: &Path) -> FileResponse {
        if !self.store.contains(path) {
            tracing::warn!("Denied read of {}", path.display());
            return FileResponse::code(ResponseCode::AccessDenied);
        }

        match tokio::fs::read(path).await {
            Ok(data) => {
                let file_name = display_name(path);
                tracing::debug!("Read {} bytes from {}", data.len(), path.display());
                FileResponse::read(data, file_name)
            }
            Err(e) => {
                tracing::warn!("Failed to read {}: {e}", path.display());
                FileResponse::failed(ResponseCode::ReadFailed, e)
            }
        }
    }

    /// The payload shape is checked before the allowlist, so a malformed
    /// write reports `INVALID_DATA` whether or not the path is granted.
    pub async fn write_file(&self, path: &Path, data: &Value) -> FileResponse {
        let Some(bytes) = ByteBuffer::from_value(data) else {
            return FileResponse::failed(ResponseCode::InvalidData, "data is not a byte buffer");
        };

        if !self.store.contains(path) {
            tracing::warn!("Denied write to {}", path.display());
            return FileResponse::code(ResponseCode::AccessDenied);
        }

        match tokio::fs::write(path, bytes.as_slice()).await {
            Ok(()) => {
                tracing::debug!("Wrote {} bytes to {}", bytes.len(), path.display());
                FileResponse::success()
            }
            Err(e) => {
                tracing::warn!("Failed to write {}: {e}", path.display());
                FileResponse::failed(ResponseCode::WriteFailed, e)
            }
        }
    }

    // =========================================================================
    // DIALOGS
    // =========================================================================

    /// Opens the dialog immediately; the returned future resolves once the
    /// user confirms or cancels. A confirmed path is granted before the
    /// future yields the response that names it.
    pub fn show_save_dialog(
        &self,
        options: &SaveDialogOptions,
    ) -> BoxFuture<'static, SaveDialogResponse> {
        let picked = self.dialogs.save_file(options);
        let store = Arc::clone(&self.store);
        Box::pin(async move {
            let Some(path) = picked.await else {
                return SaveDialogResponse::canceled();
            };
            store.grant(path.clone());
            SaveDialogResponse {
                file_name: Some(display_name(&path)),
                path: Some(path),
                canceled: false,
            }
        })
    }

    /// Every chosen path is granted before the response is produced.
    pub fn show_open_dialog(
        &self,
        options: &OpenDialogOptions,
    ) -> BoxFuture<'static, OpenDialogResponse> {
        let picked = self.dialogs.open_files(options);
        let store = Arc::clone(&self.store);
        Box::pin(async move {
            let paths = picked.await;
            if paths.is_empty() {
                return OpenDialogResponse {
                    paths,
                    canceled: true,
                };
            }
            store.grant_all(paths.iter().cloned());
            OpenDialogResponse {
                paths,
                canceled: false,
            }
        })
    }

    // =========================================================================
    // WALLPAPER
    // =========================================================================

    pub async fn set_wallpaper(&self, data: &Value) -> FileResponse {
        let Some(bytes) = ByteBuffer::from_value(data) else {
            return FileResponse::failed(ResponseCode::InvalidData, "data is not a byte buffer");
        };
        if !bytes.as_slice().starts_with(&PNG_SIGNATURE) {
            return FileResponse::failed(ResponseCode::InvalidPngData, "data is not a PNG image");
        }

        if let Err(e) = self.write_wallpaper_image(bytes.as_slice()).await {
            tracing::warn!(
                "Failed to write wallpaper image {}: {e}",
                self.wallpaper_path.display()
            );
            return FileResponse::failed(ResponseCode::WriteTempFailed, e);
        }
        self.store.grant(self.wallpaper_path.clone());

        match self.wallpaper.apply(&self.wallpaper_path).await {
            Ok(strategy) => {
                tracing::info!("Wallpaper set via {strategy}");
                FileResponse::success()
            }
            Err(failure) => {
                tracing::warn!("Failed to set wallpaper: {failure}");
                FileResponse::failed(failure.code, failure.error)
            }
        }
    }

    async fn write_wallpaper_image(&self, bytes: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = self.wallpaper_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.wallpaper_path, bytes).await
    }
}

impl std::fmt::Debug for FileBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileBroker")
            .field("granted", &self.store.len())
            .field("wallpaper", &self.wallpaper)
            .field("wallpaper_path", &self.wallpaper_path)
            .finish()
    }
}

/// File name component shown to the user.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

// =============================================================================
// Tests
// =============================================================================
