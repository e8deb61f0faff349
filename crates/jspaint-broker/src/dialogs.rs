use std::path::PathBuf;

use futures_util::future::BoxFuture;
use jspaint_common::protocol::{OpenDialogOptions, SaveDialogOptions};

/// Native file dialogs.
///
/// Both methods are called on the thread that owns the window so the
/// implementation can parent the dialog; the returned future is then
/// driven elsewhere. Cancellation yields `None` / an empty list.
pub trait DialogProvider: Send + Sync {
    fn save_file(&self, options: &SaveDialogOptions) -> BoxFuture<'static, Option<PathBuf>>;

    fn open_files(&self, options: &OpenDialogOptions) -> BoxFuture<'static, Vec<PathBuf>>;
}
