use std::fs;
use std::path::PathBuf;

use jspaint_common::PlatformError;

pub(crate) const APP_NAME: &str = "jspaint";

/// Returns the platform-specific configuration directory.
///
/// - macOS: `~/Library/Application Support/jspaint`
/// - Linux: `$XDG_CONFIG_HOME/jspaint` (defaults to `~/.config/jspaint`)
/// - Windows: `%APPDATA%\jspaint`
pub fn config_dir() -> Result<PathBuf, PlatformError> {
    Ok(dirs::config_dir()
        .ok_or_else(|| PlatformError::PathError("could not determine config directory".into()))?
        .join(APP_NAME))
}

/// Returns the platform-specific data directory. Mediator-owned artifacts
/// (the wallpaper image) are written here, never into user-chosen paths.
///
/// - macOS: `~/Library/Application Support/jspaint`
/// - Linux: `$XDG_DATA_HOME/jspaint` (defaults to `~/.local/share/jspaint`)
/// - Windows: `%APPDATA%\jspaint`
pub fn data_dir() -> Result<PathBuf, PlatformError> {
    Ok(dirs::data_dir()
        .ok_or_else(|| PlatformError::PathError("could not determine data directory".into()))?
        .join(APP_NAME))
}

/// Directory for the instance lock and the forwarding socket.
///
/// Uses `$XDG_RUNTIME_DIR` where the platform has one (it is per-user and
/// cleared on logout), otherwise the data directory.
pub fn runtime_dir() -> Result<PathBuf, PlatformError> {
    match dirs::runtime_dir() {
        Some(dir) => Ok(dir.join(APP_NAME)),
        None => data_dir(),
    }
}

/// Located at `data_dir()/logs/crash-reports`.
pub fn crash_report_dir() -> Result<PathBuf, PlatformError> {
    Ok(data_dir()?.join("logs").join("crash-reports"))
}

/// Creates every directory the mediator writes into.
pub fn ensure_dirs() -> Result<(), PlatformError> {
    for dir in [config_dir()?, data_dir()?, runtime_dir()?, crash_report_dir()?] {
        fs::create_dir_all(&dir).map_err(|e| {
            PlatformError::PathError(format!("failed to create {}: {e}", dir.display()))
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_dir_ends_with_app_name() {
        let path = config_dir().unwrap();
        assert!(path.ends_with("jspaint"), "got: {path:?}");
    }

    #[test]
    fn data_dir_ends_with_app_name() {
        let path = data_dir().unwrap();
        assert!(path.ends_with("jspaint"), "got: {path:?}");
    }

    #[test]
    fn runtime_dir_ends_with_app_name() {
        let path = runtime_dir().unwrap();
        assert!(path.ends_with("jspaint"), "got: {path:?}");
    }

    #[test]
    fn crash_reports_live_under_data_dir() {
        let reports = crash_report_dir().unwrap();
        let data = data_dir().unwrap();
        assert!(reports.starts_with(&data));
        assert_eq!(reports.file_name().unwrap(), "crash-reports");
    }
}
