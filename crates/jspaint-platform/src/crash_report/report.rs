use std::backtrace::Backtrace;
use std::io;
use std::panic::PanicHookInfo;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::paths::crash_report_dir;

use super::sanitize::sanitize_report_text;

/// What gets written when the mediator panics. Free-form text is sanitized
/// on construction.
#[derive(Debug, Clone, Serialize)]
pub struct CrashReport {
    pub timestamp: String,
    pub version: &'static str,
    pub os: &'static str,
    pub arch: &'static str,
    pub thread: Option<String>,
    pub message: String,
    /// `file:line:column` of the panic.
    pub location: Option<String>,
    pub backtrace: String,
}

impl CrashReport {
    pub fn from_panic(info: &PanicHookInfo) -> Self {
        let payload = info.payload();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".into());
        let location = info
            .location()
            .map(|loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()));

        Self::new(message, location, Backtrace::force_capture().to_string())
    }

    fn new(message: String, location: Option<String>, backtrace: String) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION"),
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
            thread: std::thread::current().name().map(str::to_string),
            message: sanitize_report_text(&message),
            location: location.map(|l| sanitize_report_text(&l)),
            backtrace: sanitize_report_text(&backtrace),
        }
    }

    /// Write the report as `crash-<time>-<pid>.json` under `dir`.
    ///
    /// On Unix the file is readable by its owner only.
    pub fn write_to(&self, dir: &Path) -> io::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let stamp = chrono::Utc::now().format("%Y%m%d-%H%M%S");
        let path = dir.join(format!("crash-{stamp}-{}.json", std::process::id()));

        let json = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        std::fs::write(&path, json)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))?;
        }
        Ok(path)
    }
}

/// Write a report for a panic into the crash report directory.
///
/// Runs inside the panic hook: every failure is swallowed and yields `None`.
pub fn write_crash_report(info: &PanicHookInfo) -> Option<PathBuf> {
    let dir = crash_report_dir().ok()?;
    CrashReport::from_panic(info).write_to(&dir).ok()
}

/// Write a crash report, then run the previously installed hook.
pub fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if let Some(path) = write_crash_report(info) {
            eprintln!("JS Paint crashed; report saved to {}", path.display());
        }
        previous(info);
    }));
}
