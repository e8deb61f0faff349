//! Desktop wallpaper integration.
//!
//! Specialized strategies are tried in registration order; the first one
//! whose probe succeeds is the only one attempted. When none is available
//! the platform's generic mechanism runs instead. A specialized strategy
//! that fails does not fall through to the generic one.

mod system;
mod xfce;

use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use futures_util::future::BoxFuture;
use jspaint_common::ResponseCode;

pub use system::SystemWallpaper;
pub use xfce::XfconfWallpaper;

#[derive(Debug, thiserror::Error)]
pub enum WallpaperError {
    #[error("{0} is not installed")]
    ToolMissing(String),

    #[error("{tool} failed: {detail}")]
    ToolFailed { tool: String, detail: String },

    #[error("{tool} did not finish within {timeout:?}")]
    Timeout { tool: String, timeout: Duration },

    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("setting the wallpaper is not supported on this platform")]
    NotSupported,
}

/// One way of applying an image as the desktop background.
pub trait WallpaperStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Cheap runtime probe: is this strategy usable on this machine?
    fn is_available(&self) -> bool;

    /// Apply `image` (already written to disk). Every external tool
    /// invocation is bounded by `timeout`.
    fn apply<'a>(
        &'a self,
        image: &'a Path,
        timeout: Duration,
    ) -> BoxFuture<'a, Result<(), WallpaperError>>;

    /// Response code reported when this strategy fails.
    fn failure_code(&self) -> ResponseCode {
        ResponseCode::SetWallpaperFailed
    }
}

/// A strategy failed; `code` is what the UI is told.
#[derive(Debug, thiserror::Error)]
#[error("{strategy}: {error}")]
pub struct WallpaperFailure {
    pub strategy: &'static str,
    pub code: ResponseCode,
    #[source]
    pub error: WallpaperError,
}

/// Picks and runs a wallpaper strategy.
pub struct WallpaperSetter {
    specialized: Vec<Box<dyn WallpaperStrategy>>,
    fallback: Box<dyn WallpaperStrategy>,
    timeout: Duration,
}

impl WallpaperSetter {
    /// The strategies this build knows about: Xfce first, then the
    /// platform's generic mechanism.
    pub fn new(timeout: Duration) -> Self {
        Self::with_strategies(
            vec![Box::new(XfconfWallpaper)],
            Box::new(SystemWallpaper),
            timeout,
        )
    }

    pub fn with_strategies(
        specialized: Vec<Box<dyn WallpaperStrategy>>,
        fallback: Box<dyn WallpaperStrategy>,
        timeout: Duration,
    ) -> Self {
        Self {
            specialized,
            fallback,
            timeout,
        }
    }

    /// Apply `image`, returning the name of the strategy that succeeded.
    pub async fn apply(&self, image: &Path) -> Result<&'static str, WallpaperFailure> {
        let strategy = self
            .specialized
            .iter()
            .find(|s| s.is_available())
            .unwrap_or(&self.fallback);

        tracing::debug!("Setting wallpaper via {}", strategy.name());
        match strategy.apply(image, self.timeout).await {
            Ok(()) => Ok(strategy.name()),
            Err(error) => Err(WallpaperFailure {
                strategy: strategy.name(),
                code: strategy.failure_code(),
                error,
            }),
        }
    }
}

impl std::fmt::Debug for WallpaperSetter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.specialized.iter().map(|s| s.name()).collect();
        f.debug_struct("WallpaperSetter")
            .field("specialized", &names)
            .field("fallback", &self.fallback.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Whether `program` can be found on `PATH`.
pub(crate) fn tool_on_path(program: &str) -> bool {
    which::which(program).is_ok()
}

/// Run an external tool with arguments passed directly (no shell) and
/// return its stdout. The child is killed if `timeout` elapses.
pub(crate) async fn run_tool<I, A>(
    program: &str,
    args: I,
    timeout: Duration,
) -> Result<String, WallpaperError>
where
    I: IntoIterator<Item = A>,
    A: AsRef<OsStr>,
{
    let mut cmd = tokio::process::Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(WallpaperError::ToolMissing(program.to_string()))
        }
        Ok(Err(source)) => {
            return Err(WallpaperError::Spawn {
                tool: program.to_string(),
                source,
            })
        }
        Err(_) => {
            return Err(WallpaperError::Timeout {
                tool: program.to_string(),
                timeout,
            })
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let detail = if stderr.is_empty() {
            output.status.to_string()
        } else {
            stderr
        };
        return Err(WallpaperError::ToolFailed {
            tool: program.to_string(),
            detail,
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
