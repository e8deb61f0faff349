use std::path::Path;
use std::time::Duration;

use futures_util::future::BoxFuture;

use super::{WallpaperError, WallpaperStrategy};

/// The platform's own way of setting the desktop background, with the
/// image centered.
///
/// - macOS: System Events via `osascript`
/// - Windows: `SystemParametersInfo` via PowerShell
/// - Other Unix: GNOME settings via `gsettings`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemWallpaper;

impl WallpaperStrategy for SystemWallpaper {
    fn name(&self) -> &'static str {
        "system"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn apply<'a>(
        &'a self,
        image: &'a Path,
        timeout: Duration,
    ) -> BoxFuture<'a, Result<(), WallpaperError>> {
        Box::pin(apply_platform(image, timeout))
    }
}

#[cfg(target_os = "macos")]
async fn apply_platform(image: &Path, timeout: Duration) -> Result<(), WallpaperError> {
    let script = format!(
        "tell application \"System Events\" to tell every desktop to set picture to \"{}\"",
        applescript_escape(&image.to_string_lossy())
    );
    super::run_tool("osascript", ["-e", script.as_str()], timeout).await?;
    Ok(())
}

#[cfg(windows)]
async fn apply_platform(image: &Path, timeout: Duration) -> Result<(), WallpaperError> {
    // WallpaperStyle 0 + TileWallpaper 0 is "center".
    let script = format!(
        "Set-ItemProperty -Path 'HKCU:\\Control Panel\\Desktop' -Name WallpaperStyle -Value '0'; \
         Set-ItemProperty -Path 'HKCU:\\Control Panel\\Desktop' -Name TileWallpaper -Value '0'; \
         Add-Type -TypeDefinition 'using System.Runtime.InteropServices; public class W {{ \
         [DllImport(\"user32.dll\", CharSet=CharSet.Unicode)] public static extern int \
         SystemParametersInfo(int a, int b, string c, int d); }}'; \
         if ([W]::SystemParametersInfo(20, 0, '{}', 3) -eq 0) {{ exit 1 }}",
        powershell_escape(&image.to_string_lossy())
    );
    super::run_tool(
        "powershell",
        ["-NoProfile", "-NonInteractive", "-Command", script.as_str()],
        timeout,
    )
    .await?;
    Ok(())
}

#[cfg(all(unix, not(target_os = "macos")))]
async fn apply_platform(image: &Path, timeout: Duration) -> Result<(), WallpaperError> {
    const SCHEMA: &str = "org.gnome.desktop.background";
    let uri = format!("file://{}", image.display());
    for (key, value) in [
        ("picture-uri", uri.as_str()),
        ("picture-uri-dark", uri.as_str()),
        ("picture-options", "centered"),
    ] {
        let result = super::run_tool("gsettings", ["set", SCHEMA, key, value], timeout).await;
        match result {
            // Older GNOME has no dark variant.
            Err(WallpaperError::ToolFailed { .. }) if key == "picture-uri-dark" => {
                tracing::debug!("gsettings has no {key}, skipping");
            }
            other => {
                other?;
            }
        }
    }
    Ok(())
}

#[cfg(not(any(unix, windows)))]
async fn apply_platform(_image: &Path, _timeout: Duration) -> Result<(), WallpaperError> {
    Err(WallpaperError::NotSupported)
}

#[cfg_attr(not(any(target_os = "macos", test)), allow(dead_code))]
fn applescript_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg_attr(not(any(windows, test)), allow(dead_code))]
fn powershell_escape(s: &str) -> String {
    s.replace('\'', "''")
}
