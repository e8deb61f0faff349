use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;

use futures_util::future::BoxFuture;
use jspaint_common::ResponseCode;

use super::{run_tool, tool_on_path, WallpaperError, WallpaperStrategy};

const XFCONF_QUERY: &str = "xfconf-query";
const CHANNEL: &str = "xfce4-desktop";

/// Xfce keeps one `last-image` property per monitor and workspace; every
/// one of them is pointed at the new image.
#[derive(Debug, Default, Clone, Copy)]
pub struct XfconfWallpaper;

impl WallpaperStrategy for XfconfWallpaper {
    fn name(&self) -> &'static str {
        "xfconf"
    }

    fn is_available(&self) -> bool {
        cfg!(all(unix, not(target_os = "macos"))) && tool_on_path(XFCONF_QUERY)
    }

    fn apply<'a>(
        &'a self,
        image: &'a Path,
        timeout: Duration,
    ) -> BoxFuture<'a, Result<(), WallpaperError>> {
        Box::pin(async move {
            let listing = run_tool(XFCONF_QUERY, ["-c", CHANNEL, "-l"], timeout).await?;
            let properties = last_image_properties(&listing);
            if properties.is_empty() {
                tracing::warn!("xfconf-query listed no last-image properties");
            }
            for property in properties {
                tracing::debug!("Setting {property}");
                run_tool(
                    XFCONF_QUERY,
                    [
                        OsStr::new("-c"),
                        OsStr::new(CHANNEL),
                        OsStr::new("-p"),
                        OsStr::new(property),
                        OsStr::new("-s"),
                        image.as_os_str(),
                    ],
                    timeout,
                )
                .await?;
            }
            Ok(())
        })
    }

    fn failure_code(&self) -> ResponseCode {
        ResponseCode::XfconfFailed
    }
}

/// Property paths from `xfconf-query -l` output that name a background image.
fn last_image_properties(listing: &str) -> Vec<&str> {
    listing
        .lines()
        .map(str::trim)
        .filter(|line| line.contains("last-image"))
        .collect()
}
