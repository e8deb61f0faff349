//! Configuration schema types.
//!
//! All structs use `serde(default)` so partial configs work correctly.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration for the mediator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MediatorConfig {
    pub ui: UiConfig,
    pub window: WindowConfig,
    pub wallpaper: WallpaperConfig,
    pub instance: InstanceConfig,
    pub logging: LoggingConfig,
}

/// Where the paint UI assets live and how to load them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Directory served as `jspaint://localhost/`. When unset, the `app`
    /// directory next to the executable is used.
    pub assets_dir: Option<PathBuf>,
    /// Page loaded into the surface, relative to `assets_dir`.
    pub entry: String,
    /// Window icon, relative to `assets_dir`.
    pub icon: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            assets_dir: None,
            entry: "index.html".into(),
            icon: "images/icons/48x48.png".into(),
        }
    }
}

/// Initial geometry of the editor window, in logical pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    /// Content width (valid range: 200-10000).
    pub width: u32,
    /// Content height (valid range: 200-10000).
    pub height: u32,
    pub min_width: u32,
    pub min_height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "JS Paint".into(),
            width: 800,
            height: 600,
            min_width: 260,
            min_height: 360,
        }
    }
}

/// Desktop background integration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WallpaperConfig {
    /// Name of the image written into the data directory before applying.
    pub file_name: String,
    /// Upper bound for each external tool invocation (valid range: 1-300).
    pub tool_timeout_secs: u32,
}

impl Default for WallpaperConfig {
    fn default() -> Self {
        Self {
            file_name: "bg.png".into(),
            tool_timeout_secs: 15,
        }
    }
}

impl WallpaperConfig {
    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.tool_timeout_secs))
    }
}

/// Single-instance handshake tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceConfig {
    /// Name every launch contends on. Changing it lets two builds coexist.
    pub identity: String,
    /// How many times a secondary tries to reach the primary (valid range: 1-50).
    pub forward_attempts: u32,
    /// Delay between attempts (valid range: 10-5000).
    pub retry_delay_ms: u32,
    /// How long to wait for the primary to acknowledge (valid range: 100-60000).
    pub ack_timeout_ms: u32,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            identity: "jspaint".into(),
            forward_attempts: 10,
            retry_delay_ms: 200,
            ack_timeout_ms: 3000,
        }
    }
}

impl InstanceConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(u64::from(self.retry_delay_ms))
    }

    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.ack_timeout_ms))
    }
}

/// Log level.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// `tracing-subscriber` filter directive for this level.
    pub fn directive(self) -> &'static str {
        match self {
            Self::Trace => "jspaint=trace",
            Self::Debug => "jspaint=debug",
            Self::Info => "jspaint=info",
            Self::Warn => "jspaint=warn",
            Self::Error => "jspaint=error",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_classic_window() {
        let config = MediatorConfig::default();
        assert_eq!(config.window.title, "JS Paint");
        assert_eq!((config.window.width, config.window.height), (800, 600));
        assert_eq!(
            (config.window.min_width, config.window.min_height),
            (260, 360)
        );
        assert_eq!(config.ui.entry, "index.html");
        assert_eq!(config.wallpaper.file_name, "bg.png");
        assert_eq!(config.instance.identity, "jspaint");
    }

    #[test]
    fn empty_toml_yields_defaults() {
        let config: MediatorConfig = toml::from_str("").unwrap();
        assert_eq!(config.window.width, 800);
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config: MediatorConfig = toml::from_str(
            r#"
[window]
width = 1024

[wallpaper]
tool_timeout_secs = 3

[logging]
level = "debug"
"#,
        )
        .unwrap();
        assert_eq!(config.window.width, 1024);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.wallpaper.tool_timeout(), Duration::from_secs(3));
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.level.directive(), "jspaint=debug");
    }

    #[test]
    fn instance_durations() {
        let config = InstanceConfig::default();
        assert_eq!(config.retry_delay(), Duration::from_millis(200));
        assert_eq!(config.ack_timeout(), Duration::from_millis(3000));
    }
}
