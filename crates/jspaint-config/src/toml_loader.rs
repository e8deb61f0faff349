//! Reading `config.toml`, and writing the commented template on first run.

use std::io;
use std::path::{Path, PathBuf};

use jspaint_common::ConfigError;

use crate::schema::MediatorConfig;
use crate::validation;

const CONFIG_FILE_NAME: &str = "config.toml";

/// Parse and validate the config at `path`.
///
/// A file that parses but holds out-of-range values is replaced by the
/// defaults, with a warning; only a missing or unparseable file is an error.
pub fn load_from_path(path: &Path) -> Result<MediatorConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ConfigError::FileNotFound(path.to_path_buf()),
        _ => ConfigError::ParseError(format!("cannot read {}: {e}", path.display())),
    })?;

    let config = parse(&text)?;
    match validation::validate(&config) {
        Ok(()) => {
            tracing::info!(path = %path.display(), "Config loaded");
            Ok(config)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), "Ignoring config, using defaults: {e}");
            Ok(MediatorConfig::default())
        }
    }
}

fn parse(text: &str) -> Result<MediatorConfig, ConfigError> {
    toml::from_str(text).map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load the config from the platform config directory, writing the
/// template there first if there is none yet.
pub fn load_default() -> Result<MediatorConfig, ConfigError> {
    let path = default_config_path()?;
    match load_from_path(&path) {
        Err(ConfigError::FileNotFound(_)) => {
            create_default_config(&path)?;
            Ok(MediatorConfig::default())
        }
        other => other,
    }
}

/// `<config dir>/jspaint/config.toml`.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("jspaint").join(CONFIG_FILE_NAME))
        .ok_or_else(|| ConfigError::ParseError("no config directory on this platform".into()))
}

/// Write the commented template to `path`, creating parent directories.
pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    let write = || -> io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, default_config_toml())
    };
    write().map_err(|e| {
        ConfigError::ParseError(format!("cannot write {}: {e}", path.display()))
    })?;

    tracing::info!(path = %path.display(), "Wrote default config");
    Ok(())
}

/// Generate the default TOML config content with comments.
fn default_config_toml() -> &'static str {
    r#"# JS Paint configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[ui]
# assets_dir = "/opt/jspaint/app"   # defaults to ./app next to the executable
# entry = "index.html"
# icon = "images/icons/48x48.png"

[window]
# title = "JS Paint"
# width = 800             # 200-10000
# height = 600            # 200-10000
# min_width = 260
# min_height = 360

[wallpaper]
# file_name = "bg.png"
# tool_timeout_secs = 15  # 1-300

[instance]
# identity = "jspaint"
# forward_attempts = 10   # 1-50
# retry_delay_ms = 200    # 10-5000
# ack_timeout_ms = 3000   # 100-60000

[logging]
# level = "info"          # trace, debug, info, warn, error
"#
}
