//! Configuration validation.
//!
//! Checks numeric ranges and required strings, collecting every problem
//! into a single `ConfigError`.

use jspaint_common::ConfigError;

use crate::schema::MediatorConfig;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &MediatorConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_range(&mut errors, "window.width", config.window.width, 200, 10_000);
    validate_range(&mut errors, "window.height", config.window.height, 200, 10_000);
    validate_range(&mut errors, "window.min_width", config.window.min_width, 100, 10_000);
    validate_range(&mut errors, "window.min_height", config.window.min_height, 100, 10_000);
    if config.window.min_width > config.window.width
        || config.window.min_height > config.window.height
    {
        errors.push("window minimum size exceeds initial size".into());
    }

    validate_range(
        &mut errors,
        "wallpaper.tool_timeout_secs",
        config.wallpaper.tool_timeout_secs,
        1,
        300,
    );
    validate_file_name(&mut errors, "wallpaper.file_name", &config.wallpaper.file_name);

    validate_range(
        &mut errors,
        "instance.forward_attempts",
        config.instance.forward_attempts,
        1,
        50,
    );
    validate_range(
        &mut errors,
        "instance.retry_delay_ms",
        config.instance.retry_delay_ms,
        10,
        5_000,
    );
    validate_range(
        &mut errors,
        "instance.ack_timeout_ms",
        config.instance.ack_timeout_ms,
        100,
        60_000,
    );
    validate_file_name(&mut errors, "instance.identity", &config.instance.identity);

    if config.ui.entry.trim().is_empty() {
        errors.push("ui.entry must not be empty".into());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

/// Push an error if `value` is outside `[min, max]`.
fn validate_range(errors: &mut Vec<String>, name: &str, value: u32, min: u32, max: u32) {
    if value < min || value > max {
        errors.push(format!("{name} = {value} is out of range [{min}, {max}]"));
    }
}

/// Values used as a single path component: no separators, not empty.
fn validate_file_name(errors: &mut Vec<String>, name: &str, value: &str) {
    let bad = value.is_empty()
        || value == "."
        || value == ".."
        || value.contains(|c: char| matches!(c, '/' | '\\' | '\0'));
    if bad {
        errors.push(format!("{name} = {value:?} is not a plain file name"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate(&MediatorConfig::default()).is_ok());
    }

    #[test]
    fn out_of_range_values_are_collected() {
        let mut config = MediatorConfig::default();
        config.window.width = 50;
        config.wallpaper.tool_timeout_secs = 0;
        config.instance.forward_attempts = 0;

        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("window.width = 50"));
        assert!(err.contains("wallpaper.tool_timeout_secs = 0"));
        assert!(err.contains("instance.forward_attempts = 0"));
    }

    #[test]
    fn min_size_larger_than_initial_is_rejected() {
        let mut config = MediatorConfig::default();
        config.window.min_width = 900;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("minimum size"));
    }

    #[test]
    fn wallpaper_file_name_cannot_escape_data_dir() {
        for name in ["../bg.png", "a/b.png", "..", "", "c:\\bg.png"] {
            let mut config = MediatorConfig::default();
            config.wallpaper.file_name = name.into();
            assert!(validate(&config).is_err(), "{name:?} should be rejected");
        }
    }

    #[test]
    fn identity_must_be_plain() {
        let mut config = MediatorConfig::default();
        config.instance.identity = "jspaint/../other".into();
        assert!(validate(&config).is_err());
    }
}
