//! Mediator configuration.
//!
//! TOML-based configuration with full validation. All sections use
//! `serde(default)` so a partial (or empty) file works out of the box.

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{MediatorConfig, CONFIG_SCHEMA_VERSION};

use jspaint_common::ConfigError;

/// Load config from the platform default path, creating it on first run.
pub fn load_config() -> Result<MediatorConfig, ConfigError> {
    let config = toml_loader::load_default()?;
    validation::validate(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_schema_version_is_1() {
        assert_eq!(CONFIG_SCHEMA_VERSION, 1);
    }
}
