//! `tracing` subscriber setup.
//!
//! Logging starts before the config is read, so the filter sits behind a
//! reload layer: once the config is loaded its `[logging]` level replaces
//! the default, unless `--log-level` was given.

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

const DEFAULT_DIRECTIVE: &str = "jspaint=info";

pub struct LogHandle {
    handle: reload::Handle<EnvFilter, Registry>,
    /// `--log-level` was given and wins over the config.
    pinned: bool,
}

pub fn init(cli_level: Option<&str>) -> LogHandle {
    let directive = cli_level
        .map(level_directive)
        .unwrap_or_else(|| DEFAULT_DIRECTIVE.to_string());
    let (filter, handle) = reload::Layer::new(build_filter(&directive));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    LogHandle {
        handle,
        pinned: cli_level.is_some(),
    }
}

impl LogHandle {
    pub fn apply_config_level(&self, directive: &str) {
        if self.pinned {
            return;
        }
        if let Err(e) = self.handle.reload(build_filter(directive)) {
            tracing::warn!("Failed to apply configured log level: {e}");
        }
    }
}

/// A bare level applies to this program's crates; anything else is used as
/// a full filter directive.
fn level_directive(level: &str) -> String {
    match level.to_ascii_lowercase().as_str() {
        l @ ("trace" | "debug" | "info" | "warn" | "error") => format!("jspaint={l}"),
        _ => level.to_string(),
    }
}

fn build_filter(directive: &str) -> EnvFilter {
    let filter = EnvFilter::from_default_env();
    match directive.parse() {
        Ok(d) => filter.add_directive(d),
        Err(e) => {
            eprintln!("invalid log directive {directive:?} ({e}), using info");
            filter.add_directive(LevelFilter::INFO.into())
        }
    }
}
