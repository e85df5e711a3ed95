use std::sync::Once;

use serde::{Deserialize, Serialize};

/// Logger settings, embedded in the engine config.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `env_logger` filter syntax, e.g. `"info,lumen_engine=debug,wgpu=warn"`.
    /// Falls back to `RUST_LOG`, then `info`.
    pub filter: Option<String>,
    /// Adds millisecond timestamps to each line.
    pub timestamps: bool,
}

impl LoggingConfig {
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }
}

static INIT: Once = Once::new();

/// Installs the global logger. Later calls do nothing.
pub fn init_logging(config: &LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        match (&config.filter, std::env::var("RUST_LOG")) {
            (Some(filter), _) => {
                builder.parse_filters(filter);
            }
            (None, Ok(filter)) => {
                builder.parse_filters(&filter);
            }
            (None, Err(_)) => {
                builder.filter_level(log::LevelFilter::Info);
            }
        }

        if config.timestamps {
            builder.format_timestamp_millis();
        } else {
            builder.format_timestamp(None);
        }

        // Another logger may already be installed (tests, embedding host).
        if builder.try_init().is_err() {
            log::debug!("logger already installed");
            return;
        }
        log::debug!("logging initialized");
    });
}
