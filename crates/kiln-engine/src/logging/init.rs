use std::sync::Once;

use log::LevelFilter;

/// GPU stack crates that are chatty at info level.
const NOISY_TARGETS: [&str; 3] = ["wgpu_core", "wgpu_hal", "naga"];

/// How the engine's logger is set up.
///
/// Filter precedence: `env_filter`, then `RUST_LOG`, then `level` for every
/// target with the GPU stack capped at `warn`.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `env_logger` filter directives, e.g. `"kiln_engine=trace,naga=warn"`.
    pub env_filter: Option<String>,
    pub level: LevelFilter,
    /// Prefix records with a millisecond timestamp.
    pub timestamps: bool,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            level: LevelFilter::Info,
            timestamps: false,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

impl LoggingConfig {
    /// Filter directives this config resolves to, given the value of `RUST_LOG`.
    fn filters(&self, rust_log: Option<String>) -> String {
        if let Some(filter) = self.env_filter.clone().or(rust_log) {
            return filter;
        }
        let cap = self.level.min(LevelFilter::Warn);
        let mut out = self.level.to_string().to_lowercase();
        for target in NOISY_TARGETS {
            out.push_str(&format!(",{target}={}", cap.to_string().to_lowercase()));
        }
        out
    }
}

static INIT: Once = Once::new();

/// Installs the global logger. Only the first call has an effect.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filters = config.filters(std::env::var("RUST_LOG").ok());

        let mut builder = env_logger::Builder::new();
        builder.parse_filters(&filters);
        builder.write_style(config.write_style);
        if config.timestamps {
            builder.format_timestamp_millis();
        } else {
            builder.format_timestamp(None);
        }
        builder.init();

        log::debug!("logging initialized ({filters})");
    });
}
