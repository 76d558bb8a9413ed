use crate::config::Config;
use log::LevelFilter;
use simplelog::{self, ConfigBuilder};

/// Modules to filter out from logging when not in Trace mode.
/// These are HTTP, TLS and storage client internals that clutter normal log output.
const FILTERED_MODULES: &[&str] = &[
    "hyper",
    "hyper_util",
    "h2",
    "reqwest",
    "reqwest_retry",
    "rustls",
    "object_store",
];

pub struct Logger {}

impl Logger {
    /// Initializes the global logger with configuration based on the provided Config.
    ///
    /// When the log level is set to Trace, all logs including dependency logs are shown.
    /// For all other log levels, verbose dependency logs are filtered out.
    /// Logs go to stderr so that stdout carries only the transcript.
    pub fn init_logger(config: &Config) {
        let log_level_filter = Self::convert_level_filter(config.log_level_filter);
        let apply_filters = Self::should_filter_dependencies(config.log_level_filter);
        let log_config = Self::build_log_config(apply_filters);

        simplelog::TermLogger::init(
            log_level_filter,
            log_config,
            simplelog::TerminalMode::Stderr,
            simplelog::ColorChoice::Auto,
        )
        .expect("Failed to start simplelog");
    }

    /// Converts log::LevelFilter to simplelog::LevelFilter.
    fn convert_level_filter(level: LevelFilter) -> simplelog::LevelFilter {
        match level {
            LevelFilter::Off => simplelog::LevelFilter::Off,
            LevelFilter::Error => simplelog::LevelFilter::Error,
            LevelFilter::Warn => simplelog::LevelFilter::Warn,
            LevelFilter::Info => simplelog::LevelFilter::Info,
            LevelFilter::Debug => simplelog::LevelFilter::Debug,
            LevelFilter::Trace => simplelog::LevelFilter::Trace,
        }
    }

    /// Returns `false` for Trace level (show all logs), `true` for all other levels.
    fn should_filter_dependencies(level: LevelFilter) -> bool {
        level != LevelFilter::Trace
    }

    /// Builds a simplelog Config with optional module filtering.
    fn build_log_config(apply_filters: bool) -> simplelog::Config {
        let mut builder = ConfigBuilder::new();
        builder.set_time_format_rfc3339();

        if apply_filters {
            for module in FILTERED_MODULES {
                builder.add_filter_ignore_str(module);
            }
        }

        builder.build()
    }
}
