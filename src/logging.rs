// Logging setup for roost.
//
// Built on the `tracing` ecosystem. The pool itself only emits events; an
// application embedding it can install any subscriber it likes. These
// helpers cover the common cases: a human-readable console subscriber, a
// JSON variant for log aggregators, and a quiet configuration for tests.

use std::sync::Once;

use tracing::{Level, Subscriber};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Configuration for the logging helpers.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level to display.
    pub level: Level,
    /// Whether to emit JSON instead of human-readable lines.
    pub json_format: bool,
    /// Whether to include file and line information.
    pub show_file_line: bool,
    /// Whether to include thread names and ids.
    pub show_thread_info: bool,
    /// Extra target filters ("target=level,target2=level2").
    pub target_filters: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json_format: false,
            show_file_line: true,
            show_thread_info: true,
            target_filters: None,
        }
    }
}

// Initialization guard so repeated init calls are harmless.
static INIT: Once = Once::new();

/// Install a global subscriber with the given configuration. Safe to call
/// multiple times; only the first call takes effect.
pub fn init(config: LogConfig) {
    INIT.call_once(|| {
        let mut env_filter = EnvFilter::from_default_env().add_directive(config.level.into());
        if let Some(filters) = config.target_filters {
            for filter in filters.split(',') {
                if let Ok(directive) = filter.parse() {
                    env_filter = env_filter.add_directive(directive);
                }
            }
        }

        let registry = tracing_subscriber::registry().with(env_filter);
        let subscriber: Box<dyn Subscriber + Send + Sync> = if config.json_format {
            Box::new(registry.with(fmt::layer().json().flatten_event(true)))
        } else {
            let fmt_layer = fmt::layer()
                .with_ansi(atty::is(atty::Stream::Stdout))
                .with_file(config.show_file_line)
                .with_line_number(config.show_file_line)
                .with_thread_names(config.show_thread_info)
                .with_thread_ids(config.show_thread_info);
            Box::new(registry.with(fmt_layer))
        };

        if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
            eprintln!("Error setting global tracing subscriber: {}", err);
        }
    });
}

/// INFO-level console logging; reasonable for most embedders.
pub fn init_default() {
    init(LogConfig::default());
}

/// Quiet configuration for tests: warnings and errors only, no thread
/// noise.
pub fn init_test() {
    init(LogConfig {
        level: Level::WARN,
        json_format: false,
        show_file_line: true,
        show_thread_info: false,
        target_filters: None,
    });
}
