//! Logging Module
//!
//! Installs the global tracing subscriber from the crate's own config: a
//! daily rolling file under the data directory and an optional stderr
//! console. Stdout is left alone for the CLI's JSON output.

use std::path::PathBuf;

use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_FILE_PREFIX: &str = "storefront-session.log";

/// Where and how much to log, derived from `Config`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub dir: PathBuf,
    /// `EnvFilter` directives; `RUST_LOG` or the build default when unset
    pub directives: Option<String>,
    /// Mirror events to stderr
    pub console: bool,
}

fn default_directives() -> &'static str {
    if cfg!(debug_assertions) {
        "debug,hyper=warn,reqwest=warn"
    } else {
        "info,hyper=warn,reqwest=warn"
    }
}

/// Resolve the filter, reporting directives that failed to parse
fn build_filter(directives: Option<&str>) -> (EnvFilter, Option<String>) {
    match directives {
        Some(raw) => match EnvFilter::try_new(raw) {
            Ok(filter) => (filter, None),
            Err(e) => (EnvFilter::new(default_directives()), Some(e.to_string())),
        },
        None => {
            let filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_directives()));
            (filter, None)
        }
    }
}

/// Install the subscriber. Keep the returned guard alive until exit so
/// buffered file output is flushed; a second call leaves the first
/// subscriber in place.
pub fn init(settings: &LogSettings) -> WorkerGuard {
    let _ = std::fs::create_dir_all(&settings.dir);

    let appender = RollingFileAppender::new(Rotation::DAILY, &settings.dir, LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(file_writer);

    let console_layer = settings.console.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .pretty()
    });

    let (filter, rejected) = build_filter(settings.directives.as_deref());
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer);

    let _ = tracing::subscriber::set_global_default(subscriber);

    if let Some(reason) = rejected {
        warn!(%reason, "Ignoring invalid STOREFRONT_LOG directives");
    }
    guard
}
