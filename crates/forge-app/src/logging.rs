// SPDX-License-Identifier: MIT

//! The only `tracing-subscriber` registry construction in the workspace.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initializes logging to stdout. Suitable for interactive use, examples,
/// and tests.
pub fn init_stdout() {
    tracing_subscriber::registry().with(env_filter()).with(tracing_subscriber::fmt::layer()).init();
}

/// Initializes logging to a daily-rotating file under `directory`, returning
/// the guard that must be kept alive for the duration of the process —
/// dropping it stops the background flush thread and silently drops
/// in-flight log lines.
pub fn init_file(directory: impl AsRef<std::path::Path>, file_prefix: &str) -> WorkerGuard {
    let appender = tracing_appender::rolling::daily(directory, file_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();
    guard
}
