//! Logger construction
//!
//! The process installs one dispatch globally and every sync worker builds
//! its own from the same settings, so no subscriber is shared between them.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{Dispatch, Level};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Verbosity and styling shared by the process logger and worker loggers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LogSettings {
    pub verbose: bool,
    pub quiet: bool,
    pub color: bool,
}

impl LogSettings {
    /// Filter directive used when `RUST_LOG` is not set
    pub fn default_directive(&self) -> &'static str {
        if self.verbose {
            "gstore=debug,info"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }
}

/// Build a dispatch writing info and below to stdout, warnings and errors to stderr
pub fn build_dispatch(settings: &LogSettings) -> Dispatch {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.default_directive()));

    let stdout = fmt::layer()
        .with_ansi(settings.color)
        .with_writer(std::io::stdout.with_min_level(Level::INFO));
    let stderr = fmt::layer()
        .with_ansi(settings.color)
        .with_writer(std::io::stderr.with_max_level(Level::WARN));

    let subscriber = tracing_subscriber::registry()
        .with(stdout)
        .with(stderr)
        .with(filter);

    Dispatch::new(subscriber)
}

/// Builds a worker's dispatch from the shared settings
pub type DispatchFactory = Arc<dyn Fn(&LogSettings) -> Dispatch + Send + Sync>;

/// Factory producing the stdout/stderr loggers of `build_dispatch`
pub fn default_factory() -> DispatchFactory {
    Arc::new(build_dispatch)
}

/// Install the process-wide logger
pub fn init(settings: &LogSettings) -> Result<()> {
    tracing::dispatcher::set_global_default(build_dispatch(settings))
        .context("Failed to install logger")
}
