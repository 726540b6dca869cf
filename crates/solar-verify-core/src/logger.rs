//! Logging setup for the verification tools.
//!
//! Both entry points take the caller's level (the CLI's `--log-level`) as the
//! default and let `RUST_LOG` override it. Plain lines look like
//! `[  0.012s  INFO solar_verify] message`.

use std::io::Write;
use std::time::Instant;

use log::LevelFilter;

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

/// Install an `env_logger` on stderr with `level` as the default filter.
///
/// Fails if a logger is already installed.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    let started = Instant::now();
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .format(move |buf, record| {
            writeln!(
                buf,
                "[{:7.3}s {:>5} {}] {}",
                started.elapsed().as_secs_f64(),
                record.level(),
                crate_of(record.target()),
                record.args()
            )
        })
        .try_init()
}

/// Install a `tracing` subscriber with `level` as the default filter.
///
/// Stage spans are reported on close, so per-stage timings show up in the
/// output. `json` switches to one JSON object per event.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool, level: LevelFilter) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level)));
    let builder = fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init()
    };
}

/// First path segment of a log target, i.e. the emitting crate.
fn crate_of(target: &str) -> &str {
    target.split("::").next().unwrap_or(target)
}

#[cfg_attr(not(feature = "tracing"), allow(dead_code))]
fn default_directive(level: LevelFilter) -> String {
    level.to_string().to_ascii_lowercase()
}
