//! Stderr diagnostics for headless runs.
//!
//! On the vehicle there is no display, so every stage reports through the
//! `log` facade and this module renders the records as
//! `[  12.345s  WARN detector] message`. The target is cut down to its last
//! path segment so detector, fitting and steering lines stay apart in a
//! narrow serial console.
//!
//! With the `tracing` feature, [`init_tracing`] installs a
//! `tracing-subscriber` formatter instead; `log` records are bridged into it.

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

/// Last `::` segment of a log target (`lanekeep_vision::fit` -> `fit`).
pub fn short_target(target: &str) -> &str {
    target.rsplit("::").next().unwrap_or(target)
}

/// Map a `-v` count onto a filter: warnings by default, then info, debug,
/// trace.
pub fn level_for_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

struct StderrLogger {
    level: LevelFilter,
    started: Instant,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!(
            "[{:8.3}s {:>5} {}] {}\n",
            self.started.elapsed().as_secs_f64(),
            record.level(),
            short_target(record.target()),
            record.args()
        );
        // one write per record keeps lines whole when stages log concurrently
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

/// Install the stderr logger. Later calls keep the first logger.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let logger = LOGGER.get_or_init(|| StderrLogger {
        level,
        started: Instant::now(),
    });
    log::set_logger(logger)?;
    log::set_max_level(level);
    Ok(())
}

/// Output format of [`init_tracing`].
#[cfg(feature = "tracing")]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TraceFormat {
    /// Human-readable lines with uptime stamps.
    #[default]
    Pretty,
    /// One flattened JSON object per event, for log shippers.
    Json,
}

/// Install a `tracing` subscriber reporting span timings on close.
///
/// The filter comes from `RUST_LOG`, defaulting to `info`. A subscriber
/// already installed is left in place.
#[cfg(feature = "tracing")]
pub fn init_tracing(format: TraceFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE);
    let _ = match format {
        TraceFormat::Json => builder.json().flatten_event(true).finish().try_init(),
        TraceFormat::Pretty => builder
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_are_shortened() {
        assert_eq!(short_target("lanekeep_vision::fit"), "fit");
        assert_eq!(short_target("lanekeep"), "lanekeep");
        assert_eq!(short_target(""), "");
    }

    #[test]
    fn verbosity_raises_the_level() {
        assert_eq!(level_for_verbosity(0), LevelFilter::Warn);
        assert_eq!(level_for_verbosity(2), LevelFilter::Debug);
        assert_eq!(level_for_verbosity(9), LevelFilter::Trace);
    }

    #[test]
    fn repeated_init_is_a_no_op() {
        assert!(init_with_level(LevelFilter::Info).is_ok());
        assert!(init_with_level(LevelFilter::Trace).is_ok());
        assert_eq!(log::max_level(), LevelFilter::Info);
    }
}
