//! Logging setup and timing helpers.
//!
//! The library itself only emits `tracing` events. Binaries and tests that
//! want to see them call [`init_tracing`] once at startup.

use std::time::Instant;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Installs a global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over `filter` when it is set. With `json`
/// enabled, events are written as one JSON object per line. Returns `false`
/// if a global subscriber was already installed.
pub fn init_tracing(filter: &str, json: bool) -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(false))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .try_init()
    };
    installed.is_ok()
}

/// Measures the duration of a named unit of work.
#[derive(Debug)]
pub struct SpanTimer {
    start: Instant,
    name: String,
}

impl SpanTimer {
    /// Starts a new timer.
    #[must_use]
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    /// Returns the elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Returns the timer name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_timer() {
        let timer = SpanTimer::start("register");
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert!(timer.elapsed_ms() >= 10.0);
        assert_eq!(timer.name(), "register");
    }

    #[test]
    fn test_init_tracing_once() {
        init_tracing("debug", false);
        // the global subscriber can only be installed once per process
        assert!(!init_tracing("info", true));
    }
}
