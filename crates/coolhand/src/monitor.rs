//! Monitoring session.
//!
//! A [`Monitor`] ties a sink (whatever consumes capture events, typically a
//! submission queue) to an [`Instrumentation`] and keeps running counts.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

use coolhand_core::{provider_name, CaptureEvent, Config};
use coolhand_http::{Instrumentation, Instrumented};

/// Counters reported by [`Monitor::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonitorStats {
    /// Whether the monitor is started and capture is enabled.
    pub monitoring: bool,
    /// Events for calls that returned a response.
    pub captured: u64,
    /// Events for calls that failed.
    pub failed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    captured: AtomicU64,
    failed: AtomicU64,
}

/// Forwards capture events to a sink while counting them.
#[derive(Debug)]
pub struct Monitor {
    config: Config,
    instrumentation: Arc<Instrumentation>,
    counters: Arc<Counters>,
    started: AtomicBool,
}

impl Monitor {
    /// Creates a monitor bound to the process-wide instrumentation.
    pub fn new(config: Config) -> Self {
        Self::with_instrumentation(config, Instrumentation::global())
    }

    /// Creates a monitor configured from `COOLHAND_*` environment variables.
    pub fn from_env() -> coolhand_core::Result<Self> {
        Ok(Self::new(Config::from_env()?))
    }

    /// Creates a monitor bound to the given instrumentation.
    pub fn with_instrumentation(config: Config, instrumentation: Arc<Instrumentation>) -> Self {
        Self {
            config,
            instrumentation,
            counters: Arc::new(Counters::default()),
            started: AtomicBool::new(false),
        }
    }

    /// Returns the configuration the monitor was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the instrumentation this monitor drives.
    pub fn instrumentation(&self) -> &Arc<Instrumentation> {
        &self.instrumentation
    }

    /// Wraps a transport so its calls are monitored.
    pub fn instrument<T>(&self, inner: T) -> Instrumented<T> {
        self.instrumentation.instrument(inner)
    }

    /// Registers `sink` as the capture handler and enables capture.
    ///
    /// Starting again replaces the sink and keeps the counts.
    pub fn start<F>(&self, sink: F) -> bool
    where
        F: Fn(CaptureEvent) + Send + Sync + 'static,
    {
        let counters = self.counters.clone();
        let silent = self.config.silent;

        self.instrumentation.set_handler(move |event| {
            if event.is_error() {
                counters.failed.fetch_add(1, Ordering::Relaxed);
            } else {
                counters.captured.fetch_add(1, Ordering::Relaxed);
            }
            if !silent {
                log_capture(&event);
            }
            sink(event);
        });

        let enabled = self.instrumentation.enable();
        self.started.store(enabled, Ordering::SeqCst);
        tracing::info!("HTTP monitoring started");
        enabled
    }

    /// Disables capture and removes the sink.
    pub fn stop(&self) {
        if !self.started.swap(false, Ordering::SeqCst) {
            return;
        }
        self.instrumentation.disable();
        self.instrumentation.clear_handler();
        tracing::info!("HTTP monitoring stopped");
    }

    /// Returns true while started and capture is enabled.
    pub fn is_monitoring(&self) -> bool {
        self.started.load(Ordering::SeqCst) && self.instrumentation.is_enabled()
    }

    /// Returns a snapshot of the monitoring flag and capture counters.
    pub fn stats(&self) -> MonitorStats {
        MonitorStats {
            monitoring: self.is_monitoring(),
            captured: self.counters.captured.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }
}

fn log_capture(event: &CaptureEvent) {
    let request = event.request();
    let provider = provider_name(&request.url).unwrap_or("unknown");
    match (event.response(), event.error()) {
        (Some(response), _) => tracing::info!(
            provider,
            method = %request.method,
            url = %request.url,
            status = response.status_code,
            duration_ms = response.duration_ms(),
            streaming = response.is_streaming,
            "Captured LLM API call"
        ),
        (None, error) => tracing::info!(
            provider,
            method = %request.method,
            url = %request.url,
            error = error.unwrap_or_default(),
            "Captured failed LLM API call"
        ),
    }
}
