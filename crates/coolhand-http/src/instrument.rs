//! Instrumentation lifecycle.
//!
//! One [`Instrumentation`] owns the enabled flag, the handler registry and the
//! record of the current enable. The process-wide instance lives behind
//! [`Instrumentation::global`]; isolated instances can be built for tests.
//!
//! ```text
//!            enable()                      disable()
//! Unpatched ─────────→ Patched ──────────────────────→ Unpatched
//!                       │  ▲
//!                       └──┘ enable() is a no-op
//! ```
//!
//! The flag is read on every intercepted call, so it is an atomic and never
//! takes the lifecycle lock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use parking_lot::Mutex;

use coolhand_core::{CaptureEvent, CaptureHandler, HandlerRegistry};

use crate::client::Instrumented;

static GLOBAL: Lazy<Arc<Instrumentation>> = Lazy::new(|| Arc::new(Instrumentation::new()));

/// Record of the enable currently in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchState {
    /// Counts enables over the instance's lifetime, starting at 1.
    pub generation: u64,
    /// When instrumentation was enabled.
    pub enabled_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Lifecycle {
    state: Option<PatchState>,
    enables: u64,
}

/// Capture instrumentation: enabled flag, handler and lifecycle state.
pub struct Instrumentation {
    enabled: AtomicBool,
    lifecycle: Mutex<Lifecycle>,
    handlers: HandlerRegistry,
}

impl std::fmt::Debug for Instrumentation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instrumentation")
            .field("enabled", &self.is_enabled())
            .field("state", &self.lifecycle.lock().state)
            .field("handlers", &self.handlers)
            .finish()
    }
}

impl Default for Instrumentation {
    fn default() -> Self {
        Self::new()
    }
}

impl Instrumentation {
    /// Creates a disabled instance with no handler.
    pub fn new() -> Self {
        Self {
            enabled: AtomicBool::new(false),
            lifecycle: Mutex::new(Lifecycle::default()),
            handlers: HandlerRegistry::new(),
        }
    }

    /// Returns the process-wide instance.
    pub fn global() -> Arc<Self> {
        GLOBAL.clone()
    }

    /// Enables capture.
    ///
    /// Returns true once capture is active. Calling it while already enabled
    /// keeps the existing [`PatchState`].
    pub fn enable(&self) -> bool {
        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.state.is_some() {
            tracing::debug!("Instrumentation already enabled");
            return true;
        }

        lifecycle.enables += 1;
        let state = PatchState {
            generation: lifecycle.enables,
            enabled_at: Utc::now(),
        };
        lifecycle.state = Some(state);
        self.enabled.store(true, Ordering::SeqCst);

        tracing::info!(generation = state.generation, "Instrumentation enabled");
        true
    }

    /// Disables capture. Instrumented transports go straight to their inner
    /// transport afterwards.
    pub fn disable(&self) {
        let mut lifecycle = self.lifecycle.lock();
        match lifecycle.state.take() {
            Some(state) => {
                self.enabled.store(false, Ordering::SeqCst);
                tracing::info!(generation = state.generation, "Instrumentation disabled");
            }
            None => tracing::debug!("Instrumentation not enabled; nothing to disable"),
        }
    }

    /// Returns whether capture is enabled (fast atomic read).
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Same as [`is_enabled`](Self::is_enabled).
    pub fn status(&self) -> bool {
        self.is_enabled()
    }

    /// Returns the state recorded by the current enable.
    pub fn patch_state(&self) -> Option<PatchState> {
        self.lifecycle.lock().state
    }

    /// Returns the handler registry.
    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// Registers the capture handler, replacing any previous one.
    pub fn set_handler<F>(&self, handler: F)
    where
        F: Fn(CaptureEvent) + Send + Sync + 'static,
    {
        self.handlers.set(handler);
    }

    /// Returns the current capture handler.
    pub fn handler(&self) -> Option<CaptureHandler> {
        self.handlers.get()
    }

    /// Registers a shared capture handler.
    pub fn set_shared_handler(&self, handler: CaptureHandler) {
        self.handlers.set_shared(handler);
    }

    /// Removes the capture handler. Later events are dropped.
    pub fn clear_handler(&self) {
        self.handlers.clear();
    }

    /// Wraps a transport so its calls go through this instance.
    pub fn instrument<T>(self: &Arc<Self>, inner: T) -> Instrumented<T> {
        Instrumented::with_instrumentation(inner, self.clone())
    }
}
