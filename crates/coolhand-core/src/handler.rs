//! Capture handler registry.
//!
//! Holds at most one handler. Delivery is synchronous and in-line with the
//! call that produced the event; there is no queue at this layer. A handler
//! that panics loses its event but never affects the intercepted call.
//!
//! The panic is caught after the process panic hook has run, so with the
//! default hook the message still reaches stderr. Installing a quieter hook
//! is left to the host application.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::snapshot::CaptureEvent;

/// Callback receiving capture events.
pub type CaptureHandler = Arc<dyn Fn(CaptureEvent) + Send + Sync>;

/// Single-slot handler registry.
#[derive(Default)]
pub struct HandlerRegistry {
    handler: RwLock<Option<CaptureHandler>>,
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handler", &self.is_set())
            .finish()
    }
}

impl HandlerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the current handler.
    pub fn set<F>(&self, handler: F)
    where
        F: Fn(CaptureEvent) + Send + Sync + 'static,
    {
        *self.handler.write() = Some(Arc::new(handler));
    }

    /// Replaces the current handler with a shared one.
    pub fn set_shared(&self, handler: CaptureHandler) {
        *self.handler.write() = Some(handler);
    }

    /// Removes the current handler, returning it.
    pub fn clear(&self) -> Option<CaptureHandler> {
        self.handler.write().take()
    }

    /// Returns the current handler.
    pub fn get(&self) -> Option<CaptureHandler> {
        self.handler.read().clone()
    }

    /// Returns true if a handler is registered.
    pub fn is_set(&self) -> bool {
        self.handler.read().is_some()
    }

    /// Delivers an event to the current handler.
    ///
    /// Returns true if a handler ran to completion. Without a handler the
    /// event is dropped. The lock is released before the handler runs, so a
    /// handler may replace itself.
    ///
    /// A panicking handler returns false. The panic hook is not suppressed.
    pub fn dispatch(&self, event: CaptureEvent) -> bool {
        let handler = match self.get() {
            Some(handler) => handler,
            None => {
                tracing::trace!("No capture handler registered; dropping event");
                return false;
            }
        };

        match catch_unwind(AssertUnwindSafe(|| handler(event))) {
            Ok(()) => true,
            Err(_) => {
                tracing::debug!("Capture handler panicked; event discarded");
                false
            }
        }
    }
}
