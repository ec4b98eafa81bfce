//! Signal handling for graceful shutdown.
//!
//! The engines expose no cancellation primitive; the only way to stop
//! early is to stop pulling events. This module provides the shared
//! flag the CLI consumer loop checks between events: Ctrl+C sets the
//! flag, the loop observes it before the next pull, and the engine is
//! simply dropped with the tree in a consistent (if incomplete) state.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Shared flag indicating that shutdown was requested.
#[derive(Debug, Clone)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with the flag initially cleared.
    #[must_use]
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Check if shutdown has been requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Manually request a shutdown.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Reset the flag, for reuse across runs in one process.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl Default for ShutdownHandler {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install a Ctrl+C handler that sets the shutdown flag on interrupt.
///
/// The process-wide handler is installed once; later calls (including
/// parallel tests exercising the full app) get the existing handler
/// with the flag reset. If installation fails because some other
/// component already owns the signal, an unhooked handler is returned
/// so manual `request_shutdown` still works.
pub fn install_handler() -> ShutdownHandler {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return handler.clone();
    }

    let handler = ShutdownHandler::new();
    let flag = Arc::clone(&handler.flag);

    match ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        let _ = writeln!(std::io::stderr(), "\nInterrupted. Cleaning up...");
        let _ = std::io::stderr().flush();
    }) {
        Ok(()) => {
            let _ = GLOBAL_HANDLER.set(handler.clone());
            handler
        }
        Err(e) => {
            log::debug!("Ctrl+C handler not installed ({}), using unhooked flag", e);
            let _ = GLOBAL_HANDLER.set(handler.clone());
            handler
        }
    }
}
