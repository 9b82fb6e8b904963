use crate::{core::options::ErrorCallback, MapError};
use once_cell::sync::OnceCell;
use std::{
    fmt,
    sync::atomic::{AtomicBool, Ordering},
};

/// One-shot error latch for a single map surface generation.
///
/// The first [`report`](Self::report) reaches `onError`; every later one is
/// dropped. An invalidated guard (its surface was torn down or replaced)
/// drops everything. Guards are never reset: [`renew`](Self::renew) builds
/// the next generation's guard instead.
pub struct ErrorReportGuard {
    generation: u64,
    reported: OnceCell<String>,
    live: AtomicBool,
    on_error: Option<ErrorCallback>,
}

impl ErrorReportGuard {
    pub fn new(generation: u64, on_error: Option<ErrorCallback>) -> Self {
        Self {
            generation,
            reported: OnceCell::new(),
            live: AtomicBool::new(true),
            on_error,
        }
    }

    /// Forwards `message` to the host unless this guard already fired or
    /// is no longer live. Returns whether the message was forwarded.
    pub fn report(&self, message: &str) -> bool {
        if !self.is_live() {
            log::debug!(
                "dropping error from retired surface generation {}: {message}",
                self.generation
            );
            return false;
        }
        if self.reported.set(message.to_string()).is_err() {
            log::debug!("surface generation {} already reported, dropping: {message}", self.generation);
            return false;
        }

        log::warn!("map surface generation {} failed: {message}", self.generation);
        if let Some(on_error) = &self.on_error {
            on_error(message);
        }
        true
    }

    pub fn report_error(&self, error: &MapError) -> bool {
        self.report(&error.to_string())
    }

    pub fn has_reported(&self) -> bool {
        self.reported.get().is_some()
    }

    /// The message that tripped the latch
    pub fn message(&self) -> Option<&str> {
        self.reported.get().map(String::as_str)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Retires the guard; nothing reported afterwards reaches the host
    pub fn invalidate(&self) {
        self.live.store(false, Ordering::Release);
    }

    /// Retires this guard and returns a fresh one for the next generation
    pub fn renew(&self) -> Self {
        self.invalidate();
        Self::new(self.generation + 1, self.on_error.clone())
    }
}

impl fmt::Debug for ErrorReportGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorReportGuard")
            .field("generation", &self.generation)
            .field("reported", &self.reported.get())
            .field("live", &self.is_live())
            .finish()
    }
}
