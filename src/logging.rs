//! Injected logging seam (no global mutable log state, see design notes).
//!
//! Parsers and the analysis pipeline take `&dyn Logger` rather than calling a
//! process-wide logging macro directly, so a host can route diagnostics anywhere,
//! or nowhere, without the core initializing anything on its own.

use std::cell::RefCell;

/// A single-method logging interface. `code` is a stable machine code (an
/// [`crate::error::ErrorCode`] as a string, or a caller-defined tag); `detail` is a
/// free-form human message.
pub trait Logger {
    fn debug(&self, code: &str, detail: &str);
}

/// Discards everything. The default choice for call sites that don't care.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn debug(&self, _code: &str, _detail: &str) {}
}

/// Forwards to the `log` facade under a fixed target, for hosts that already
/// initialize `log` (e.g. via `env_logger`).
#[derive(Debug, Default, Clone, Copy)]
pub struct FacadeLogger;

impl Logger for FacadeLogger {
    fn debug(&self, code: &str, detail: &str) {
        log::debug!(target: "bdpl", "{code}: {detail}");
    }
}

/// Collects `(code, detail)` pairs for test assertions. Interior-mutable so it can
/// be shared by shared reference across a parse or pipeline run.
#[derive(Debug, Default)]
pub struct RecordingLogger {
    records: RefCell<Vec<(String, String)>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(String, String)> {
        self.records.borrow().clone()
    }
}

impl Logger for RecordingLogger {
    fn debug(&self, code: &str, detail: &str) {
        self.records
            .borrow_mut()
            .push((code.to_string(), detail.to_string()));
    }
}
