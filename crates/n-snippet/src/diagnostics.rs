//! Diagnostic sink for edit dispatch.
//!
//! Dispatch narrates its routing decisions (which child it considered, which
//! case matched, how a deletion was split). Where that narration goes is up
//! to the caller: nowhere by default, into `tracing` for a running editor, or
//! into a `Vec` in tests. The sink never changes behavior.

use std::fmt;

/// Receives diagnostic lines from the region tree.
pub trait DiagnosticSink {
    fn debug(&mut self, message: fmt::Arguments<'_>);
}

/// Drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl DiagnosticSink for NoopSink {
    #[inline]
    fn debug(&mut self, _message: fmt::Arguments<'_>) {}
}

/// Forwards to `tracing` at debug level under the `n_snippet::dispatch`
/// target, so `RUST_LOG=n_snippet::dispatch=debug` shows edit routing.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn debug(&mut self, message: fmt::Arguments<'_>) {
        tracing::debug!(target: "n_snippet::dispatch", "{message}");
    }
}

/// Keeps every line. Handy for asserting on routing in tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub lines: Vec<String>,
}

impl RecordingSink {
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// True if any recorded line contains `needle`.
    #[must_use]
    pub fn mentions(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.contains(needle))
    }
}

impl DiagnosticSink for RecordingSink {
    fn debug(&mut self, message: fmt::Arguments<'_>) {
        self.lines.push(message.to_string());
    }
}
