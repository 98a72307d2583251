//! Log-based diagnostic sink adapter.
//!
//! Implements [`DiagnosticSink`] by writing each status report to the
//! ESP-IDF logger (UART / USB-CDC in production). A telemetry uplink
//! would implement the same trait.

use log::info;

use crate::app::events::StatusSnapshot;
use crate::app::ports::DiagnosticSink;

/// Adapter that logs every [`StatusSnapshot`] to the serial console.
#[derive(Debug, Default)]
pub struct LogDiagnosticSink;

impl LogDiagnosticSink {
    pub fn new() -> Self {
        Self
    }
}

impl DiagnosticSink for LogDiagnosticSink {
    fn emit(&mut self, snapshot: &StatusSnapshot) {
        info!("{}", snapshot.to_line());
    }
}

/// Sink for builds with no diagnostic output.
#[derive(Debug, Default)]
pub struct NoopDiagnosticSink;

impl DiagnosticSink for NoopDiagnosticSink {
    fn emit(&mut self, _snapshot: &StatusSnapshot) {}
}
