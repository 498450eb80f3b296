//! Diagnostic reporting for load/save operations.
//!
//! Configuration loading must never crash the owning program, so parse-level
//! problems are reported through an injected sink rather than return values.
//! The default sink forwards to the `tracing` subscriber.

use tracing::{debug, error, warn};

/// Severity of a store diagnostic.
///
/// The numeric values double as verbosity levels: a sink may gate messages
/// with [`DiagnosticSink::enabled`] before they are formatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Severity {
    /// The operation failed outright (e.g. the file cannot be opened)
    Error = 1,
    /// Something was skipped or discarded but loading continued
    Warning = 2,
    /// Verbosity-gated detail (e.g. an unknown key in the file)
    Notice = 3,
}

/// Capability for emitting store diagnostics.
///
/// Implementations must be callable from wherever the owning [`FileStore`]
/// is used; the store checks [`enabled`](Self::enabled) before formatting a
/// message, so an expensive sink can opt out per severity.
///
/// [`FileStore`]: crate::FileStore
pub trait DiagnosticSink: Send + Sync {
    /// Whether messages at `severity` should be emitted at all.
    fn enabled(&self, severity: Severity) -> bool;

    /// Emit a single diagnostic line.
    fn write(&self, severity: Severity, message: &str);
}

/// Default sink forwarding diagnostics to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn enabled(&self, _severity: Severity) -> bool {
        // Filtering is the subscriber's job.
        true
    }

    fn write(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Error => error!("{message}"),
            Severity::Warning => warn!("{message}"),
            Severity::Notice => debug!("{message}"),
        }
    }
}
