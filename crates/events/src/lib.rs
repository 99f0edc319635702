#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Event system for vial
//!
//! All user-visible output from the library crates goes through events; no
//! direct logging or printing happens outside the CLI. The installer runs a
//! strictly linear pipeline, so events arrive in step order for one record.

use tokio::sync::mpsc::UnboundedSender;
use vial_types::Version;

/// Events emitted during formula operations
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Operation lifecycle
    OperationStarted { operation: String },
    OperationCompleted { operation: String, success: bool },
    OperationFailed { operation: String, error: String },

    /// Download progress
    DownloadStarted {
        url: String,
        artifact: String,
        total_size: Option<u64>,
    },
    DownloadProgress {
        artifact: String,
        downloaded: u64,
        total: Option<u64>,
    },
    DownloadCompleted { artifact: String, size: u64 },

    /// Artifact verification
    Verified { artifact: String, sha256: String },

    /// Environment provisioning
    VenvCreating {
        package: String,
        version: Version,
        python: String,
    },
    VenvCreated { package: String, version: Version },

    /// Archive installation into the venv
    ArchiveInstalling { package: String, archive: String },
    ArchiveInstalled { package: String, archive: String },

    /// Executable linking
    ExecutableLinked { executable: String, path: String },

    /// Smoke test
    SmokeTestStarted { executable: String, flag: String },
    SmokeTestPassed { executable: String },
    SmokeTestFailed { executable: String, status: String },

    /// Diagnostics
    Warning { message: String },
    DebugLog { message: String },
}

/// Type alias for event sender
pub type EventSender = UnboundedSender<AppEvent>;

/// Type alias for event receiver
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<AppEvent>;

/// Create a new event channel
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// Unified trait for emitting events
///
/// Send errors are ignored; if the receiver is gone the operation continues.
pub trait EventEmitter {
    /// Get the event sender for this emitter
    fn event_sender(&self) -> Option<&EventSender>;

    /// Emit an event through this emitter
    fn emit(&self, event: AppEvent) {
        if let Some(sender) = self.event_sender() {
            let _ = sender.send(event);
        }
    }

    /// Emit an operation started event
    fn emit_operation_started(&self, operation: impl Into<String>) {
        self.emit(AppEvent::OperationStarted {
            operation: operation.into(),
        });
    }

    /// Emit an operation completed event
    fn emit_operation_completed(&self, operation: impl Into<String>, success: bool) {
        self.emit(AppEvent::OperationCompleted {
            operation: operation.into(),
            success,
        });
    }

    /// Emit an operation failed event
    fn emit_operation_failed(&self, operation: impl Into<String>, error: impl Into<String>) {
        self.emit(AppEvent::OperationFailed {
            operation: operation.into(),
            error: error.into(),
        });
    }

    /// Emit a warning event
    fn emit_warning(&self, message: impl Into<String>) {
        self.emit(AppEvent::Warning {
            message: message.into(),
        });
    }

    /// Emit a debug log event
    fn emit_debug(&self, message: impl Into<String>) {
        self.emit(AppEvent::DebugLog {
            message: message.into(),
        });
    }
}

impl EventEmitter for EventSender {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(self)
    }
}

impl EventEmitter for Option<&EventSender> {
    fn event_sender(&self) -> Option<&EventSender> {
        *self
    }
}
