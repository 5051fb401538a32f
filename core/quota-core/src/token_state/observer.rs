//! Audit hooks for window changes.
//!
//! A machine reports every recorder call to its observer, which is a
//! [`TracingObserver`] unless one is supplied.
//! Events arrive in call order, each carrying the windows as they stand
//! right after the change.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::windows::WindowSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowEventKind {
    SecureSet,
    MigrationKeep,
    SecureCleared,
    PlaintextCleared,
    Reset,
}

impl WindowEventKind {
    pub fn label(self) -> &'static str {
        match self {
            WindowEventKind::SecureSet => "secure_set",
            WindowEventKind::MigrationKeep => "migration_keep",
            WindowEventKind::SecureCleared => "secure_cleared",
            WindowEventKind::PlaintextCleared => "plaintext_cleared",
            WindowEventKind::Reset => "reset",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowEvent {
    pub kind: WindowEventKind,
    pub at: DateTime<Utc>,
    pub windows: WindowSnapshot,
}

pub trait TokenObserver: Send + Sync {
    fn on_window_event(&self, event: &WindowEvent);
}

/// Logs each event at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl TokenObserver for TracingObserver {
    fn on_window_event(&self, event: &WindowEvent) {
        tracing::debug!(
            kind = event.kind.label(),
            at = %event.at.to_rfc3339(),
            secure_assume_ms = event.windows.secure_assume_ms,
            legacy_retain_ms = event.windows.legacy_retain_ms,
            legacy_suppress_ms = event.windows.legacy_suppress_ms,
            "Recorded token window change"
        );
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<WindowEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<WindowEvent> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn kinds(&self) -> Vec<WindowEventKind> {
        self.events().into_iter().map(|event| event.kind).collect()
    }
}

impl TokenObserver for RecordingObserver {
    fn on_window_event(&self, event: &WindowEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event.clone());
    }
}
