//! Shared types for the upload core.

use thiserror::Error;

/// Coarse-grained state of one batch upload run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchPhase {
    #[default]
    Idle,
    Validating,
    AwaitingSession,
    Transferring,
    Succeeded,
    Failed,
}

/// Classification label chosen for a batch.
///
/// `class_id` is empty when the label was typed freeform instead of picked
/// from the backend's class list; how new labels are persisted is the
/// backend's contract.
#[derive(Debug, Clone)]
pub struct ClassSelection {
    pub class_id: String,
    pub label: String,
}

/// User-supplied metadata shared by every file in a batch
#[derive(Debug, Clone)]
pub struct UploadForm {
    pub folder_name: String,
    pub class: Option<ClassSelection>,
    pub seed_count: u32,
    pub zoom: u32,
}

/// Read-only view of the orchestrator state for progress display
#[derive(Debug, Clone, Default)]
pub struct BatchSnapshot {
    pub phase: BatchPhase,
    /// One success flag per selected file, in selection order.
    pub file_status: Vec<bool>,
    pub completed: usize,
    pub file_count: usize,
    /// Last validation or session error, if any.
    pub error: Option<String>,
}

/// Errors raised by a batch upload run
#[derive(Debug, Error)]
pub enum UploadError {
    /// A required field is missing or out of range; nothing was sent.
    #[error("{0}")]
    Validation(&'static str),

    /// The session-initiation call failed; no files were attempted.
    #[error("{0}")]
    SessionInit(String),

    /// A single file's read or upload failed; siblings are unaffected and
    /// the index stays eligible for a later retry.
    #[error("transfer failed for file #{index}: {message}")]
    Transfer { index: usize, message: String },
}
