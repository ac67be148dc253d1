//! Batch upload core.
//!
//! This module owns the client-side state of one upload run: validation,
//! session initiation, the per-file transfer fan-out, and completion
//! detection. The backend and the file reader are trait collaborators.

mod orchestrator;
mod reader;
mod types;

// Re-exports
pub use orchestrator::{BatchConfig, BatchUploadOrchestrator};
pub use reader::{collect_image_files, FsImageReader, ImageReader};
pub use types::{BatchPhase, ClassSelection, UploadForm};
