//! HTTP client for the seed classification backend.
//!
//! One file per endpoint, all implemented as `impl ApiClient` blocks; the
//! `Backend` wrapper binds the configured base URL and exposes the
//! `ClassifierBackend` trait the upload core consumes.

mod backend;
mod batch;
mod class_list;
mod client;
mod http;
mod types;

pub use backend::{Backend, ClassifierBackend};
pub use types::{ClassEntry, ClassListResponse, UploadMetadata};
