//! Batch upload orchestration.
//!
//! One run: validate the form, open a session with the backend, then fan out
//! a read-and-upload transfer for every pending file and aggregate the
//! results. Session initiation strictly precedes any transfer; transfers
//! carry no ordering between them.

use std::path::PathBuf;
use std::sync::Arc;

use futures_util::stream::FuturesUnordered;
use futures_util::StreamExt;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::api::{ClassifierBackend, UploadMetadata};

use super::reader::ImageReader;
use super::types::{BatchPhase, BatchSnapshot, UploadError, UploadForm};

/// Fixed per-run inputs shared by every file in a batch
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Destination storage container, immutable for the session.
    pub container_name: String,
    /// Opaque token identifying the uploader.
    pub owner_id: String,
}

/// Client-side state of one upload run.
///
/// `generation` increases on every `reset()`; asynchronous continuations
/// compare it before applying their result so late arrivals against a
/// discarded run are dropped.
#[derive(Debug, Default)]
struct BatchSession {
    generation: u64,
    phase: BatchPhase,
    files: Vec<PathBuf>,
    file_status: Vec<bool>,
    completed: usize,
    session_id: String,
    error: Option<String>,
    busy: bool,
}

impl BatchSession {
    fn clear_run(&mut self) {
        self.phase = BatchPhase::Idle;
        self.files.clear();
        self.file_status.clear();
        self.completed = 0;
        self.session_id.clear();
        self.error = None;
        self.busy = false;
    }

    /// Succeeded exactly when the status vector is non-empty and all-true.
    fn check_complete(&mut self) {
        if !self.file_status.is_empty() && self.file_status.iter().all(|&done| done) {
            self.phase = BatchPhase::Succeeded;
        }
    }
}

/// Drives one batch of image uploads against a classification backend.
///
/// Generic over the backend and the file reader so the whole flow runs
/// against in-memory fakes in tests.
pub struct BatchUploadOrchestrator<B, R> {
    backend: B,
    reader: R,
    config: BatchConfig,
    form: UploadForm,
    state: Arc<RwLock<BatchSession>>,
}

impl<B: ClassifierBackend, R: ImageReader> BatchUploadOrchestrator<B, R> {
    pub fn new(backend: B, reader: R, config: BatchConfig, form: UploadForm) -> Self {
        Self {
            backend,
            reader,
            config,
            form,
            state: Arc::new(RwLock::new(BatchSession::default())),
        }
    }

    /// Replace the current file selection.
    ///
    /// Resets the status vector to all-false, sized to the new selection.
    /// Ignored while a transfer is running (the selection backs in-flight
    /// indexes).
    pub async fn select_files(&self, files: Vec<PathBuf>) {
        let mut state = self.state.write().await;
        if state.busy {
            debug!("File selection ignored while a transfer is running");
            return;
        }
        state.file_status = vec![false; files.len()];
        state.completed = 0;
        state.files = files;
    }

    /// Read-only view of the current run for progress display.
    pub async fn snapshot(&self) -> BatchSnapshot {
        let state = self.state.read().await;
        BatchSnapshot {
            phase: state.phase,
            file_status: state.file_status.clone(),
            completed: state.completed,
            file_count: state.files.len(),
            error: state.error.clone(),
        }
    }

    /// Discard the current run and return to the initial state.
    ///
    /// Safe at any phase. In-flight transfers are not cancelled; bumping the
    /// generation makes their late resolutions fall on the floor.
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        state.generation += 1;
        state.clear_run();
    }

    /// Validate the form, open a session if none exists, then transfer every
    /// pending file.
    ///
    /// On a `Transferring` session (some files failed earlier) this retries
    /// only the pending indexes against the already-open session. After a
    /// validation or session error the run stays `Failed` until `reset()`.
    pub async fn submit(&self) {
        let Some((generation, need_session)) = self.begin_run().await else {
            return;
        };

        let session_ready = if need_session {
            self.init_session(generation).await
        } else {
            true
        };

        if session_ready {
            self.transfer_pending(generation).await;
        }

        let mut state = self.state.write().await;
        if state.generation == generation {
            state.busy = false;
        }
    }

    /// Phase gate and synchronous validation. Returns the run generation and
    /// whether a session must be opened, or `None` when nothing may start.
    async fn begin_run(&self) -> Option<(u64, bool)> {
        let mut state = self.state.write().await;
        if state.busy {
            debug!("Submit ignored, a run is already in flight");
            return None;
        }

        match state.phase {
            BatchPhase::Idle => {
                state.phase = BatchPhase::Validating;
                if let Err(err) = validate(&self.form, state.files.len()) {
                    warn!("Validation failed: {}", err);
                    state.error = Some(err.to_string());
                    state.phase = BatchPhase::Failed;
                    return None;
                }
                state.error = None;
                state.phase = BatchPhase::AwaitingSession;
                state.busy = true;
                Some((state.generation, true))
            }
            // Manual retry of the files still pending on the open session.
            BatchPhase::Transferring => {
                state.busy = true;
                Some((state.generation, false))
            }
            // Terminal or transient phases: a failed run must be cleared by
            // reset() before another submit is accepted.
            _ => None,
        }
    }

    /// Open the batch session. Returns false when the run may not proceed.
    async fn init_session(&self, generation: u64) -> bool {
        let file_count = self.state.read().await.files.len();

        info!(
            "Opening batch session for {} file(s) in folder '{}'",
            file_count, self.form.folder_name
        );
        let result = self
            .backend
            .init_batch_session(
                &self.config.owner_id,
                &self.form.folder_name,
                &self.config.container_name,
                file_count,
            )
            .await;

        let mut state = self.state.write().await;
        if state.generation != generation {
            debug!("Discarding stale batch session response");
            return false;
        }

        match result {
            Ok(session_id) => {
                debug!("Batch session opened: {}", session_id);
                state.session_id = session_id;
                state.phase = BatchPhase::Transferring;
                true
            }
            Err(err) => {
                let err = UploadError::SessionInit(err.to_string());
                warn!("Batch session init failed: {}", err);
                state.error = Some(err.to_string());
                state.phase = BatchPhase::Failed;
                false
            }
        }
    }

    /// Fan out a transfer for every file whose status is still false and
    /// apply each resolution as it arrives, in any order.
    async fn transfer_pending(&self, generation: u64) {
        let (session_id, pending) = {
            let state = self.state.read().await;
            if state.generation != generation || state.phase != BatchPhase::Transferring {
                return;
            }
            let pending: Vec<(usize, PathBuf)> = state
                .files
                .iter()
                .cloned()
                .enumerate()
                .filter(|(index, _)| !state.file_status[*index])
                .collect();
            (state.session_id.clone(), pending)
        };

        if pending.is_empty() {
            return;
        }
        info!("Transferring {} pending file(s)", pending.len());

        let mut transfers: FuturesUnordered<_> = pending
            .into_iter()
            .map(|(index, path)| {
                let session_id = session_id.clone();
                async move { (index, self.transfer_one(index, path, session_id).await) }
            })
            .collect();

        while let Some((index, result)) = transfers.next().await {
            // Status mutation and completion re-check happen under the same
            // lock so observers never see a complete-but-Transferring state.
            let mut state = self.state.write().await;
            if state.generation != generation {
                debug!("Discarding stale transfer result for file #{}", index);
                continue;
            }
            match result {
                Ok(()) => {
                    if !state.file_status[index] {
                        state.file_status[index] = true;
                        state.completed += 1;
                    }
                    debug!(
                        "Transfer progress: {}/{}",
                        state.completed,
                        state.file_status.len()
                    );
                    state.check_complete();
                    if state.phase == BatchPhase::Succeeded {
                        info!("Batch complete: {} file(s) uploaded", state.completed);
                    }
                }
                Err(err) => {
                    // The index stays pending and eligible for a manual retry.
                    warn!("{}", err);
                }
            }
        }
    }

    /// Read one file, build its metadata record, and upload it.
    async fn transfer_one(
        &self,
        index: usize,
        path: PathBuf,
        session_id: String,
    ) -> Result<(), UploadError> {
        // A Transferring phase implies submit() validated the form, so a
        // class selection is present.
        let Some(class) = self.form.class.as_ref() else {
            return Err(UploadError::Transfer {
                index,
                message: "no class selected".to_string(),
            });
        };

        let image_data_url =
            self.reader
                .read_data_url(&path)
                .await
                .map_err(|err| UploadError::Transfer {
                    index,
                    message: err.to_string(),
                })?;

        let metadata = UploadMetadata {
            container_name: self.config.container_name.clone(),
            uuid: self.config.owner_id.clone(),
            seed_id: class.class_id.clone(),
            seed_name: class.label.clone(),
            zoom: self.form.zoom,
            seed_count: self.form.seed_count,
            image_data_url,
            session_id,
        };

        let acked = self
            .backend
            .upload_batch_image(&metadata)
            .await
            .map_err(|err| UploadError::Transfer {
                index,
                message: err.to_string(),
            })?;
        if !acked {
            return Err(UploadError::Transfer {
                index,
                message: "upload was not acknowledged".to_string(),
            });
        }

        debug!("Uploaded {}", path.display());
        Ok(())
    }
}

/// Fail fast on the first violated condition, in fixed order:
/// class, seed count, zoom level, file selection.
fn validate(form: &UploadForm, file_count: usize) -> Result<(), UploadError> {
    if form.class.is_none() {
        return Err(UploadError::Validation("Please select a class"));
    }
    if form.seed_count < 1 {
        return Err(UploadError::Validation("Please enter a seed count"));
    }
    if form.zoom < 1 {
        return Err(UploadError::Validation("Please enter a zoom level"));
    }
    if file_count == 0 {
        return Err(UploadError::Validation("Please select an image"));
    }
    Ok(())
}
