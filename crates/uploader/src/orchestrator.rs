//! Upload orchestrator: drives one file through the chunk pipeline.

use std::path::Path;

use tracing::{debug, error, info};

use melkyar_transfer::{ChunkReader, ProgressTracker, UploadSession};

use crate::credentials::CredentialProvider;
use crate::error::UploadError;
use crate::retry::retry_with_backoff;
use crate::transport::ChunkTransport;
use crate::types::{UploadOptions, UploadState, generate_upload_id};

/// Invoked with the cumulative percentage (0–100) after each acknowledged chunk.
pub type ProgressCallback = Box<dyn Fn(u8) + Send + Sync>;

/// Invoked once when the upload ends in failure.
pub type ErrorCallback = Box<dyn Fn(&UploadError) + Send + Sync>;

/// Uploads a single file. An instance handles exactly one upload.
pub struct UploadOrchestrator<'a> {
    transport: &'a dyn ChunkTransport,
    credentials: &'a dyn CredentialProvider,
    options: UploadOptions,
    on_progress: Option<ProgressCallback>,
    on_error: Option<ErrorCallback>,
    state: UploadState,
}

impl<'a> UploadOrchestrator<'a> {
    pub fn new(transport: &'a dyn ChunkTransport, credentials: &'a dyn CredentialProvider) -> Self {
        Self {
            transport,
            credentials,
            options: UploadOptions::default(),
            on_progress: None,
            on_error: None,
            state: UploadState::Init,
        }
    }

    pub fn with_options(mut self, options: UploadOptions) -> Self {
        self.options = options;
        self
    }

    /// Registers the progress callback.
    pub fn on_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    /// Registers the error callback.
    pub fn on_error(mut self, callback: ErrorCallback) -> Self {
        self.on_error = Some(callback);
        self
    }

    pub fn state(&self) -> UploadState {
        self.state
    }

    /// Uploads the file at `path` and returns the server-assigned filename.
    ///
    /// Chunks are sent strictly in index order; chunk `i + 1` is read
    /// only after chunk `i` was acknowledged. A chunk that still fails
    /// after its retry budget aborts the upload without finalizing.
    /// Chunks already sent are not rolled back.
    pub async fn upload(&mut self, path: &Path) -> Result<String, UploadError> {
        if self.state != UploadState::Init {
            return Err(UploadError::AlreadyStarted);
        }

        match self.run(path).await {
            Ok(filename) => {
                self.state = UploadState::Done;
                info!(filename = %filename, "upload finished");
                Ok(filename)
            }
            Err(e) => {
                self.state = UploadState::Failed;
                error!(path = %path.display(), error = %e, "upload failed");
                if let Some(cb) = &self.on_error {
                    cb(&e);
                }
                Err(e)
            }
        }
    }

    async fn run(&mut self, path: &Path) -> Result<String, UploadError> {
        let token = self
            .credentials
            .token()
            .ok_or(UploadError::MissingCredential)?;

        let mut reader = ChunkReader::open(path, self.options.chunk_size).await?;
        if reader.file_size() == 0 {
            return Err(UploadError::EmptyFile);
        }

        let original_filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let session = UploadSession::new(generate_upload_id(), reader.plan(), original_filename);

        info!(
            upload_id = %session.upload_id,
            total_chunks = session.total_chunks,
            file_size = reader.file_size(),
            "starting upload"
        );

        // 1. Send chunks
        self.state = UploadState::Sending;
        let mut progress = ProgressTracker::new(session.total_chunks);

        for index in 0..session.total_chunks {
            let chunk = reader.read_chunk(index).await?;

            let transport = self.transport;
            let (session_ref, chunk_ref, token_ref) = (&session, &chunk, token.as_str());
            let ack = retry_with_backoff(&self.options.retry, index, move || {
                transport.send_chunk(session_ref, chunk_ref, token_ref)
            })
            .await?;

            let pct = progress.acknowledge();
            debug!(
                upload_id = %session.upload_id,
                chunk_index = index,
                chunk_id = %ack.chunk_id,
                progress = pct,
                "chunk acknowledged"
            );
            if let Some(cb) = &self.on_progress {
                cb(pct);
            }
        }

        // 2. Finalize
        self.state = UploadState::Finalizing;
        let filename = self.transport.finalize(&session, &token).await?;
        Ok(filename)
    }
}
