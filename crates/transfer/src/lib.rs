//! Chunk planning, chunk reading and server-side chunk staging.
//!
//! The client side splits a source file into fixed-size byte ranges and
//! reads them by index. The server side stages received chunks per
//! upload session and reassembles them into the final media file.

mod chunked;
mod naming;
mod plan;
mod progress;
mod store;
mod types;
mod validation;

pub use chunked::ChunkReader;
pub use naming::{finalized_filename, original_extension};
pub use plan::ChunkPlan;
pub use progress::{ProgressTracker, progress_percent};
pub use store::ChunkStore;
pub use types::{Chunk, UploadSession};
pub use validation::{validate_media_filename, validate_upload_id};

pub use melkyar_protocol::constants::DEFAULT_CHUNK_SIZE;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("invalid upload id: {0}")]
    InvalidUploadId(String),

    #[error("chunk index {index} out of range (total {total})")]
    ChunkOutOfRange { index: u64, total: u64 },

    #[error("total chunk count changed from {expected} to {actual}")]
    TotalMismatch { expected: u64, actual: u64 },

    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("upload {upload_id} is missing {missing} chunk(s)")]
    Incomplete { upload_id: String, missing: usize },
}
