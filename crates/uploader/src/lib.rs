//! Sequential chunked upload client.
//!
//! This crate drives one file upload end to end: split the file into
//! chunks, send them strictly in index order with per-chunk retry and
//! exponential backoff, report progress, and finally ask the server to
//! reassemble the file. Transport and credentials are injected through
//! the [`ChunkTransport`] and [`CredentialProvider`] traits so the
//! pipeline can be exercised with mocks.
//!
//! # Pipeline
//!
//! 1. **Init**: plan chunks, generate an upload id
//! 2. **Sending**: transmit chunk 0..N-1, one at a time, with retry
//! 3. **Finalizing**: request reassembly, receive the stored filename
//! 4. **Done** / **Failed**: terminal

pub mod credentials;
pub mod error;
pub mod orchestrator;
pub mod retry;
pub mod transport;
pub mod types;

// Re-export primary types for convenience.
pub use credentials::{CredentialProvider, EnvToken, StaticToken};
pub use error::UploadError;
pub use orchestrator::{ErrorCallback, ProgressCallback, UploadOrchestrator};
pub use retry::{RetryPolicy, retry_with_backoff};
pub use transport::{ChunkTransport, HttpTransport, TransportFuture};
pub use types::{UploadOptions, UploadState, generate_upload_id};
