//! Upload error types.

use melkyar_protocol::text;

/// Errors produced while uploading a file.
///
/// Display strings are user-facing: they carry the server's message
/// when it sent one, otherwise a generic localized message.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transfer error: {0}")]
    Transfer(#[from] melkyar_transfer::TransferError),

    #[error("HTTP client error: {0}")]
    Client(#[source] reqwest::Error),

    /// The server answered a chunk with a failure.
    #[error("{message}")]
    ChunkRejected { status: u16, message: String },

    /// The chunk request never produced a response.
    #[error("{}", text::CHUNK_UPLOAD_FAILED)]
    Network(#[source] reqwest::Error),

    /// The chunk request was aborted by the client-side timeout.
    #[error("{}", text::CHUNK_TIMEOUT)]
    Timeout,

    #[error("{message}")]
    Finalize { status: Option<u16>, message: String },

    #[error("{}", text::UNAUTHORIZED)]
    MissingCredential,

    #[error("source file is empty")]
    EmptyFile,

    #[error("orchestrator already used")]
    AlreadyStarted,
}

impl UploadError {
    /// `true` for a definitive client-side rejection (HTTP 4xx other than
    /// 408/429), i.e. a failure that resending the same chunk will not fix.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            UploadError::ChunkRejected { status, .. }
                if (400..500).contains(status) && *status != 408 && *status != 429
        )
    }
}
