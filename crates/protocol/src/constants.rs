use std::time::Duration;

/// Header carrying the opaque upload credential.
pub const TOKEN_HEADER: &str = "token";

/// Multipart field names of a chunk upload request.
pub mod fields {
    pub const CHUNK: &str = "chunk";
    pub const CHUNK_INDEX: &str = "chunkIndex";
    pub const TOTAL_CHUNKS: &str = "totalChunks";
    pub const UPLOAD_ID: &str = "uploadId";
}

/// Route paths served by the media server.
pub mod routes {
    pub const UPLOAD_CHUNK: &str = "/api/upload/chunk";
    pub const UPLOAD_FINALIZE: &str = "/api/upload/finalize";
    pub const MEDIA_VIDEOS: &str = "/api/media/videos";
    pub const MEDIA_IMAGES: &str = "/api/media/images";
}

/// Default chunk size: 1 MiB.
pub const DEFAULT_CHUNK_SIZE: u64 = 1024 * 1024;

/// Hard timeout applied to every chunk request.
pub const CHUNK_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Attempts per chunk before the upload is abandoned.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Delay before the first retry; doubles on each subsequent attempt.
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

/// Video extensions accepted at finalization (lowercase, without dot).
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "ogg", "avi", "mov"];
