//! Wire types shared by the Melkyar upload client and media server.
//!
//! Covers the chunk upload and finalize exchanges, the media error
//! body, route/header constants and the extension-to-content-type
//! tables used when serving stored media.

pub mod constants;
pub mod messages;
pub mod mime;
pub mod text;

// Re-export primary types for convenience.
pub use messages::{ChunkUploadResponse, ErrorBody, FinalizeRequest, FinalizeResponse, MessageBody};
pub use mime::{image_content_type, video_content_type};
