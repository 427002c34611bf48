//! HTTP server for the Melkyar media pipeline.
//!
//! Receives upload chunks, reassembles them on finalize, and serves
//! stored videos and images with byte-range support for seekable
//! playback. Chunk and finalize endpoints require a `token` header;
//! media endpoints are public.

mod auth;
mod config;
mod error;
mod handlers;
mod range;
mod server;
mod state;

pub use auth::{generate_token, is_authorized, validate_token};
pub use config::ServerConfig;
pub use error::ApiError;
pub use range::{ByteRange, RangeRequest, parse_range};
pub use server::{MediaServer, router};
pub use state::AppState;

/// Errors produced by the media server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },
}
