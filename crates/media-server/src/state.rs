use std::path::PathBuf;
use std::sync::Arc;

use axum::http::HeaderMap;
use tracing::{info, warn};

use melkyar_protocol::constants::TOKEN_HEADER;
use melkyar_transfer::ChunkStore;

use crate::auth::{generate_token, is_authorized};
use crate::config::ServerConfig;
use crate::error::ApiError;

/// State shared by all request handlers.
pub struct AppState {
    pub store: Arc<ChunkStore>,
    pub videos_dir: PathBuf,
    pub images_dir: PathBuf,
    tokens: Vec<String>,
}

impl AppState {
    /// Builds handler state from `config`.
    ///
    /// If no tokens are configured a random one is generated and logged
    /// so the operator can hand it to uploaders.
    pub fn new(config: &ServerConfig) -> Self {
        let tokens = if config.api_tokens.is_empty() {
            let token = generate_token();
            info!(token = %token, "no api tokens configured, generated one");
            vec![token]
        } else {
            config.api_tokens.clone()
        };

        Self {
            store: Arc::new(ChunkStore::new(&config.staging_dir())),
            videos_dir: config.videos_dir(),
            images_dir: config.images_dir(),
            tokens,
        }
    }

    /// Accepted upload credentials.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Checks the `token` header of an upload request.
    pub fn authorize(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        let received = headers.get(TOKEN_HEADER).and_then(|v| v.to_str().ok());
        if is_authorized(received, &self.tokens) {
            Ok(())
        } else {
            warn!(has_token = received.is_some(), "rejected upload request");
            Err(ApiError::Unauthorized)
        }
    }
}
