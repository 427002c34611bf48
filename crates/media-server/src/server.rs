//! Media server lifecycle and routing.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use melkyar_protocol::constants::routes;

use crate::ServerError;
use crate::config::ServerConfig;
use crate::handlers;
use crate::state::AppState;

/// Allowance for multipart boundaries and the text fields around a chunk.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Builds the HTTP router over `state`.
///
/// Request bodies are capped at `max_chunk_size` plus multipart overhead.
pub fn router(state: Arc<AppState>, max_chunk_size: usize) -> Router {
    Router::new()
        .route(routes::UPLOAD_CHUNK, post(handlers::upload_chunk))
        .route(routes::UPLOAD_FINALIZE, post(handlers::finalize))
        .route(
            &format!("{}/{{filename}}", routes::MEDIA_VIDEOS),
            get(handlers::serve_video),
        )
        .route(
            &format!("{}/{{filename}}", routes::MEDIA_IMAGES),
            get(handlers::serve_image),
        )
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(
            max_chunk_size.saturating_add(MULTIPART_OVERHEAD),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The media HTTP server.
pub struct MediaServer {
    config: ServerConfig,
    state: Arc<AppState>,
    cancel: CancellationToken,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl MediaServer {
    pub fn new(config: ServerConfig) -> Arc<Self> {
        let state = Arc::new(AppState::new(&config));
        Arc::new(Self {
            config,
            state,
            cancel: CancellationToken::new(),
            local_addr: Mutex::new(None),
        })
    }

    /// Returns the local address the server is listening on.
    ///
    /// Only available after [`run`](Self::run) binds the socket.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().await
    }

    /// Accepted upload credentials, including a generated one.
    pub fn tokens(&self) -> &[String] {
        self.state.tokens()
    }

    /// Gracefully shuts down the server.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Runs the server until [`shutdown`](Self::shutdown).
    ///
    /// Creates the media directories, binds the configured address and
    /// starts the staging sweeper alongside the HTTP service.
    pub async fn run(self: &Arc<Self>) -> Result<(), ServerError> {
        for dir in [
            self.config.videos_dir(),
            self.config.images_dir(),
            self.config.staging_dir(),
        ] {
            tokio::fs::create_dir_all(&dir).await?;
        }

        let addr = self.config.bind_addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        let local_addr = listener.local_addr()?;
        *self.local_addr.lock().await = Some(local_addr);
        info!(
            %local_addr,
            media_root = %self.config.media_root.display(),
            "media server listening"
        );

        let sweeper = self.spawn_sweeper();
        let app = router(Arc::clone(&self.state), self.config.max_chunk_size);
        let cancel = self.cancel.clone();
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move { cancel.cancelled().await })
            .await;

        sweeper.abort();
        info!("media server stopped");
        result.map_err(ServerError::from)
    }

    /// Periodically removes staged uploads idle longer than the TTL.
    fn spawn_sweeper(&self) -> JoinHandle<()> {
        let store = Arc::clone(&self.state.store);
        let ttl = self.config.staging_ttl;
        let period = self.config.sweep_interval.max(std::time::Duration::from_secs(1));
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => match store.sweep_stale(ttl).await {
                        Ok(0) => {}
                        Ok(removed) => info!(removed, "swept stale uploads"),
                        Err(e) => warn!(error = %e, "staging sweep failed"),
                    },
                }
            }
        })
    }
}
