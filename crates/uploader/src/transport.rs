//! Chunk transport trait and its HTTP implementation.
//!
//! `ChunkTransport` keeps the orchestrator decoupled from the wire so
//! the pipeline can be tested with scripted mocks.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use tracing::debug;

use melkyar_protocol::constants::{CHUNK_REQUEST_TIMEOUT, TOKEN_HEADER, fields, routes};
use melkyar_protocol::messages::{
    ChunkUploadResponse, FinalizeRequest, FinalizeResponse, MessageBody,
};
use melkyar_protocol::text;
use melkyar_transfer::{Chunk, UploadSession};

use crate::error::UploadError;

/// Boxed future returned by transport operations.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, UploadError>> + Send + 'a>>;

/// Abstract connection to the upload server.
pub trait ChunkTransport: Send + Sync {
    /// Delivers one chunk and waits for its acknowledgment.
    fn send_chunk<'a>(
        &'a self,
        session: &'a UploadSession,
        chunk: &'a Chunk,
        token: &'a str,
    ) -> TransportFuture<'a, ChunkUploadResponse>;

    /// Asks the server to reassemble the upload; returns the stored filename.
    fn finalize<'a>(
        &'a self,
        session: &'a UploadSession,
        token: &'a str,
    ) -> TransportFuture<'a, String>;
}

/// Transport over HTTP multipart/JSON using `reqwest`.
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
    chunk_timeout: Duration,
}

impl HttpTransport {
    /// Creates a transport for the server at `base_url`
    /// (e.g. `http://localhost:4000`).
    pub fn new(base_url: &str) -> Result<Self, UploadError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(UploadError::Client)?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            chunk_timeout: CHUNK_REQUEST_TIMEOUT,
        })
    }

    /// Overrides the per-chunk request timeout.
    pub fn with_chunk_timeout(mut self, timeout: Duration) -> Self {
        self.chunk_timeout = timeout;
        self
    }

    fn url(&self, route: &str) -> String {
        format!("{}{}", self.base_url, route)
    }

    async fn post_chunk(
        &self,
        session: &UploadSession,
        chunk: &Chunk,
        token: &str,
    ) -> Result<ChunkUploadResponse, UploadError> {
        let part = Part::bytes(chunk.data.clone())
            .file_name("blob")
            .mime_str("application/octet-stream")
            .map_err(UploadError::Client)?;
        let form = Form::new()
            .part(fields::CHUNK, part)
            .text(fields::CHUNK_INDEX, chunk.index.to_string())
            .text(fields::TOTAL_CHUNKS, session.total_chunks.to_string())
            .text(fields::UPLOAD_ID, session.upload_id.clone());

        let resp = self
            .http
            .post(self.url(routes::UPLOAD_CHUNK))
            .header(TOKEN_HEADER, token)
            .multipart(form)
            .timeout(self.chunk_timeout)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = resp.status();
        let body = resp.bytes().await.map_err(classify_send_error)?;
        let parsed = serde_json::from_slice::<ChunkUploadResponse>(&body).ok();

        match parsed {
            Some(ack) if status.is_success() && ack.success => Ok(ack),
            other => {
                let message = other
                    .and_then(|r| r.message)
                    .or_else(|| server_message(&body))
                    .unwrap_or_else(|| text::CHUNK_UPLOAD_FAILED.to_string());
                Err(UploadError::ChunkRejected {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    async fn post_finalize(
        &self,
        session: &UploadSession,
        token: &str,
    ) -> Result<String, UploadError> {
        let req = FinalizeRequest {
            upload_id: session.upload_id.clone(),
            original_filename: session.original_filename.clone(),
        };

        let resp = self
            .http
            .post(self.url(routes::UPLOAD_FINALIZE))
            .header(TOKEN_HEADER, token)
            .json(&req)
            .send()
            .await
            .map_err(|e| {
                debug!(error = %e, "finalize request failed");
                UploadError::Finalize {
                    status: None,
                    message: text::FINALIZE_FAILED.to_string(),
                }
            })?;

        let status = resp.status();
        let body = match resp.bytes().await {
            Ok(body) => body,
            Err(e) => {
                debug!(status = status.as_u16(), error = %e, "failed to read finalize response");
                Default::default()
            }
        };

        if !status.is_success() {
            return Err(UploadError::Finalize {
                status: Some(status.as_u16()),
                message: server_message(&body)
                    .unwrap_or_else(|| text::FINALIZE_FAILED.to_string()),
            });
        }

        let done: FinalizeResponse =
            serde_json::from_slice(&body).map_err(|_| UploadError::Finalize {
                status: Some(status.as_u16()),
                message: text::FINALIZE_FAILED.to_string(),
            })?;
        Ok(done.filename)
    }
}

impl ChunkTransport for HttpTransport {
    fn send_chunk<'a>(
        &'a self,
        session: &'a UploadSession,
        chunk: &'a Chunk,
        token: &'a str,
    ) -> TransportFuture<'a, ChunkUploadResponse> {
        Box::pin(self.post_chunk(session, chunk, token))
    }

    fn finalize<'a>(
        &'a self,
        session: &'a UploadSession,
        token: &'a str,
    ) -> TransportFuture<'a, String> {
        Box::pin(self.post_finalize(session, token))
    }
}

fn classify_send_error(err: reqwest::Error) -> UploadError {
    if err.is_timeout() {
        UploadError::Timeout
    } else {
        debug!(error = %err, "chunk request failed");
        UploadError::Network(err)
    }
}

/// Extracts `message` from an error body, if it has one.
fn server_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<MessageBody>(body)
        .ok()
        .map(|b| b.message)
        .filter(|m| !m.is_empty())
}
