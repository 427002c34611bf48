//! Mapping of handler failures to HTTP responses.

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use tracing::{error, warn};

use melkyar_protocol::messages::{ErrorBody, MessageBody};
use melkyar_protocol::text;
use melkyar_transfer::TransferError;

/// Error returned by request handlers.
///
/// Upload endpoints answer with `{ "message": ... }`, media endpoints
/// with `{ "error": ... }`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("missing or invalid token")]
    Unauthorized,

    #[error("bad request: {0}")]
    BadRequest(String),

    /// Request body could not be read (size limit, broken multipart).
    #[error("unreadable request body ({status})")]
    Payload { status: StatusCode },

    #[error("upload not found")]
    UploadNotFound,

    #[error("media file not found")]
    MediaNotFound,

    #[error("range not satisfiable for {size} bytes")]
    RangeNotSatisfiable { size: u64 },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("media read error: {0}")]
    MediaRead(String),
}

impl From<TransferError> for ApiError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::InvalidUploadId(_)
            | TransferError::InvalidPath(_)
            | TransferError::ChunkOutOfRange { .. }
            | TransferError::TotalMismatch { .. } => {
                warn!(error = %err, "rejected chunk metadata");
                ApiError::BadRequest(text::INVALID_CHUNK.to_string())
            }
            TransferError::Incomplete { .. } => {
                ApiError::BadRequest(text::MISSING_CHUNKS.to_string())
            }
            TransferError::SessionNotFound(_) => ApiError::UploadNotFound,
            TransferError::Io(e) => ApiError::Storage(e.to_string()),
        }
    }
}

fn message(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(MessageBody {
            message: message.to_string(),
        }),
    )
        .into_response()
}

fn media_error(status: StatusCode, error: &str) -> Response {
    (
        status,
        Json(ErrorBody {
            error: error.to_string(),
        }),
    )
        .into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized => message(StatusCode::UNAUTHORIZED, text::UNAUTHORIZED),
            ApiError::BadRequest(msg) => message(StatusCode::BAD_REQUEST, &msg),
            ApiError::Payload { status } => message(status, text::INVALID_CHUNK),
            ApiError::UploadNotFound => message(StatusCode::NOT_FOUND, text::UPLOAD_NOT_FOUND),
            ApiError::Storage(e) => {
                error!(error = %e, "upload storage failed");
                message(StatusCode::INTERNAL_SERVER_ERROR, text::SERVER_ERROR)
            }
            ApiError::MediaNotFound => media_error(StatusCode::NOT_FOUND, text::FILE_NOT_FOUND),
            ApiError::MediaRead(e) => {
                error!(error = %e, "media read failed");
                media_error(StatusCode::INTERNAL_SERVER_ERROR, text::SERVER_ERROR)
            }
            ApiError::RangeNotSatisfiable { size } => {
                let mut resp = StatusCode::RANGE_NOT_SATISFIABLE.into_response();
                if let Ok(value) = HeaderValue::from_str(&format!("bytes */{size}")) {
                    resp.headers_mut().insert(header::CONTENT_RANGE, value);
                }
                resp
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn upload_errors_use_message_body() {
        let resp = ApiError::Unauthorized.into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(resp).await["message"], text::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn media_errors_use_error_body() {
        let resp = ApiError::MediaNotFound.into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await["error"], text::FILE_NOT_FOUND);
    }

    #[test]
    fn unsatisfiable_range_reports_size() {
        let resp = ApiError::RangeNotSatisfiable { size: 1000 }.into_response();
        assert_eq!(resp.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(resp.headers()[header::CONTENT_RANGE], "bytes */1000");
    }

    #[tokio::test]
    async fn transfer_errors_map_to_client_errors() {
        let err: ApiError = TransferError::Incomplete {
            upload_id: "u".into(),
            missing: 2,
        }
        .into();
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["message"], text::MISSING_CHUNKS);

        let err: ApiError = TransferError::ChunkOutOfRange { index: 5, total: 3 }.into();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err: ApiError = TransferError::SessionNotFound("u".into()).into();
        assert!(matches!(err, ApiError::UploadNotFound));
    }
}
