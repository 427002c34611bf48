//! Range-capable media serving.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::{Path as UrlPath, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::Response;
use futures_util::{Stream, TryStreamExt};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use melkyar_protocol::mime::{image_content_type, video_content_type};
use melkyar_transfer::validate_media_filename;

use crate::error::ApiError;
use crate::range::{RangeRequest, parse_range};
use crate::state::AppState;

/// `GET /api/media/videos/{filename}`
pub(crate) async fn serve_video(
    State(state): State<Arc<AppState>>,
    UrlPath(filename): UrlPath<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    serve_file(&state.videos_dir, &filename, &headers, video_content_type).await
}

/// `GET /api/media/images/{filename}`
pub(crate) async fn serve_image(
    State(state): State<Arc<AppState>>,
    UrlPath(filename): UrlPath<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    serve_file(&state.images_dir, &filename, &headers, image_content_type).await
}

/// Streams `dir/filename`, honoring a single `Range` header.
///
/// Each request opens its own handle; stored media is never written
/// after finalization, so concurrent requests need no coordination.
async fn serve_file(
    dir: &Path,
    filename: &str,
    headers: &HeaderMap,
    content_type: fn(&Path) -> &'static str,
) -> Result<Response, ApiError> {
    if validate_media_filename(filename).is_err() {
        warn!(filename, "rejected media path");
        return Err(ApiError::MediaNotFound);
    }
    let path = dir.join(filename);

    let mut file = match tokio::fs::File::open(&path).await {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::MediaNotFound);
        }
        Err(e) => return Err(ApiError::MediaRead(e.to_string())),
    };
    let meta = file
        .metadata()
        .await
        .map_err(|e| ApiError::MediaRead(e.to_string()))?;
    if !meta.is_file() {
        return Err(ApiError::MediaNotFound);
    }
    let size = meta.len();

    let range_header = headers.get(header::RANGE).and_then(|v| v.to_str().ok());
    let builder = Response::builder()
        .header(header::CONTENT_TYPE, content_type(&path))
        .header(header::ACCEPT_RANGES, "bytes");

    let response = match parse_range(range_header, size) {
        RangeRequest::Full => {
            debug!(path = %path.display(), size, "serving full file");
            let stream = log_read_errors(ReaderStream::new(file), path);
            builder
                .status(StatusCode::OK)
                .header(header::CONTENT_LENGTH, size)
                .body(Body::from_stream(stream))
        }
        RangeRequest::Partial(range) => {
            debug!(path = %path.display(), start = range.start, end = range.end, size, "serving range");
            file.seek(SeekFrom::Start(range.start))
                .await
                .map_err(|e| ApiError::MediaRead(e.to_string()))?;
            let stream = log_read_errors(ReaderStream::new(file.take(range.len())), path);
            builder
                .status(StatusCode::PARTIAL_CONTENT)
                .header(header::CONTENT_RANGE, range.content_range(size))
                .header(header::CONTENT_LENGTH, range.len())
                .body(Body::from_stream(stream))
        }
        RangeRequest::Unsatisfiable => {
            debug!(path = %path.display(), range = ?range_header, size, "unsatisfiable range");
            return Err(ApiError::RangeNotSatisfiable { size });
        }
    };

    response.map_err(|e| ApiError::MediaRead(e.to_string()))
}

/// Logs a read failure before it ends the response body.
fn log_read_errors<S>(
    stream: S,
    path: PathBuf,
) -> impl Stream<Item = std::io::Result<Bytes>> + Send + 'static
where
    S: Stream<Item = std::io::Result<Bytes>> + Send + 'static,
{
    stream.inspect_err(move |e| {
        warn!(path = %path.display(), error = %e, "media stream read failed");
    })
}
