//! Chunk reception and upload finalization.

use std::path::Path;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::HeaderMap;
use tracing::{debug, info, warn};

use melkyar_protocol::constants::{VIDEO_EXTENSIONS, fields};
use melkyar_protocol::messages::{ChunkUploadResponse, FinalizeRequest, FinalizeResponse};
use melkyar_protocol::text;
use melkyar_transfer::{
    TransferError, finalized_filename, original_extension, validate_upload_id,
};

use crate::error::ApiError;
use crate::state::AppState;

/// Fields of one chunk upload request.
#[derive(Default)]
struct ChunkForm {
    data: Option<Vec<u8>>,
    index: Option<u64>,
    total: Option<u64>,
    upload_id: Option<String>,
}

fn bad_chunk() -> ApiError {
    ApiError::BadRequest(text::INVALID_CHUNK.to_string())
}

/// `POST /api/upload/chunk`: stages one chunk.
///
/// Resending an index overwrites the previous copy. A chunk whose total
/// disagrees with the first one discards the whole upload.
pub(crate) async fn upload_chunk(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<ChunkUploadResponse>, ApiError> {
    state.authorize(&headers)?;

    let mut form = ChunkForm::default();
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!(error = %e, "unreadable chunk upload body");
        ApiError::Payload { status: e.status() }
    })? {
        let name = field.name().unwrap_or_default().to_string();
        let read_err = |e: axum::extract::multipart::MultipartError| {
            warn!(field = %name, error = %e, "unreadable multipart field");
            ApiError::Payload { status: e.status() }
        };
        match name.as_str() {
            fields::CHUNK => form.data = Some(field.bytes().await.map_err(read_err)?.to_vec()),
            fields::CHUNK_INDEX => {
                form.index = field.text().await.map_err(read_err)?.trim().parse().ok()
            }
            fields::TOTAL_CHUNKS => {
                form.total = field.text().await.map_err(read_err)?.trim().parse().ok()
            }
            fields::UPLOAD_ID => form.upload_id = Some(field.text().await.map_err(read_err)?),
            _ => {}
        }
    }

    let (Some(data), Some(index), Some(total), Some(upload_id)) =
        (form.data, form.index, form.total, form.upload_id)
    else {
        return Err(bad_chunk());
    };

    match state.store.write_chunk(&upload_id, index, total, &data).await {
        Ok(()) => {}
        Err(e @ TransferError::TotalMismatch { .. }) => {
            // The staged parts can no longer be trusted; the client has to
            // start over under a new upload id.
            warn!(upload_id = %upload_id, error = %e, "discarding inconsistent upload");
            if let Err(discard_err) = state.store.discard(&upload_id).await {
                warn!(upload_id = %upload_id, error = %discard_err, "failed to discard upload");
            }
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    }

    debug!(
        upload_id = %upload_id,
        chunk_index = index,
        total_chunks = total,
        bytes = data.len(),
        "chunk received"
    );
    Ok(Json(ChunkUploadResponse::ack(&upload_id, index)))
}

/// `POST /api/upload/finalize`: assembles a complete upload into the
/// videos directory.
///
/// The stored name depends only on the upload id and extension, so a
/// repeated finalize for an already assembled upload returns the same
/// name without touching the file.
pub(crate) async fn finalize(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<FinalizeRequest>,
) -> Result<Json<FinalizeResponse>, ApiError> {
    state.authorize(&headers)?;
    validate_upload_id(&req.upload_id)?;

    let extension = original_extension(&req.original_filename)
        .filter(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
        .ok_or_else(|| {
            warn!(
                upload_id = %req.upload_id,
                original_filename = %req.original_filename,
                "unsupported video format"
            );
            ApiError::BadRequest(text::UNSUPPORTED_FORMAT.to_string())
        })?;

    let filename = finalized_filename(&req.upload_id, &extension);
    let dest = state.videos_dir.join(&filename);

    match state.store.assemble(&req.upload_id, &dest).await {
        Ok(bytes) => {
            info!(
                upload_id = %req.upload_id,
                filename = %filename,
                bytes,
                "upload finalized"
            );
        }
        Err(TransferError::SessionNotFound(_)) => {
            if !already_finalized(&dest).await {
                warn!(upload_id = %req.upload_id, "finalize for unknown upload");
                return Err(ApiError::UploadNotFound);
            }
            debug!(upload_id = %req.upload_id, filename = %filename, "upload already finalized");
        }
        Err(e @ TransferError::Incomplete { .. }) => {
            let received = state.store.received(&req.upload_id).await.unwrap_or_default();
            warn!(
                upload_id = %req.upload_id,
                received = ?received,
                error = %e,
                "finalize before all chunks arrived"
            );
            return Err(e.into());
        }
        Err(e) => {
            warn!(upload_id = %req.upload_id, error = %e, "finalize failed");
            return Err(e.into());
        }
    }

    Ok(Json(FinalizeResponse { filename }))
}

async fn already_finalized(dest: &Path) -> bool {
    tokio::fs::metadata(dest).await.is_ok_and(|m| m.is_file())
}
