//! Course video upload endpoint.

use crate::auth::AuthenticatedCaller;
use crate::error::{auth_error, media_error};
use crate::state::AppState;
use axum::Json;
use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use bytes::Bytes;
use campus_auth::Caller;
use campus_media::broker::UPLOAD_ROLES;
use campus_media::{MediaError, UploadBroker, VideoAsset, VideoFile};
use campus_web::{AppError, ClientIp, WebResult};
use tokio::sync::mpsc;

/// Content type assumed when the file part does not declare one.
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Chunks buffered between the request body and the platform upload.
const CHUNK_QUEUE_DEPTH: usize = 4;

/// Upload a course video.
///
/// Expects `multipart/form-data` with a `title` text field followed by a
/// `file` part. The file is streamed to the platform as it arrives, so the
/// title must come first. The role is checked before the body is read.
///
/// # Status Codes
///
/// - 200 OK: video created, returns `{video_id, status, ready_to_stream}`
/// - 401 Unauthorized: missing or invalid token
/// - 403 Forbidden: caller is not a professor or admin
/// - 413 Payload Too Large: file over the configured limit
/// - 422 Unprocessable Entity: missing or misordered field, bad title or file type
/// - 502 Bad Gateway: the video platform failed
///
/// # Errors
///
/// Returns an [`AppError`] mapped from the failing step.
pub async fn upload_video(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    ClientIp(client_ip): ClientIp,
    mut multipart: Multipart,
) -> WebResult<Json<VideoAsset>> {
    caller.require_any_role(UPLOAD_ROLES).map_err(auth_error)?;

    let mut title = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("title") => {
                title = Some(field.text().await.map_err(multipart_error)?);
            }
            Some("file") => {
                let title = title
                    .take()
                    .ok_or_else(|| AppError::validation("Form field title must precede file"))?;
                tracing::info!(
                    user_id = %caller.user_id,
                    client_ip = %client_ip,
                    "Video upload received"
                );

                let asset = forward_file(&state.uploads, &caller, &title, field)
                    .await
                    .map_err(media_error)?;
                return Ok(Json(asset));
            }
            other => {
                tracing::debug!(field = ?other, "Ignoring unknown form field");
            }
        }
    }

    Err(AppError::validation(if title.is_none() {
        "Missing form field: title"
    } else {
        "Missing form field: file"
    }))
}

/// Feed `field` to the broker chunk by chunk.
///
/// The field borrows the request body, so it is pumped into a bounded
/// channel on this task while the broker consumes the other end.
async fn forward_file(
    broker: &UploadBroker,
    caller: &Caller,
    title: &str,
    mut field: Field<'_>,
) -> campus_media::Result<VideoAsset> {
    let file_name = field.file_name().unwrap_or("upload").to_string();
    let content_type = field
        .content_type()
        .unwrap_or(FALLBACK_CONTENT_TYPE)
        .to_string();

    let (tx, rx) = mpsc::channel::<campus_media::Result<Bytes>>(CHUNK_QUEUE_DEPTH);
    let chunks = futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|chunk| (chunk, rx))
    });
    let file = VideoFile::from_stream(file_name, content_type, chunks);

    let pump = async move {
        loop {
            let chunk = match field.chunk().await {
                Ok(Some(chunk)) => Ok(chunk),
                Ok(None) => break,
                Err(err) => Err(body_error(&err)),
            };
            let failed = chunk.is_err();
            // A closed channel means the broker has stopped reading.
            if tx.send(chunk).await.is_err() || failed {
                break;
            }
        }
    };

    let (result, ()) = tokio::join!(broker.upload(caller, title, file), pump);
    result
}

fn body_error(err: &MultipartError) -> MediaError {
    MediaError::Validation(format!("unreadable file part: {}", err.body_text()))
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::payload_too_large(err.body_text())
    } else {
        AppError::bad_request(err.body_text())
    }
}
