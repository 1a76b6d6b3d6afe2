use crate::relay::RelayService;
use apod_core::TrackIndex;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use bytes::Bytes;
use tracing::{error, info};

/// `POST /save/{track}`: store one fragment. Non-numeric tracks are
/// rejected by the path extractor with 400.
pub async fn save_handler(
    Path(track): Path<u32>,
    State(service): State<RelayService>,
    body: Bytes,
) -> StatusCode {
    let track = TrackIndex(track);
    let len = body.len();

    match service.store().store(track, body).await {
        Ok(path) => {
            info!("Saved {} bytes for track {} to {}", len, track, path.display());
            StatusCode::OK
        }
        Err(e) => {
            error!("Failed to save fragment for track {}: {:?}", track, e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
