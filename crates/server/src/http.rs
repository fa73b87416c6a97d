//! Inbound HTTP surface: `POST /dialog` receives one platform event per
//! dialog turn and answers with the serialized dialog action.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use chowline_channel::{ChannelError, IntentDispatcher, PlatformEvent, PlatformResponse};
use serde::Serialize;
use tracing::{error, warn};

#[derive(Clone)]
pub struct DialogState {
    dispatcher: Arc<IntentDispatcher>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub fn router(dispatcher: Arc<IntentDispatcher>) -> Router {
    Router::new().route("/dialog", post(dialog)).with_state(DialogState { dispatcher })
}

pub async fn dialog(
    State(state): State<DialogState>,
    Json(event): Json<PlatformEvent>,
) -> Result<Json<PlatformResponse>, (StatusCode, Json<ErrorBody>)> {
    match state.dispatcher.dispatch(event).await {
        Ok(response) => Ok(Json(response)),
        Err(source @ ChannelError::Dispatch(_)) | Err(source @ ChannelError::Request(_)) => {
            warn!(error = %source, "rejecting platform event");
            Err((StatusCode::BAD_REQUEST, Json(ErrorBody { error: source.to_string() })))
        }
        Err(source @ ChannelError::Queue(_)) => {
            error!(error = %source, "handoff queue failure during dialog turn");
            Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorBody { error: source.to_string() }),
            ))
        }
    }
}
