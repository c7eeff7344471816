//! HTTP surface: Messages endpoint, health, credential status.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::StreamExt;
use serde_json::json;
use tracing::debug;

use crate::dispatch::Dispatcher;
use crate::error::Error;
use crate::models::request::MessagesRequest;

/// Shared per-router state.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub inbound_secret: Option<String>,
}

/// Build the relay router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/messages", post(handle_messages))
        .route("/v1/credentials", get(handle_credentials))
        .route("/health", get(handle_health))
        .with_state(state)
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.envelope())).into_response()
    }
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), Error> {
    let Some(secret) = &state.inbound_secret else {
        return Ok(());
    };
    let presented = headers.get("x-api-key").and_then(|v| v.to_str().ok());
    if presented == Some(secret.as_str()) {
        Ok(())
    } else {
        Err(Error::Unauthorized)
    }
}

async fn handle_messages(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<MessagesRequest>, JsonRejection>,
) -> Result<Response, Error> {
    authorize(&state, &headers)?;
    let Json(request) = payload.map_err(|e| Error::InvalidRequest(e.body_text()))?;
    debug!(
        model = request.model.as_str(),
        stream = request.stream,
        "Inbound messages request"
    );

    if request.stream {
        let events = state.dispatcher.send_stream(&request).await?;
        let sse = events.map(|event| Event::default().event(event.name()).json_data(&event));
        Ok(Sse::new(sse)
            .keep_alive(KeepAlive::default())
            .into_response())
    } else {
        let response = state.dispatcher.send(&request).await?;
        Ok(Json(response).into_response())
    }
}

async fn handle_credentials(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, Error> {
    authorize(&state, &headers)?;
    let statuses = state.dispatcher.rotation().status_all().await;
    Ok(Json(statuses).into_response())
}

async fn handle_health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
