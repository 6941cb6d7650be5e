// SPDX-License-Identifier: MIT

use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::adk::error::RecapError;
use crate::recap::pipeline::{Recap, RecapOutcome};

#[derive(Deserialize)]
struct RecapRequest {
    text: String,
}

/// A [`RecapError`] rendered as `{error, kind}`
struct ApiError(RecapError);

impl From<RecapError> for ApiError {
    fn from(e: RecapError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let mut body = json!({
            "error": self.0.to_string(),
            "kind": self.0.kind(),
        });
        if let Some(step) = self.0.failed_step() {
            body["step"] = json!(step);
        }
        (status, Json(body)).into_response()
    }
}

fn status_for(error: &RecapError) -> StatusCode {
    match error {
        RecapError::Validation(_) => StatusCode::BAD_REQUEST,
        RecapError::StepExecution { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Routes over a shared pipeline
pub fn router(recap: Arc<Recap>) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/recaps", post(create_recap))
        .route("/api/recaps/stream", post(stream_recap))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(recap)
}

pub async fn serve(recap: Arc<Recap>, port: u16) -> Result<(), RecapError> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    log::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(recap)).await?;

    Ok(())
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn create_recap(
    State(recap): State<Arc<Recap>>,
    Json(payload): Json<RecapRequest>,
) -> Result<Json<RecapOutcome>, ApiError> {
    let outcome = recap.run(&payload.text).await?;
    Ok(Json(outcome))
}

async fn stream_recap(
    State(recap): State<Arc<Recap>>,
    Json(payload): Json<RecapRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    recap.validate_input(&payload.text)?;

    let (tx, rx) = mpsc::channel(100);
    tokio::spawn(async move {
        // The engine reports failures as a `failed` event before returning
        if let Err(e) = recap.run_stream(&payload.text, tx).await {
            log::error!("Streaming recap failed: {}", e);
        }
    });

    let stream = ReceiverStream::new(rx)
        .map(|event| Ok(Event::default().json_data(event).unwrap_or_default()));

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(1))))
}
