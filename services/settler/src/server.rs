//! Minimal HTTP surface: liveness reporting plus the request-driven pass
//! trigger. Carries no settlement logic of its own.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::scheduler::{PassTrigger, SchedulerState};

#[derive(Clone)]
pub struct AppState {
    pub scheduler: Arc<SchedulerState>,
    /// Present only in request-driven mode.
    pub triggers: Option<mpsc::Sender<PassTrigger>>,
}

pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/", get(root))
        .route("/healthz", get(healthz));
    if state.triggers.is_some() {
        router = router.route("/run", post(request_pass));
    }
    router.layer(TraceLayer::new_for_http()).with_state(state)
}

pub async fn serve(router: Router, bind_address: &str) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    info!("http surface listening on {}", bind_address);
    axum::serve(listener, router).await
}

async fn root() -> &'static str {
    "Syndicate settlement daemon is running"
}

async fn healthz(State(state): State<AppState>) -> Json<serde_json::Value> {
    let last_pass = *state.scheduler.last_pass.lock().expect("pass summary lock");
    Json(serde_json::json!({
        "status": "ok",
        "passes": state.scheduler.passes.load(Ordering::Relaxed),
        "last_pass": last_pass,
    }))
}

async fn request_pass(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    // Route only exists in request-driven mode, so the sender is present.
    let triggers = state.triggers.as_ref().expect("trigger sender");
    match triggers.try_send(PassTrigger::Request) {
        Ok(()) => (
            StatusCode::ACCEPTED,
            Json(serde_json::json!({ "queued": true })),
        ),
        Err(_) => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({
                "queued": false,
                "reason": "a pass is already pending",
            })),
        ),
    }
}
