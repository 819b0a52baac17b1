//! HTTP/WebSocket surface of the dashboard
//!
//! `/ws/runner` ingests events from the benchmark runner (one
//! connection per run, FIFO delivery assumed), `/ws/viewer` streams
//! chart frames to browsers, and a small JSON API exposes health,
//! session state and run-plan submission. Static front-end files are
//! served alongside.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::{info, warn};

use cgbench_common::config::{DashboardConfig, RunnerDefaults};
use cgbench_common::{CgroupOptions, DriverKind};

use crate::runner::RunPlan;
use crate::session_loop::{run_session_loop, ChartFrame, RunnerEvent, SessionStatus, SharedStatus};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    events: mpsc::Sender<RunnerEvent>,
    frames: broadcast::Sender<ChartFrame>,
    status: SharedStatus,
    defaults: RunnerDefaults,
}

/// API response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
    timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: Utc::now(),
        }
    }
}

/// Run options submitted from the configuration form
#[derive(Debug, Deserialize)]
struct PlanRequest {
    driver: DriverKind,
    cgroups: Vec<CgroupOptions>,
}

/// Accepted plan: the entity count the charts will use plus the config
/// document handed to the runner
#[derive(Debug, Serialize)]
struct PlanResponse {
    entity_count: usize,
    runner_config: String,
}

/// Spawn the session loop and serve the dashboard until shutdown.
pub async fn serve(config: DashboardConfig) -> Result<()> {
    let (events_tx, events_rx) = mpsc::channel(256);
    let (frames_tx, _) = broadcast::channel(config.frame_buffer);
    let status: SharedStatus = Arc::default();

    tokio::spawn(run_session_loop(
        events_rx,
        frames_tx.clone(),
        Arc::clone(&status),
    ));

    let state = AppState {
        events: events_tx,
        frames: frames_tx,
        status,
        defaults: config.runner.clone(),
    };

    let app = router(state, &config);

    info!("starting cgbench dashboard on {}", config.bind);
    info!("static files served from: {}", config.static_dir.display());

    let listener = TcpListener::bind(&config.bind)
        .await
        .context("Failed to bind server")?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn router(state: AppState, config: &DashboardConfig) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/state", get(get_session_state))
        .route("/api/plan", post(submit_plan))
        .route("/ws/runner", get(runner_ws_handler))
        .route("/ws/viewer", get(viewer_ws_handler))
        .nest_service("/static", ServeDir::new(&config.static_dir))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn health_check() -> Json<ApiResponse<HashMap<String, String>>> {
    let mut status = HashMap::new();
    status.insert("status".to_string(), "healthy".to_string());
    status.insert("service".to_string(), "cgbench-dashboard".to_string());
    status.insert("version".to_string(), env!("CARGO_PKG_VERSION").to_string());

    Json(ApiResponse::success(status))
}

async fn get_session_state(State(state): State<AppState>) -> Json<ApiResponse<SessionStatus>> {
    let view = state.status.read().await.clone();
    Json(ApiResponse::success(view))
}

/// Turn submitted options into a validated run plan.
///
/// The entity count of the upcoming run derives from the per-cgroup
/// option list; a valid plan moves the session into configuring and
/// returns the runner's config document to the caller.
async fn submit_plan(
    State(state): State<AppState>,
    Json(request): Json<PlanRequest>,
) -> Json<ApiResponse<PlanResponse>> {
    let plan = RunPlan::new(request.driver, request.cgroups, state.defaults.clone());
    let runner_config = match plan.to_runner_config() {
        Ok(config) => config,
        Err(err) => {
            warn!("rejected run plan: {}", err);
            return Json(ApiResponse::error(err.to_string()));
        }
    };

    let event = RunnerEvent::Configure {
        driver: plan.driver,
    };
    if state.events.send(event).await.is_err() {
        return Json(ApiResponse::error("session loop is gone".to_string()));
    }

    info!(
        driver = %plan.driver,
        entity_count = plan.entity_count(),
        "run plan accepted"
    );
    Json(ApiResponse::success(PlanResponse {
        entity_count: plan.entity_count(),
        runner_config,
    }))
}

async fn runner_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_runner_socket(socket, state))
}

/// Read runner events off the socket and forward them, in order, to the
/// session loop. Unparsable messages are logged and skipped.
async fn handle_runner_socket(mut socket: WebSocket, state: AppState) {
    info!("runner connected");
    while let Some(message) = socket.recv().await {
        let message = match message {
            Ok(message) => message,
            Err(err) => {
                warn!("runner socket error: {}", err);
                break;
            }
        };
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };
        match serde_json::from_str::<RunnerEvent>(&text) {
            Ok(event) => {
                if state.events.send(event).await.is_err() {
                    warn!("session loop is gone, closing runner socket");
                    break;
                }
            }
            Err(err) => warn!("dropping unparsable runner message: {}", err),
        }
    }
    info!("runner disconnected");
}

async fn viewer_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let frames = state.frames.subscribe();
    ws.on_upgrade(move |socket| handle_viewer_socket(socket, frames))
}

/// Forward chart frames to one browser until it disconnects. A viewer
/// that falls behind the broadcast buffer skips the missed frames and
/// resumes with current ones.
async fn handle_viewer_socket(socket: WebSocket, mut frames: broadcast::Receiver<ChartFrame>) {
    info!("viewer connected");
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            frame = frames.recv() => {
                let frame = match frame {
                    Ok(frame) => frame,
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(missed, "viewer lagged, skipping frames");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                let payload = match serde_json::to_string(&frame) {
                    Ok(payload) => payload,
                    Err(err) => {
                        warn!("failed to encode frame: {}", err);
                        continue;
                    }
                };
                if sink.send(Message::Text(payload)).await.is_err() {
                    break;
                }
            }
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {}
                }
            }
        }
    }
    info!("viewer disconnected");
}
