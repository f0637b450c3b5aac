use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header::CACHE_CONTROL},
    response::{Html, IntoResponse},
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use tracing::{info, warn};

use crate::AppState;
use crate::config::AppConfig;
use crate::env_file::write_env_updates;
use crate::logs::LogBuffer;
use crate::page::render_panel;
use crate::runner::ChatRunner;
use crate::scheduler::ChatScheduler;
use crate::settings::{ControlSettings, SettingsUpdate};
use crate::topics::TopicGenerator;

/// Build shared state from configuration.
pub fn build_state(config: Arc<AppConfig>) -> anyhow::Result<AppState> {
    let logs = LogBuffer::new(config.logs.max_lines);
    let runner = Arc::new(ChatRunner::from_config(logs.clone(), &config.chat)?);
    let settings = Arc::new(RwLock::new(ControlSettings::from_config(
        &config.chat,
        &config.schedule,
    )));
    let topics = Arc::new(TopicGenerator::from_config(&config.topics));

    Ok(AppState {
        logs,
        runner,
        settings,
        topics,
        config,
    })
}

/// Routes of the control panel.
pub fn build_router(state: AppState) -> Router {
    let static_dir = state.config.server.static_dir.clone();
    Router::new()
        .route("/", get(index_handler))
        .route("/logs", get(logs_handler))
        .route("/topics", get(topics_handler))
        .route("/api/control", get(control_status))
        .route("/api/control/settings", put(update_settings))
        .route("/api/control/{action}", post(control_action))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let state = build_state(Arc::clone(&config))?;

    let shutdown = CancellationToken::new();
    let scheduler = ChatScheduler::new(
        Arc::clone(&state.runner),
        Arc::clone(&state.settings),
        Duration::from_secs(config.schedule.interval_secs.max(1)),
    )
    .spawn(shutdown.child_token());

    let runner = Arc::clone(&state.runner);
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for shutdown signal");
            }
        })
        .await?;

    shutdown.cancel();
    let _ = scheduler.await;
    runner.stop().await;
    info!(name: "server.stopped", "Server stopped");
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Error body shared by all JSON endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<ErrorBody>) {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogsResponse {
    pub lines: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TopicResponse {
    pub topic: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ControlStatus {
    pub running: bool,
    pub pid: Option<u32>,
    pub schedule_enabled: bool,
    pub settings: ControlSettings,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActionResponse {
    pub message: String,
    pub running: bool,
}

/// GET / - Control panel page.
async fn index_handler(State(state): State<AppState>) -> Html<String> {
    let settings = state.settings.read().await.clone();
    let running = state.runner.is_running().await;
    Html(render_panel(&settings, running, &state.logs.snapshot()))
}

/// GET /logs - Captured chat output.
async fn logs_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(CACHE_CONTROL, "no-store")],
        Json(LogsResponse {
            lines: state.logs.snapshot(),
        }),
    )
}

/// GET /topics - A generated conversation topic.
async fn topics_handler(
    State(state): State<AppState>,
) -> Result<Json<TopicResponse>, (StatusCode, Json<ErrorBody>)> {
    state
        .topics
        .generate()
        .map(|topic| Json(TopicResponse { topic }))
        .ok_or_else(|| {
            error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "No topics are configured.",
            )
        })
}

async fn status_of(state: &AppState) -> ControlStatus {
    let settings = state.settings.read().await.clone();
    ControlStatus {
        running: state.runner.is_running().await,
        pid: state.runner.current_pid().await,
        schedule_enabled: settings.schedule().is_some(),
        settings,
    }
}

/// GET /api/control - Runner and settings status.
async fn control_status(State(state): State<AppState>) -> Json<ControlStatus> {
    Json(status_of(&state).await)
}

/// PUT /api/control/settings - Update conversation and schedule settings.
async fn update_settings(
    State(state): State<AppState>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<ControlStatus>, (StatusCode, Json<ErrorBody>)> {
    state
        .settings
        .write()
        .await
        .apply(update)
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, e.to_string()))?;
    Ok(Json(status_of(&state).await))
}

/// POST /api/control/{action} - save, start, stop or restart.
async fn control_action(
    State(state): State<AppState>,
    Path(action): Path<String>,
) -> Result<Json<ActionResponse>, (StatusCode, Json<ErrorBody>)> {
    let settings = state.settings.read().await.clone();
    let runner = &state.runner;

    let mut messages: Vec<&str> = Vec::new();
    match action.as_str() {
        "save" => messages.push("Settings saved."),
        "start" => match runner.start(&settings).await {
            Ok(true) => messages.push("Chat started."),
            Ok(false) => messages.push("Chat is already running."),
            Err(e) => {
                return Err(error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to start chat: {e}"),
                ));
            }
        },
        "stop" => {
            if runner.stop().await {
                messages.push("Chat stopped.");
            } else {
                messages.push("No chat is running.");
            }
        }
        "restart" => {
            if let Err(e) = runner.restart(&settings).await {
                return Err(error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to restart chat: {e}"),
                ));
            }
            messages.push("Chat restarted.");
        }
        other => {
            return Err(error_response(
                StatusCode::NOT_FOUND,
                format!("Unknown action: {other}"),
            ));
        }
    }

    let entries = settings.schedule_env_entries();
    if let Err(e) = write_env_updates(&state.config.chat.env_file, &entries).await {
        warn!(error = %e, path = %state.config.chat.env_file, "Failed to persist schedule");
        messages.push("Failed to persist schedule to .env.");
    }

    info!(name: "control.action", action = %action, "Control action handled");
    Ok(Json(ActionResponse {
        message: messages.join(" "),
        running: runner.is_running().await,
    }))
}
