use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header::CACHE_CONTROL};
use axum_test::TestServer;
use chat_feed_panel::config::{
    AppConfig, ChatConfig, LogsConfig, ScheduleConfig, ServerConfig, TopicsConfig,
};
use chat_feed_panel::server::{
    ActionResponse, ControlStatus, ErrorBody, LogsResponse, TopicResponse, build_router,
    build_state,
};
use chat_feed_panel::settings::FirstSpeaker;
use chat_feed_panel::AppState;
use serde_json::json;
use tempfile::TempDir;
use tower::ServiceExt;

fn test_config(dir: &TempDir, subjects: &[&str], script: &str) -> AppConfig {
    AppConfig {
        server: ServerConfig {
            port: 0,
            host: "127.0.0.1".into(),
            static_dir: "static".into(),
        },
        logs: LogsConfig { max_lines: 50 },
        chat: ChatConfig {
            topic: "Who are you?".into(),
            first_speaker: FirstSpeaker::Bot1,
            model: "test-model".into(),
            max_turns: 0,
            delay: 0.0,
            typing_speed: 0.0,
            context_limit: 6,
            command: Some("sh".into()),
            command_args: vec!["-c".into(), script.into(), "sh".into()],
            env_file: dir.path().join(".env").to_string_lossy().into_owned(),
        },
        schedule: ScheduleConfig {
            start_hour: None,
            start_minute: None,
            stop_hour: None,
            stop_minute: None,
            interval_secs: 60,
        },
        topics: TopicsConfig {
            subjects: subjects.iter().map(|s| (*s).to_string()).collect(),
            framings: vec!["Let's talk about".into()],
        },
    }
}

fn test_server(config: AppConfig) -> (TestServer, AppState) {
    let state = build_state(Arc::new(config)).expect("state should build");
    let server = TestServer::new(build_router(state.clone())).expect("test server");
    (server, state)
}

async fn wait_for_line(state: &AppState, needle: &str) -> bool {
    for _ in 0..100 {
        if state.logs.snapshot().iter().any(|line| line.contains(needle)) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test]
async fn test_logs_returns_buffer_without_caching() {
    let dir = tempfile::tempdir().unwrap();
    let (server, state) = test_server(test_config(&dir, &["tides"], "true"));
    state.logs.append("[Bot 1]:");
    state.logs.append("  hello");

    let response = server.get("/logs").await;
    response.assert_status_ok();
    assert_eq!(response.header("cache-control"), "no-store");

    let body: LogsResponse = response.json();
    assert_eq!(body.lines, vec!["[Bot 1]:", "  hello"]);
}

#[tokio::test]
async fn test_router_serves_logs_via_oneshot() {
    let dir = tempfile::tempdir().unwrap();
    let state = build_state(Arc::new(test_config(&dir, &["tides"], "true"))).unwrap();
    state.logs.append("first");

    let response = build_router(state)
        .oneshot(Request::builder().uri("/logs").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CACHE_CONTROL], "no-store");

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: LogsResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body.lines, vec!["first"]);
}

#[tokio::test]
async fn test_topics_returns_generated_topic() {
    let dir = tempfile::tempdir().unwrap();
    let (server, _) = test_server(test_config(&dir, &["tides"], "true"));

    let response = server.get("/topics").await;
    response.assert_status_ok();
    let body: TopicResponse = response.json();
    assert_eq!(body.topic, "Let's talk about tides");
}

#[tokio::test]
async fn test_topics_without_subjects_reports_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&dir, &[], "true");
    config.topics.framings.clear();
    // Explicitly empty lists fall back to the built-in topics, so use blanks.
    config.topics.subjects = vec!["  ".into()];
    let (server, _) = test_server(config);

    let response = server.get("/topics").await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: ErrorBody = response.json();
    assert_eq!(body.error, "No topics are configured.");
}

#[tokio::test]
async fn test_index_renders_panel() {
    let dir = tempfile::tempdir().unwrap();
    let (server, _) = test_server(test_config(&dir, &["tides"], "true"));

    let response = server.get("/").await;
    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains(r#"id="chat-feed""#));
    assert!(html.contains("Waiting for chat output..."));
}

#[tokio::test]
async fn test_settings_update_and_validation() {
    let dir = tempfile::tempdir().unwrap();
    let (server, _) = test_server(test_config(&dir, &["tides"], "true"));

    let response = server
        .put("/api/control/settings")
        .json(&json!({
            "topic": "Lighthouses",
            "start_hour": 8, "start_minute": 0,
            "stop_hour": 17, "stop_minute": 30
        }))
        .await;
    response.assert_status_ok();
    let status: ControlStatus = response.json();
    assert_eq!(status.settings.topic, "Lighthouses");
    assert!(status.schedule_enabled);
    assert!(!status.running);

    let response = server
        .put("/api/control/settings")
        .json(&json!({ "topic": "Kept", "stop_minute": 75 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let status: ControlStatus = server.get("/api/control").await.json();
    assert_eq!(status.settings.topic, "Lighthouses");
    assert_eq!(status.settings.stop_minute, Some(30));
}

#[tokio::test]
async fn test_save_persists_schedule() {
    let dir = tempfile::tempdir().unwrap();
    let (server, state) = test_server(test_config(&dir, &["tides"], "true"));

    server
        .put("/api/control/settings")
        .json(&json!({ "start_hour": 9, "start_minute": 5, "stop_hour": 18, "stop_minute": 0 }))
        .await
        .assert_status_ok();

    let response = server.post("/api/control/save").await;
    response.assert_status_ok();
    let body: ActionResponse = response.json();
    assert_eq!(body.message, "Settings saved.");

    let env = std::fs::read_to_string(&state.config.chat.env_file).unwrap();
    assert!(env.contains("PANEL_SCHEDULE__START_HOUR=9\n"));
    assert!(env.contains("PANEL_SCHEDULE__STOP_MINUTE=0\n"));
}

#[tokio::test]
async fn test_action_succeeds_when_env_file_is_unwritable() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&dir, &["tides"], "true");
    config.chat.env_file = dir
        .path()
        .join("missing")
        .join(".env")
        .to_string_lossy()
        .into_owned();
    let (server, _) = test_server(config);

    let response = server.post("/api/control/save").await;
    response.assert_status_ok();
    let body: ActionResponse = response.json();
    assert!(body.message.starts_with("Settings saved."));
    assert!(body.message.ends_with("Failed to persist schedule to .env."));

    let body: ActionResponse = server.post("/api/control/stop").await.json();
    assert_eq!(
        body.message,
        "No chat is running. Failed to persist schedule to .env."
    );
}

#[tokio::test]
async fn test_unknown_action_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let (server, _) = test_server(test_config(&dir, &["tides"], "true"));

    let response = server.post("/api/control/launch").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: ErrorBody = response.json();
    assert_eq!(body.error, "Unknown action: launch");
}

#[tokio::test]
async fn test_stop_without_chat() {
    let dir = tempfile::tempdir().unwrap();
    let (server, _) = test_server(test_config(&dir, &["tides"], "true"));

    let body: ActionResponse = server.post("/api/control/stop").await.json();
    assert_eq!(body.message, "No chat is running.");
    assert!(!body.running);
}

#[cfg(unix)]
#[tokio::test]
async fn test_start_captures_output_and_stop_ends_chat() {
    let dir = tempfile::tempdir().unwrap();
    let script = r#"printf '\033[92mhello from %s\033[0m\n' "$1"; exec sleep 30"#;
    let (server, state) = test_server(test_config(&dir, &["tides"], script));

    let body: ActionResponse = server.post("/api/control/start").await.json();
    assert_eq!(body.message, "Chat started.");
    assert!(body.running);

    let body: ActionResponse = server.post("/api/control/start").await.json();
    assert_eq!(body.message, "Chat is already running.");

    assert!(wait_for_line(&state, "hello from converse").await);
    let lines: LogsResponse = server.get("/logs").await.json();
    assert!(lines.lines[0].ends_with("] Chat launched."));
    assert!(lines.lines.contains(&"hello from converse".to_string()));

    let body: ActionResponse = server.post("/api/control/stop").await.json();
    assert_eq!(body.message, "Chat stopped.");
    assert!(!body.running);

    let lines = state.logs.snapshot();
    assert!(lines.last().unwrap().ends_with("] Chat process exited."));
}
