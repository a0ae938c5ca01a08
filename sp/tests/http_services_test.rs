//! HTTP services against a mock server, and the full workflow over HTTP

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use slidepilot::config::ServiceConfig;
use slidepilot::domain::{Plan, SlideKind, SlideSpec};
use slidepilot::service::{HttpServices, PPTX_CONTENT_TYPE, PlanService, RenderService, ServiceError};
use slidepilot::workflow::{PLAN_FALLBACK_MESSAGE, Phase, RENDER_FALLBACK_MESSAGE, Services, WorkflowController};
use slidepilot::{DEFAULT_FILENAME, FileSaver};

fn services_for(server: &MockServer) -> HttpServices {
    let config = ServiceConfig {
        base_url: server.uri(),
        ..Default::default()
    };
    HttpServices::from_config(&config).unwrap()
}

fn social_media_plan() -> Plan {
    Plan::new(
        "Introduce the platforms, compare them, then recommend",
        vec![
            SlideSpec::new(SlideKind::Text, "Intro"),
            SlideSpec::new(SlideKind::Table, "Comparison"),
        ],
    )
}

fn deck_bytes(len: usize) -> Vec<u8> {
    // Starts like a zip archive, as a real deck does
    let mut data = vec![0x50, 0x4b, 0x03, 0x04];
    data.extend((0..len - 4).map(|i| (i % 251) as u8));
    data
}

#[tokio::test]
async fn test_generate_plan_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate-plan"))
        .and(body_json(json!({"prompt": "Compare social media platforms"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rationale": "Introduce the platforms, compare them, then recommend",
            "items": [
                {"kind": "narrative-text", "topic": "Intro"},
                {"kind": "tabular", "topic": "Comparison"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let plan = services_for(&server)
        .generate_plan("Compare social media platforms")
        .await
        .unwrap();

    assert_eq!(plan, social_media_plan());
    server.verify().await;
}

#[tokio::test]
async fn test_generate_plan_failure_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate-plan"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "quota exceeded"})))
        .mount(&server)
        .await;

    let err = services_for(&server).generate_plan("anything").await.unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert_eq!(err.detail(), Some("quota exceeded"));
    assert_eq!(err.user_message(PLAN_FALLBACK_MESSAGE), "quota exceeded");
}

#[tokio::test]
async fn test_generate_plan_validation_list_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate-plan"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "detail": [
                {"loc": ["body", "prompt"], "msg": "field required", "type": "missing"},
                {"loc": ["body"], "msg": "body too short", "type": "value_error"}
            ]
        })))
        .mount(&server)
        .await;

    let err = services_for(&server).generate_plan("x").await.unwrap_err();
    assert_eq!(err.detail(), Some("field required; body too short"));
}

#[tokio::test]
async fn test_generate_plan_html_failure_uses_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate-plan"))
        .respond_with(
            ResponseTemplate::new(502).set_body_raw("<html><body>Bad Gateway</body></html>", "text/html"),
        )
        .mount(&server)
        .await;

    let err = services_for(&server).generate_plan("x").await.unwrap_err();
    assert!(matches!(err, ServiceError::Opaque { status: 502, .. }));
    assert_eq!(err.user_message(PLAN_FALLBACK_MESSAGE), PLAN_FALLBACK_MESSAGE);
}

#[tokio::test]
async fn test_generate_plan_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate-plan"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"rationale": "no items"})))
        .mount(&server)
        .await;

    let err = services_for(&server).generate_plan("x").await.unwrap_err();
    assert!(err.is_malformed());
}

#[tokio::test]
async fn test_render_success_returns_exact_bytes() {
    let server = MockServer::start().await;
    let deck = deck_bytes(10_000);
    Mock::given(method("POST"))
        .and(path("/api/create-slides"))
        .and(header("accept", PPTX_CONTENT_TYPE))
        .and(body_json(serde_json::to_value(social_media_plan()).unwrap()))
        .respond_with(ResponseTemplate::new(200).set_body_raw(deck.clone(), PPTX_CONTENT_TYPE))
        .expect(1)
        .mount(&server)
        .await;

    let file = services_for(&server).render(&social_media_plan()).await.unwrap();

    assert_eq!(file.len(), 10_000);
    assert_eq!(file.data, deck);
    assert_eq!(file.content_type.as_deref(), Some(PPTX_CONTENT_TYPE));
    server.verify().await;
}

#[tokio::test]
async fn test_render_failure_json_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/create-slides"))
        .respond_with(ResponseTemplate::new(500).set_body_raw(r#"{"detail":"X"}"#, "application/json"))
        .mount(&server)
        .await;

    let err = services_for(&server).render(&social_media_plan()).await.unwrap_err();
    assert_eq!(err.detail(), Some("X"));
    assert_eq!(err.user_message(RENDER_FALLBACK_MESSAGE), "X");
}

#[tokio::test]
async fn test_render_failure_with_binary_content_type_is_not_parsed() {
    let server = MockServer::start().await;
    // A JSON-looking body labelled as a deck must not be read for detail
    Mock::given(method("POST"))
        .and(path("/api/create-slides"))
        .respond_with(ResponseTemplate::new(500).set_body_raw(r#"{"detail":"hidden"}"#, PPTX_CONTENT_TYPE))
        .mount(&server)
        .await;

    let err = services_for(&server).render(&social_media_plan()).await.unwrap_err();
    assert!(matches!(err, ServiceError::Opaque { status: 500, .. }));
    assert_eq!(err.detail(), None);
    assert_eq!(err.user_message(RENDER_FALLBACK_MESSAGE), RENDER_FALLBACK_MESSAGE);
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let config = ServiceConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        timeout_ms: 2_000,
        ..Default::default()
    };
    let services = HttpServices::from_config(&config).unwrap();
    let err = services.generate_plan("x").await.unwrap_err();
    assert!(matches!(err, ServiceError::Network(_)));
    assert_eq!(err.user_message(PLAN_FALLBACK_MESSAGE), PLAN_FALLBACK_MESSAGE);
}

#[tokio::test]
async fn test_commit_to_unreachable_server_keeps_plan() {
    let config = ServiceConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        timeout_ms: 2_000,
        ..Default::default()
    };
    let http = Arc::new(HttpServices::from_config(&config).unwrap());
    let err = http.render(&social_media_plan()).await.unwrap_err();
    assert!(matches!(err, ServiceError::Network(_)));

    let dir = tempfile::tempdir().unwrap();
    let handle = WorkflowController::spawn(
        Services {
            plan: http.clone(),
            render: http,
            saver: Arc::new(FileSaver::new(dir.path())),
        },
        DEFAULT_FILENAME,
    );
    handle.load_plan(social_media_plan()).await.unwrap();
    let state = handle.commit().await.unwrap();

    assert_eq!(state.phase(), Phase::CommitFailed);
    assert_eq!(state.error_message(), Some(RENDER_FALLBACK_MESSAGE));
    assert_eq!(state.plan(), Some(&social_media_plan()));
    assert!(!state.is_busy());
    assert!(!dir.path().join(DEFAULT_FILENAME).exists());
}

#[tokio::test]
async fn test_workflow_end_to_end_over_http() {
    let server = MockServer::start().await;
    let deck = deck_bytes(4096);
    Mock::given(method("POST"))
        .and(path("/api/generate-plan"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::to_value(social_media_plan()).unwrap()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/create-slides"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(deck.clone(), PPTX_CONTENT_TYPE))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let http = Arc::new(services_for(&server));
    let handle = WorkflowController::spawn(
        Services {
            plan: http.clone(),
            render: http,
            saver: Arc::new(FileSaver::new(dir.path())),
        },
        DEFAULT_FILENAME,
    );

    let state = handle.submit("Compare social media platforms").await.unwrap();
    assert_eq!(state.phase(), Phase::PlanReady);
    assert_eq!(state.plan(), Some(&social_media_plan()));

    let state = handle.commit().await.unwrap();
    assert_eq!(state.phase(), Phase::Done);

    let saved = dir.path().join(DEFAULT_FILENAME);
    assert_eq!(state.saved_to(), Some(saved.as_path()));
    assert_eq!(std::fs::read(&saved).unwrap(), deck);

    handle.shutdown().await;
    server.verify().await;
}

#[tokio::test]
async fn test_workflow_render_failure_over_http_keeps_plan() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/create-slides"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "template missing"})))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let http = Arc::new(services_for(&server));
    let handle = WorkflowController::spawn(
        Services {
            plan: http.clone(),
            render: http,
            saver: Arc::new(FileSaver::new(dir.path())),
        },
        DEFAULT_FILENAME,
    );

    handle.load_plan(social_media_plan()).await.unwrap();
    let state = handle.commit().await.unwrap();

    assert_eq!(state.phase(), Phase::CommitFailed);
    assert_eq!(state.error_message(), Some("template missing"));
    assert!(state.plan().is_some());
    assert!(!dir.path().join(DEFAULT_FILENAME).exists());
}
