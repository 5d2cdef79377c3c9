//! HTTP-level tests against the assembled `axum` router, exercising
//! `/invoke`, `/tools`, `/health`, and `/metrics` without spawning any
//! real provider process.

mod common;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use metrics_exporter_prometheus::PrometheusBuilder;
use pgw_domain::Tunables;
use pgw_server::http::{build_router, AppState};
use pgw_supervisor::{ProviderSupervisor, RemoteTool};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{provider_config, MockSession, MockTransport};

async fn build_app(transport: Arc<MockTransport>, configs: Vec<pgw_domain::ProviderConfig>) -> axum::Router {
    let supervisor = Arc::new(ProviderSupervisor::new(transport, Tunables::default()));
    supervisor.connect_all(configs).await;

    let metrics_handle = PrometheusBuilder::new().build_recorder().handle();
    let state = AppState::new(supervisor, metrics_handle);
    build_router(state)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn tools_lists_the_catalogue_of_a_connected_provider() {
    let transport = MockTransport::new();
    transport.register(
        "alpha",
        MockSession::new(vec![RemoteTool {
            name: "echo".to_owned(),
            description: "echoes input".to_owned(),
            input_schema: json!({"type": "object"}),
            output_schema: json!({"type": "object"}),
        }]),
    );

    let app = build_app(transport, vec![provider_config("alpha")]).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/tools")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let tools = body_json(response).await;
    assert_eq!(tools[0]["name"], "echo");
    assert_eq!(tools[0]["server"], "alpha");
}

#[tokio::test]
async fn invoke_dispatches_to_the_right_provider_and_tool() {
    let transport = MockTransport::new();
    transport.register(
        "alpha",
        MockSession::new(vec![RemoteTool {
            name: "echo".to_owned(),
            description: "echoes input".to_owned(),
            input_schema: json!({}),
            output_schema: json!({}),
        }]),
    );
    let app = build_app(transport, vec![provider_config("alpha")]).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/invoke")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({"provider_name": "alpha", "tool_name": "echo", "input": {"x": 1}}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["result"]["echo"]["x"], 1);
}

#[tokio::test]
async fn invoke_against_unknown_provider_is_404_with_taxonomy_code() {
    let app = build_app(MockTransport::new(), Vec::new()).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/invoke")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({"provider_name": "ghost", "tool_name": "echo", "input": {}}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "ProviderNotFound");
}

#[tokio::test]
async fn invoke_against_tool_failure_maps_to_500() {
    let transport = MockTransport::new();
    transport.register("alpha", MockSession::new(vec![RemoteTool {
        name: "boom".to_owned(),
        description: "always fails".to_owned(),
        input_schema: json!({}),
        output_schema: json!({}),
    }]));
    let app = build_app(transport, vec![provider_config("alpha")]).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/invoke")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({"provider_name": "alpha", "tool_name": "boom", "input": {}}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn health_reports_ok_when_every_provider_is_available() {
    let transport = MockTransport::new();
    transport.register("alpha", MockSession::new(Vec::new()));
    let app = build_app(transport, vec![provider_config("alpha")]).await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["servers"]["alpha"], "available");
}

#[tokio::test]
async fn metrics_endpoint_renders_prometheus_text() {
    let app = build_app(MockTransport::new(), Vec::new()).await;

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn rate_limit_returns_429_once_the_per_ip_bucket_is_exhausted() {
    let app = build_app(MockTransport::new(), Vec::new()).await;
    let addr: SocketAddr = "10.0.0.1:1234".parse().unwrap();

    let mut last_status = StatusCode::OK;
    for _ in 0..61 {
        let request = Request::builder()
            .uri("/tools")
            .extension(axum::extract::ConnectInfo(addr))
            .body(Body::empty())
            .unwrap();
        last_status = app.clone().oneshot(request).await.unwrap().status();
    }

    assert_eq!(last_status, StatusCode::TOO_MANY_REQUESTS);
}
