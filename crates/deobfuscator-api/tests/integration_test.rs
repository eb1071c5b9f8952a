//! Integration tests for the Moonsec API

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use moonsec_api::{create_router, AppState};
use moonsec_deobfuscator::{LaunchStrategy, Toolchain, ToolchainConfig};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt; // for `oneshot`

/// Copies the input to the output behind a header naming the mode
const ECHO_TOOL: &str = r#"{ echo "-- mode $1"; cat "$3"; } > "$5""#;

/// Tool checkout with `script` prebuilt and launched as `sh <script>`
fn fake_toolchain(root: &tempfile::TempDir, script: &str) -> ToolchainConfig {
    let tool_dir = root.path().join("MoonsecDeobfuscator-master");
    let tool = tool_dir.join("out").join("tool.sh");
    std::fs::create_dir_all(tool.parent().unwrap()).unwrap();
    std::fs::write(&tool, script).unwrap();

    let mut config =
        ToolchainConfig::new(&tool_dir).with_candidates(vec![LaunchStrategy::Assembly(tool)]);
    config.build_program = "sh".to_string();
    config
}

/// Helper to create test app around a toolchain
fn create_test_app(config: ToolchainConfig) -> axum::Router {
    create_router(AppState::new(Arc::new(Toolchain::new(config))))
}

async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .uri("/deobfuscate")
        .method("POST")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn test_index() {
    let app = create_test_app(ToolchainConfig::new("MoonsecDeobfuscator-master"));

    let (status, json) = send(app, get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "Moonsec Deobfuscator API");
    assert_eq!(json["version"], "1.0.0");
    assert_eq!(json["status"], "running");
}

#[tokio::test]
async fn test_smoke_endpoint() {
    let app = create_test_app(ToolchainConfig::new("MoonsecDeobfuscator-master"));

    let (status, json) = send(app, get("/test")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["test"], "Moonsec API is working");
    assert!(json["sample"].as_str().unwrap().contains("print(result)"));
    assert!(json["endpoints"]["POST /deobfuscate"].is_string());
    assert!(json["endpoints"]["GET /health"].is_string());
}

#[tokio::test]
async fn test_health_without_tool_dir() {
    let root = tempfile::tempdir().unwrap();
    let missing = root.path().join("absent");
    let mut config = ToolchainConfig::new(&missing);
    config.build_program = "moonsec-no-such-program".to_string();
    let app = create_test_app(config);

    let (status, json) = send(app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["dotnet"], false);
    assert_eq!(json["moonsec_exists"], false);
    assert_eq!(json["timestamp"].as_f64(), Some(0.0));
    assert_eq!(json["moonsec_path"], missing.display().to_string());
}

#[cfg(unix)]
#[tokio::test]
async fn test_health_with_tool_dir() {
    let root = tempfile::tempdir().unwrap();
    let app = create_test_app(fake_toolchain(&root, ECHO_TOOL));

    let (status, json) = send(app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["moonsec_exists"], true);
    assert!(json["timestamp"].as_f64().unwrap() > 0.0);
    assert!(json["dotnet"].is_boolean());
}

#[tokio::test]
async fn test_missing_content() {
    let app = create_test_app(ToolchainConfig::new("MoonsecDeobfuscator-master"));

    let (status, json) = send(app, post_json(json!({ "disassembly": true }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "No content provided");
    assert!(json.get("result").is_none());
}

#[tokio::test]
async fn test_malformed_body() {
    let app = create_test_app(ToolchainConfig::new("MoonsecDeobfuscator-master"));

    let request = Request::builder()
        .uri("/deobfuscate")
        .method("POST")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, json) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().starts_with("Invalid JSON body"));
}

#[tokio::test]
async fn test_missing_tool_dir() {
    let root = tempfile::tempdir().unwrap();
    let app = create_test_app(ToolchainConfig::new(root.path().join("absent")));

    let (status, json) = send(app, post_json(json!({ "content": "print(1)" }))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["success"], false);
    assert!(json["error"]
        .as_str()
        .unwrap()
        .starts_with("MoonsecDeobfuscator not found at:"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_deobfuscate_bytecode() {
    let root = tempfile::tempdir().unwrap();
    let app = create_test_app(fake_toolchain(&root, ECHO_TOOL));

    let (status, json) = send(
        app,
        post_json(json!({ "content": "local x = {1}; print(x)", "filename": "x.lua" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["format"], "bytecode");
    assert_eq!(json["original_filename"], "x.lua");
    assert_eq!(
        json["result"],
        "-- mode -dev\nlocal x = {\n1\n};\n print(x)"
    );
    assert!(json.get("error").is_none());
}

#[cfg(unix)]
#[tokio::test]
async fn test_deobfuscate_disassembly() {
    let root = tempfile::tempdir().unwrap();
    let app = create_test_app(fake_toolchain(&root, ECHO_TOOL));

    let (status, json) = send(
        app,
        post_json(json!({ "content": "LOADK  \n\nRETURN", "disassembly": true })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["format"], "disassembly");
    assert_eq!(json["original_filename"], "unknown.lua");
    assert_eq!(json["result"], "-- mode -dis\nLOADK\nRETURN");
}

#[cfg(unix)]
#[tokio::test]
async fn test_semicolon_inside_string_is_split() {
    let root = tempfile::tempdir().unwrap();
    let app = create_test_app(fake_toolchain(&root, r#"cp "$3" "$5""#));

    let (status, json) = send(app, post_json(json!({ "content": "print('x;y')" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["result"], "print('x;\ny')");
}

#[cfg(unix)]
#[tokio::test]
async fn test_tool_failure() {
    let root = tempfile::tempdir().unwrap();
    let app = create_test_app(fake_toolchain(&root, "echo 'not moonsec' >&2; exit 1"));

    let (status, json) = send(app, post_json(json!({ "content": "print(1)" }))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "Deobfuscation failed: not moonsec");
}

#[cfg(unix)]
#[tokio::test]
async fn test_timeout() {
    let root = tempfile::tempdir().unwrap();
    let scratch: PathBuf = root.path().join("scratch");
    std::fs::create_dir_all(&scratch).unwrap();
    let mut config =
        fake_toolchain(&root, "sleep 5").with_process_timeout(Duration::from_millis(200));
    config.scratch_dir = Some(scratch.clone());
    let app = create_test_app(config);

    let (status, json) = send(app, post_json(json!({ "content": "print(1)" }))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("timed out"));
    assert_eq!(std::fs::read_dir(&scratch).unwrap().count(), 0);
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let app = create_test_app(ToolchainConfig::new("MoonsecDeobfuscator-master"));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/")
                .header("origin", "http://example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "*"
    );
}

#[cfg(unix)]
#[tokio::test]
async fn test_payload_over_two_megabytes() {
    let root = tempfile::tempdir().unwrap();
    let app = create_test_app(fake_toolchain(&root, r#"cp "$3" "$5""#));
    let content = "x".repeat(3 * 1024 * 1024);

    let (status, json) = send(
        app,
        post_json(json!({ "content": &content, "pretty": false })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["result"].as_str().unwrap().len(), content.len());
}

#[tokio::test]
async fn test_configured_body_limit() {
    let state = AppState::new(Arc::new(Toolchain::new(ToolchainConfig::new(
        "MoonsecDeobfuscator-master",
    ))))
    .with_body_limit(Some(1024));
    let app = create_router(state);

    let (status, json) = send(app, post_json(json!({ "content": "x".repeat(4096) }))).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().starts_with("Invalid JSON body"));
}
