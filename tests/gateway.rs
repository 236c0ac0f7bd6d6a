//! End-to-end tests driving the HTTP router in-process.

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use mocker::{MockServer, MockerConfig};
use serde_json::{json, Value};
use std::io::Write;
use tower::ServiceExt;

fn server() -> MockServer {
    MockServer::new(MockerConfig::default()).unwrap()
}

async fn send(app: &Router, method: &str, uri: &str, body: impl Into<Body>) -> (StatusCode, HeaderMap, String) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(body.into())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn send_json(app: &Router, method: &str, uri: &str, body: &Value) -> (StatusCode, Value) {
    let (status, _, text) = send(app, method, uri, body.to_string()).await;
    (status, serde_json::from_str(&text).unwrap())
}

fn echo_payload() -> Value {
    json!({
        "path": "/echo",
        "method": "POST",
        "mode": 1,
        "responses": [
            {"content": "{\"hello\":\"world\"}", "keyword": "world"},
            {"content": "{\"foo\":\"bar\"}", "keyword": "foo", "headers": {"Auth": "1000000"}}
        ]
    })
}

#[tokio::test]
async fn test_unregistered_path_gets_welcome() {
    let app = server().router();
    let (status, _, body) = send(&app, "GET", "/nope", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Welcome to mocker!");
}

#[tokio::test]
async fn test_root_route_is_registered() {
    let server = server();
    let app = server.router();
    let (status, headers, body) = send(&app, "GET", "/", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Welcome to mocker!");
    assert_eq!(headers["content-type"], "text/html; charset=utf-8");
    assert_eq!(server.stats().matched(), 1);
}

#[tokio::test]
async fn test_keyword_end_to_end() {
    let server = server();
    let app = server.router();

    let (status, reply) = send_json(&app, "POST", "/create", &echo_payload()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply, json!({"msg": "ok"}));

    let (status, _, body) = send(&app, "POST", "/echo", "say world").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"hello":"world"}"#);

    let (status, headers, body) = send(&app, "POST", "/echo", "say foo").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"foo":"bar"}"#);
    assert_eq!(headers["auth"], "1000000");

    let (_, _, body) = send(&app, "POST", "/echo", "foo world").await;
    assert_eq!(body, r#"{"hello":"world"}"#);

    let (status, _, body) = send(&app, "POST", "/echo", "say nothing").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Welcome to mocker!");

    // Method is part of the route identity.
    let (_, _, body) = send(&app, "GET", "/echo", "say foo").await;
    assert_eq!(body, "Welcome to mocker!");

    assert_eq!(server.stats().total(), 5);
    assert_eq!(server.stats().matched(), 3);
    assert_eq!(server.stats().unmatched(), 2);
}

#[tokio::test]
async fn test_pattern_end_to_end() {
    let app = server().router();
    let payload = json!({
        "path": "/numbers",
        "method": "put",
        "mode": 2,
        "responses": [
            {"content": "digits", "status_code": 202, "content_type": "text/plain", "regular": "^\\d+$"},
            {"content": "letters", "regular": "[a-z]+"}
        ]
    });
    let (status, _) = send_json(&app, "POST", "/create", &payload).await;
    assert_eq!(status, StatusCode::OK);

    let (status, headers, body) = send(&app, "PUT", "/numbers", "12345").await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body, "digits");
    assert_eq!(headers["content-type"], "text/plain");

    let (status, _, body) = send(&app, "PUT", "/numbers", "12a45").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "letters");

    let (_, _, body) = send(&app, "PUT", "/numbers", "12-45").await;
    assert_eq!(body, "Welcome to mocker!");
}

#[tokio::test]
async fn test_fixed_mode_ignores_body() {
    let app = server().router();
    let payload = json!({
        "path": "/fixed",
        "method": "PATCH",
        "mode": 0,
        "responses": [{"content": "one"}, {"content": "two"}]
    });
    send_json(&app, "POST", "/create", &payload).await;

    for body in ["", "two", "anything"] {
        let (_, _, text) = send(&app, "PATCH", "/fixed", body).await;
        assert_eq!(text, "one");
    }
}

#[tokio::test]
async fn test_reregistration_replaces() {
    let app = server().router();
    send_json(&app, "POST", "/create", &echo_payload()).await;

    let replacement = json!({
        "path": "/echo",
        "method": "POST",
        "mode": 0,
        "responses": [{"content": "replaced"}]
    });
    send_json(&app, "POST", "/create", &replacement).await;

    for body in ["say world", "say foo", ""] {
        let (_, _, text) = send(&app, "POST", "/echo", body).await;
        assert_eq!(text, "replaced");
    }
}

#[tokio::test]
async fn test_create_errors() {
    let server = server();
    let app = server.router();

    let mut missing = echo_payload();
    missing.as_object_mut().unwrap().remove("method");
    let (status, reply) = send_json(&app, "POST", "/create", &missing).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reply["msg"], "required field missing");

    let (status, _, text) = send(&app, "POST", "/create", "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let reply: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(reply["msg"], "invalid request");

    let (_, reply) = send_json(&app, "POST", "/create", &json!([1, 2, 3])).await;
    assert_eq!(reply["msg"], "invalid request");

    let mut empty = echo_payload();
    empty["responses"] = json!([]);
    let (_, reply) = send_json(&app, "POST", "/create", &empty).await;
    assert_eq!(reply["msg"], "empty response");

    let mut unknown = echo_payload();
    unknown["mode"] = json!(3);
    let (_, reply) = send_json(&app, "POST", "/create", &unknown).await;
    assert_eq!(reply["msg"], "unknown mode");

    let bad_pattern = json!({
        "path": "/p", "method": "POST", "mode": 2,
        "responses": [{"regular": "(unclosed"}]
    });
    let (_, reply) = send_json(&app, "POST", "/create", &bad_pattern).await;
    assert_eq!(reply["msg"], "invalid pattern");
    assert!(reply["detail"].as_str().unwrap().contains("(unclosed"));

    // Nothing but the welcome route got registered.
    assert_eq!(server.registry().len(), 1);
}

#[tokio::test]
async fn test_admin_paths_dispatch_other_methods() {
    let app = server().router();
    let (status, _, body) = send(&app, "GET", "/create", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Welcome to mocker!");

    let stub = json!({
        "path": "/export", "method": "DELETE", "mode": 0,
        "responses": [{"content": "gone", "status_code": 204}]
    });
    send_json(&app, "POST", "/create", &stub).await;
    let (status, _, _) = send(&app, "DELETE", "/export", Body::empty()).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let head_stub = json!({
        "path": "/export", "method": "HEAD", "mode": 0,
        "responses": [{"status_code": 418}]
    });
    send_json(&app, "POST", "/create", &head_stub).await;
    let (status, _, _) = send(&app, "HEAD", "/export", Body::empty()).await;
    assert_eq!(status, StatusCode::IM_A_TEAPOT);

    // GET still belongs to the export endpoint.
    let (status, exported) = send_json(&app, "GET", "/export", &Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    assert!(exported["data"].is_array());
}

#[tokio::test]
async fn test_encoded_request_paths_reach_registered_routes() {
    let app = server().router();
    for (path, uri, content) in [("/a b", "/a%20b", "space"), ("/café", "/caf%C3%A9", "accent")] {
        let payload = json!({
            "path": path, "method": "GET", "mode": 0,
            "responses": [{"content": content}]
        });
        let (status, reply) = send_json(&app, "POST", "/create", &payload).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(reply["msg"], "ok");

        let (status, _, body) = send(&app, "GET", uri, Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, content);
    }
}

#[tokio::test]
async fn test_export_import_round_trip() {
    let source = server().router();
    send_json(&source, "POST", "/create", &echo_payload()).await;
    let pattern = json!({
        "path": "/orders", "method": "POST", "mode": "2",
        "responses": [
            {"content": "bad", "status_code": 422, "regular": "\"qty\":\\s*0"},
            {"content": "ok", "status_code": 201, "regular": "\"qty\":\\s*\\d+", "headers": {"X-Order": "1"}}
        ]
    });
    send_json(&source, "POST", "/create", &pattern).await;

    let (status, exported) = send_json(&source, "GET", "/export", &Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    assert!(exported["date"].as_str().unwrap().ends_with("GMT"));
    assert_eq!(exported["data"].as_array().unwrap().len(), 3);

    let target = server().router();
    let (status, reply) = send_json(&target, "POST", "/import", &exported).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["msg"], "ok");

    let probes = [
        ("POST", "/echo", "say world"),
        ("POST", "/echo", "say foo"),
        ("POST", "/echo", "nothing"),
        ("POST", "/orders", r#"{"qty": 0}"#),
        ("POST", "/orders", r#"{"qty": 3}"#),
        ("GET", "/", ""),
    ];
    for (method, uri, body) in probes {
        let expected = send(&source, method, uri, body).await;
        let actual = send(&target, method, uri, body).await;
        assert_eq!(expected.0, actual.0, "{} {} {:?}", method, uri, body);
        assert_eq!(expected.2, actual.2, "{} {} {:?}", method, uri, body);
        assert_eq!(expected.1.get("auth"), actual.1.get("auth"));
        assert_eq!(expected.1.get("x-order"), actual.1.get("x-order"));
    }
}

#[tokio::test]
async fn test_import_stops_at_first_error() {
    let server = server();
    let app = server.router();
    let document = json!({
        "data": [
            {"path": "/a", "method": "GET", "mode": 0, "responses": [{"content": "a"}]},
            {"path": "/b", "method": "GET", "responses": [{"content": "b"}]},
            {"path": "/c", "method": "GET", "mode": 0, "responses": [{"content": "c"}]}
        ]
    });

    let (status, reply) = send_json(&app, "POST", "/import", &document).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reply["msg"], "required field missing");

    let (_, _, body) = send(&app, "GET", "/a", Body::empty()).await;
    assert_eq!(body, "a");
    assert!(server.registry().get("/c | GET").is_none());
}

#[tokio::test]
async fn test_import_failed() {
    let app = server().router();
    for document in [json!({}), json!({"data": []}), json!({"data": null})] {
        let (status, reply) = send_json(&app, "POST", "/import", &document).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(reply["msg"], "import failed");
    }
}

#[tokio::test]
async fn test_body_limit() {
    let mut config = MockerConfig::default();
    config.settings.max_body_bytes = 8;
    let app = MockServer::new(config).unwrap().router();

    let (status, _, _) = send(&app, "POST", "/anything", "0123456789").await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

    let (status, _, _) = send(&app, "POST", "/anything", "0123").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_routes_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
settings:
  default_content_type: application/json
routes:
  - path: /status
    method: get
    mode: 0
    responses:
      - content: '{{"ok": true}}'
"#
    )
    .unwrap();

    let config = MockerConfig::from_file(file.path()).unwrap();
    let app = MockServer::new(config).unwrap().router();

    let (status, headers, body) = send(&app, "GET", "/status", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"ok": true}"#);
    assert_eq!(headers["content-type"], "application/json");
}

#[test]
fn test_bundled_config_is_valid() {
    let config: MockerConfig =
        serde_yaml::from_str(include_str!("../config/default-config.yaml")).unwrap();
    config.validate().unwrap();
    assert_eq!(config.routes.len(), 3);
}
