// ABOUTME: Integration tests for the HTTP API router.
// ABOUTME: Drives the axum router with tower oneshot over a scripted runtime.

mod support;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use imagedash::api::{AppState, DeploymentInfo, build_router};
use imagedash::images::ImageService;
use imagedash::registry::RegistryStore;
use imagedash::runtime::RuntimeType;
use serde_json::{Value, json};
use support::{ScriptedRunner, StaticProbe, executor, fast_retry};
use tower::ServiceExt;

struct Harness {
    runner: ScriptedRunner,
    router: Router,
    dir: tempfile::TempDir,
}

fn harness(installed: &[RuntimeType]) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new();
    let probe = StaticProbe::with(installed);
    let state = AppState::new(
        ImageService::new(executor(&runner, &probe, fast_retry())),
        RegistryStore::new(dir.path().join("registry.json")),
        DeploymentInfo {
            environment: "test".to_string(),
            hostname: "node-1".to_string(),
            ..DeploymentInfo::default()
        },
    )
    .unwrap();
    Harness {
        runner,
        router: build_router(state),
        dir,
    }
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn health_reports_detected_runtime() {
    let h = harness(&[RuntimeType::Nerdctl]);

    let (status, body) = send(&h.router, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["runtime"], "nerdctl");
    assert_eq!(body["environment"], "test");
    assert_eq!(body["hostname"], "node-1");
}

#[tokio::test]
async fn health_stays_up_without_a_runtime() {
    let h = harness(&[]);

    let (status, body) = send(&h.router, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["runtime"], Value::Null);
    assert!(body["runtimeError"].as_str().unwrap().contains("no container runtime found"));
}

#[tokio::test]
async fn list_images_returns_camel_case_records() {
    let h = harness(&[RuntimeType::Docker]);
    h.runner.then_ok(concat!(
        r#"{"ID":"a1","Repository":"nginx","Tag":"1.25","Size":"187MB","CreatedAt":"2024-05-02"}"#,
        "\n",
        r#"{"ID":"b2","Repository":"<none>","Tag":"<none>","Size":"5MB","CreatedAt":"2024-01-01"}"#,
        "\n",
    ));

    let (status, body) = send(&h.router, Method::GET, "/api/images", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([{
            "id": "a1",
            "repository": "nginx",
            "tag": "1.25",
            "size": "187MB",
            "createdAt": "2024-05-02",
            "digest": null
        }])
    );
}

#[tokio::test]
async fn missing_runtime_is_a_server_error() {
    let h = harness(&[]);

    let (status, body) = send(&h.router, Method::GET, "/api/images", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("no container runtime found"));
}

#[tokio::test]
async fn delete_uses_decoded_image_name() {
    let h = harness(&[RuntimeType::Docker]);
    let uri = format!("/api/images/{}", urlencoding::encode("registry.local:5000/app:v1"));

    let (status, body) = send(&h.router, Method::DELETE, &uri, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["imageName"], "registry.local:5000/app:v1");
    assert_eq!(body["success"], true);
    assert_eq!(h.runner.call_args(), [["rmi", "registry.local:5000/app:v1"]]);
}

#[tokio::test]
async fn deleting_unknown_image_is_not_found() {
    let h = harness(&[RuntimeType::Docker]);
    h.runner.then_fail("Error response from daemon: No such image: ghost:latest");

    let (status, body) = send(&h.router, Method::DELETE, "/api/images/ghost:latest", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("ghost:latest"));
}

#[tokio::test]
async fn flag_like_image_name_is_a_bad_request() {
    let h = harness(&[RuntimeType::Docker]);

    let (status, body) = send(&h.router, Method::DELETE, "/api/images/--all", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert_eq!(h.runner.call_count(), 0);
}

#[tokio::test]
async fn save_without_images_is_a_bad_request() {
    let h = harness(&[RuntimeType::Docker]);

    let (status, body) = send(
        &h.router,
        Method::POST,
        "/api/images/save",
        Some(json!({"images": [], "outputPath": "/tmp/out.tar"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "at least one image name is required");
}

#[tokio::test]
async fn bulk_delete_returns_one_outcome_per_image() {
    let h = harness(&[RuntimeType::Docker]);
    h.runner
        .then_ok("")
        .then_fail("Error response from daemon: No such image: b:latest");

    let (status, body) = send(
        &h.router,
        Method::POST,
        "/api/bulk/delete",
        Some(json!({"images": ["a:latest", "b:latest"]})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let outcomes = body.as_array().unwrap();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0]["success"], true);
    assert_eq!(outcomes[1]["imageName"], "b:latest");
    assert_eq!(outcomes[1]["success"], false);
}

#[tokio::test]
async fn bulk_push_continues_past_a_failed_image() {
    let h = harness(&[RuntimeType::Docker]);
    h.runner
        .then_fail("denied: requested access to the resource is denied")
        .then_ok("");

    let (status, body) = send(
        &h.router,
        Method::POST,
        "/api/bulk/push",
        Some(json!({"images": ["a:1", "b:1"]})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let outcomes = body.as_array().unwrap();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0]["imageName"], "a:1");
    assert_eq!(outcomes[0]["success"], false);
    assert!(outcomes[0]["error"].as_str().unwrap().contains("denied"));
    assert_eq!(outcomes[1]["imageName"], "b:1");
    assert_eq!(outcomes[1]["success"], true);
    assert_eq!(outcomes[1]["target"], "b:1");
    assert_eq!(h.runner.call_args(), [["push", "a:1"], ["push", "b:1"]]);
}

#[tokio::test]
async fn bulk_delete_rejects_empty_list() {
    let h = harness(&[RuntimeType::Docker]);

    let (status, _) = send(
        &h.router,
        Method::POST,
        "/api/bulk/delete",
        Some(json!({"images": []})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn pull_route_is_not_shadowed_by_image_name_route() {
    let h = harness(&[RuntimeType::Docker]);

    let (status, body) = send(
        &h.router,
        Method::POST,
        "/api/images/pull",
        Some(json!({"image": "nginx:1.25"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Successfully pulled image nginx:1.25");
    assert_eq!(h.runner.call_args(), [["pull", "nginx:1.25"]]);
}

#[tokio::test]
async fn push_retags_into_stored_registry() {
    let h = harness(&[RuntimeType::Docker]);

    let (status, _) = send(
        &h.router,
        Method::PUT,
        "/api/registry/config",
        Some(json!({"url": "registry.local", "port": 5000})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &h.router,
        Method::POST,
        "/api/images/push",
        Some(json!({"image": "app:v1"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["target"], "registry.local:5000/app:v1");
    assert_eq!(
        h.runner.call_args(),
        [
            vec!["tag", "app:v1", "registry.local:5000/app:v1"],
            vec!["push", "registry.local:5000/app:v1"],
        ]
    );
}

#[tokio::test]
async fn registry_config_hides_password() {
    let h = harness(&[RuntimeType::Docker]);

    send(
        &h.router,
        Method::PUT,
        "/api/registry/config",
        Some(json!({"url": "https://registry.local", "username": "ci", "password": "s3cret"})),
    )
    .await;
    let (status, body) = send(&h.router, Method::GET, "/api/registry/config", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["url"], "https://registry.local");
    assert_eq!(body["username"], "ci");
    assert_eq!(body["hasPassword"], true);
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn unconfigured_registry_is_unhealthy() {
    let h = harness(&[RuntimeType::Docker]);

    let (status, body) = send(&h.router, Method::GET, "/api/images/registry/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["healthy"], false);
    assert_eq!(body["error"], "registry is not configured");
}

#[tokio::test]
async fn corrupt_registry_file_is_a_server_error() {
    let h = harness(&[RuntimeType::Docker]);
    std::fs::write(h.dir.path().join("registry.json"), "{ not json").unwrap();

    let (status, body) = send(&h.router, Method::GET, "/api/registry/config", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("invalid registry settings"));
}
