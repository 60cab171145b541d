use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, app_with_prefix, AccessKey, ServerInfo, MANAGEMENT_PORT};
use serde_json::Value;
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(String::new())
        .unwrap()
}

// --- access keys ---

#[tokio::test]
async fn list_access_keys_empty() {
    let resp = app().oneshot(empty_request("GET", "/access-keys")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["accessKeys"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn create_access_key_returns_201() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/access-keys",
            r#"{"name":"auto_testing","password":"auto_testing","limit":{"bytes":1073741824}}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = body_json(resp).await;
    assert_eq!(body["id"], "0");
    assert_eq!(body["name"], "auto_testing");
    assert_eq!(body["password"], "auto_testing");
    assert_eq!(body["dataLimit"]["bytes"], 1_073_741_824u64);
}

#[tokio::test]
async fn create_access_key_with_empty_body_uses_defaults() {
    let resp = app().oneshot(json_request("POST", "/access-keys", "{}")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let key: AccessKey = body_json(resp).await;
    assert_eq!(key.method, mock_server::DEFAULT_METHOD);
    assert!(key.name.is_empty());
    assert!(key.data_limit.is_none());
}

#[tokio::test]
async fn get_access_key_not_found() {
    let resp = app().oneshot(empty_request("GET", "/access-keys/17")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rename_unknown_key_returns_404() {
    let resp = app()
        .oneshot(json_request("PUT", "/access-keys/17/name", r#"{"name":"x"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_access_key_not_found() {
    let resp = app().oneshot(empty_request("DELETE", "/access-keys/17")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- metrics ---

#[tokio::test]
async fn metrics_enabled_defaults_to_false() {
    let resp = app().oneshot(empty_request("GET", "/metrics/enabled")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["metricsEnabled"], false);
}

#[tokio::test]
async fn transfer_metrics_carries_marker() {
    let resp = app().oneshot(empty_request("GET", "/metrics/transfer")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert!(body["bytesTransferredByUserId"].is_object());
}

// --- server ---

#[tokio::test]
async fn server_info_returns_200() {
    let resp = app().oneshot(empty_request("GET", "/server")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let info: ServerInfo = body_json(resp).await;
    assert_eq!(info.port_for_new_access_keys, mock_server::DEFAULT_ACCESS_KEY_PORT);
}

#[tokio::test]
async fn set_server_name_rejects_empty_name() {
    let resp = app()
        .oneshot(json_request("PUT", "/name", r#"{"name":"  "}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn set_default_port_validates_range() {
    for body in [r#"{"port":70000}"#, r#"{"port":0}"#, r#"{"port":"80"}"#, "{}"] {
        let resp = app()
            .oneshot(json_request("PUT", "/server/port-for-new-access-keys", body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body {body}");
    }
}

#[tokio::test]
async fn set_default_port_conflicts_with_management_port() {
    let body = format!(r#"{{"port":{MANAGEMENT_PORT}}}"#);
    let resp = app()
        .oneshot(json_request("PUT", "/server/port-for-new-access-keys", &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn routes_live_under_the_prefix() {
    let resp = app_with_prefix("XyZsecret")
        .oneshot(empty_request("GET", "/XyZsecret/server"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app_with_prefix("XyZsecret")
        .oneshot(empty_request("GET", "/server"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- full lifecycle ---

#[tokio::test]
async fn access_key_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    // create
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("POST", "/access-keys", r#"{"name":"phone"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: AccessKey = body_json(resp).await;
    let id = created.id.clone();

    // rename
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "PUT",
            &format!("/access-keys/{id}/name"),
            r#"{"name":"laptop"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    // set data limit
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "PUT",
            &format!("/access-keys/{id}/data-limit"),
            r#"{"limit":{"bytes":5000}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    // get reflects both changes
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", &format!("/access-keys/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: AccessKey = body_json(resp).await;
    assert_eq!(fetched.name, "laptop");
    assert_eq!(fetched.data_limit.map(|l| l.bytes), Some(5000));
    assert_eq!(fetched.password, created.password);

    // metrics list the key
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", "/metrics/transfer"))
        .await
        .unwrap();
    let metrics: Value = body_json(resp).await;
    assert_eq!(metrics["bytesTransferredByUserId"][&id], 0);

    // delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("DELETE", &format!("/access-keys/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let body = body_bytes(resp).await;
    assert!(body.is_empty());

    // list after delete is empty
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", "/access-keys"))
        .await
        .unwrap();
    let body: Value = body_json(resp).await;
    assert!(body["accessKeys"].as_array().unwrap().is_empty());
}
