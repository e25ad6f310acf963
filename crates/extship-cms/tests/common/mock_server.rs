//! Mock server helpers for the CMS management API
//!
//! Response bodies mirror the shapes the API returns, trimmed to the
//! attributes the client reads plus a few it must ignore.

use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// An asset entry as listed by `GET /v3/assets`
pub fn asset_json(uid: &str, title: &str) -> Value {
    json!({
        "uid": uid,
        "title": title,
        "filename": title,
        "url": format!("https://assets.example.com/{}/{}", uid, title),
        "content_type": "application/octet-stream",
        "is_dir": false,
        "_version": 1
    })
}

/// A folder entry as listed by `GET /v3/assets?include_folders=true`
pub fn folder_json(uid: &str, name: &str, parent_uid: &str) -> Value {
    json!({
        "uid": uid,
        "name": name,
        "parent_uid": parent_uid,
        "is_dir": true
    })
}

/// Error body the API sends with non-success statuses
pub fn error_json(code: i64, message: &str) -> Value {
    json!({ "error_message": message, "error_code": code, "errors": {} })
}

/// Respond to every asset listing with `assets`
pub async fn mock_asset_listing(server: &MockServer, assets: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path("/v3/assets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "assets": assets })))
        .mount(server)
        .await;
}

/// Fail the first `fail_count` requests to `route` with `status`, then answer `body`
pub async fn mock_flaky(
    server: &MockServer,
    http_method: &str,
    route: &str,
    fail_count: u64,
    status: u16,
    body: Value,
) {
    Mock::given(method(http_method))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .up_to_n_times(fail_count)
        .mount(server)
        .await;

    Mock::given(method(http_method))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}
