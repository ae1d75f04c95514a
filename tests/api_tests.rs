//! API integration tests
//!
//! Requests go through the full router with `tower::ServiceExt::oneshot`.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use pretty_assertions::assert_eq;
use royalbit_sheetmap::api::{router, AppState};
use royalbit_sheetmap::schema::{SchemaDocument, SchemaRegistry};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const PERSON: &str = r#"
name: person
fields:
  - key: name
    header: Name
    order: 0
"#;

const EMPLOYEE: &str = r#"
name: employee
extends: person
fields:
  - key: age
    header: Age
    type: integer
    order: 1
  - key: salary
    header: Salary
    type: decimal
    order: 2
  - key: hired
    header: Hired
    type: date
    order: 3
"#;

const BOUNDARY: &str = "sheetmap-test-boundary";

fn app() -> Router {
    let registry = SchemaRegistry::from_documents(vec![
        SchemaDocument::from_yaml(PERSON).unwrap(),
        SchemaDocument::from_yaml(EMPLOYEE).unwrap(),
    ])
    .unwrap();
    router(Arc::new(AppState::new(registry)))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Multipart body: text fields, then an optional file part
fn multipart_request(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/v1/import")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn export_bytes(app: Router, records: Value) -> Vec<u8> {
    let response = app
        .oneshot(json_request(
            "/api/v1/export",
            json!({
                "schema": "employee",
                "file_name": "staff",
                "include_inherited": true,
                "records": records,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
}

// ═══════════════════════════════════════════════════════════════════════════
// INFO ENDPOINTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_health() {
    let response = app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["status"], "healthy");
    assert_eq!(json["request_id"].as_str().unwrap().len(), 36);
}

#[tokio::test]
async fn test_root_lists_endpoints() {
    let response = app()
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_json(response).await;
    let paths: Vec<&str> = json["data"]["endpoints"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["path"].as_str().unwrap())
        .collect();
    assert!(paths.contains(&"/api/v1/export"));
    assert!(paths.contains(&"/api/v1/import/url"));
}

#[tokio::test]
async fn test_version() {
    let response = app()
        .oneshot(Request::get("/version").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["data"]["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_schemas_sorted() {
    let response = app()
        .oneshot(Request::get("/api/v1/schemas").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["data"]["schemas"], json!(["employee", "person"]));
}

// ═══════════════════════════════════════════════════════════════════════════
// EXPORT
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_export_headers() {
    let response = app()
        .oneshot(json_request(
            "/api/v1/export",
            json!({
                "schema": "employee",
                "file_name": "员工 list",
                "records": [{"name": "Alice", "age": 30}],
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/octet-stream"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=%E5%91%98%E5%B7%A5%20list.xlsx"
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.starts_with(b"PK"));
}

#[tokio::test]
async fn test_export_unknown_schema_is_404() {
    let response = app()
        .oneshot(json_request(
            "/api/v1/export",
            json!({"schema": "nope", "file_name": "x", "records": []}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("nope"));
}

#[tokio::test]
async fn test_export_bad_record_is_400() {
    let response = app()
        .oneshot(json_request(
            "/api/v1/export",
            json!({"schema": "employee", "file_name": "x", "records": [{"age": "thirty"}]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ═══════════════════════════════════════════════════════════════════════════
// IMPORT
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_upload_round_trip() {
    let bytes = export_bytes(
        app(),
        json!([
            {"name": "Alice", "age": 30, "salary": "1200.5", "hired": "2021-03-04"},
            {"name": "Bob", "age": 41},
        ]),
    )
    .await;

    let request = multipart_request(
        &[
            ("schema", "employee"),
            ("header_band", "0"),
            ("ignore_start_rows", "0"),
        ],
        Some(("staff.xlsx", &bytes)),
    );
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["count"], 2);
    assert_eq!(
        json["data"]["records"][0],
        json!({"name": "Alice", "age": 30, "salary": "1200.5", "hired": "2021-03-04"})
    );
    assert_eq!(
        json["data"]["records"][1],
        json!({"name": "Bob", "age": 41, "salary": null, "hired": null})
    );
}

#[tokio::test]
async fn test_upload_without_file_is_400() {
    let request = multipart_request(&[("schema", "employee")], None);
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("No file selected"));
}

#[tokio::test]
async fn test_upload_empty_file_name_is_no_file() {
    let request = multipart_request(&[("schema", "employee")], Some(("", b"")));
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("No file selected"));
}

#[tokio::test]
async fn test_upload_bad_option_is_400() {
    let request = multipart_request(
        &[("schema", "employee"), ("header_row", "first")],
        Some(("staff.xlsx", b"PK")),
    );
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_unsupported_extension_is_400() {
    let request = multipart_request(&[("schema", "person")], Some(("staff.csv", b"Name\n")));
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("staff.csv"));
}

#[tokio::test]
async fn test_import_url_unreachable_is_502() {
    let response = app()
        .oneshot(json_request(
            "/api/v1/import/url",
            json!({
                "schema": "employee",
                "file_name": "staff.xlsx",
                "file_url": "http://127.0.0.1:9/staff.xlsx",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_import_url_unknown_schema_is_404() {
    let response = app()
        .oneshot(json_request(
            "/api/v1/import/url",
            json!({
                "schema": "nope",
                "file_name": "staff.xlsx",
                "file_url": "http://127.0.0.1:9/staff.xlsx",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
