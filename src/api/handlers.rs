//! API request handlers
//!
//! Handlers for all REST API endpoints.

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::SheetError;
use crate::excel::{ExportOptions, ImportOptions, SheetExporter, SheetImporter};
use crate::fetch::fetch_remote;
use crate::schema::DynamicRecord;
use crate::types::Schema;

use super::server::AppState;

/// Standard API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            request_id: Uuid::new_v4().to_string(),
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self
    where
        T: Default,
    {
        Self {
            success: false,
            request_id: Uuid::new_v4().to_string(),
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Handler failure, rendered as an error envelope
#[derive(Debug)]
pub enum ApiError {
    UnknownSchema(String),
    Sheet(SheetError),
}

impl From<SheetError> for ApiError {
    fn from(err: SheetError) -> Self {
        ApiError::Sheet(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::UnknownSchema(_) => StatusCode::NOT_FOUND,
            ApiError::Sheet(err) => match err {
                SheetError::Fetch(_) => StatusCode::BAD_GATEWAY,
                SheetError::Encoding(_) | SheetError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::BAD_REQUEST,
            },
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::UnknownSchema(name) => format!("Unknown schema '{}'", name),
            ApiError::Sheet(err) => err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        warn!("Request failed ({}): {}", status, message);
        (status, Json(ApiResponse::<()>::err(message))).into_response()
    }
}

fn lookup_schema(state: &AppState, name: &str) -> Result<Arc<Schema>, ApiError> {
    state
        .schemas
        .get(name)
        .ok_or_else(|| ApiError::UnknownSchema(name.to_string()))
}

/// Root endpoint response
#[derive(Serialize)]
pub struct RootResponse {
    pub name: String,
    pub version: String,
    pub description: String,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Serialize)]
pub struct EndpointInfo {
    pub path: String,
    pub method: String,
    pub description: String,
}

impl EndpointInfo {
    fn new(path: &str, method: &str, description: &str) -> Self {
        Self {
            path: path.to_string(),
            method: method.to_string(),
            description: description.to_string(),
        }
    }
}

/// GET / - Root info
pub async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let response = RootResponse {
        name: "Sheetmap API Server".to_string(),
        version: state.version.clone(),
        description: "Typed records to spreadsheets and back".to_string(),
        endpoints: vec![
            EndpointInfo::new("/health", "GET", "Health check endpoint"),
            EndpointInfo::new("/version", "GET", "Get server version"),
            EndpointInfo::new("/api/v1/schemas", "GET", "List loaded schemas"),
            EndpointInfo::new("/api/v1/export", "POST", "Export records to .xlsx"),
            EndpointInfo::new("/api/v1/import", "POST", "Import an uploaded .xls/.xlsx"),
            EndpointInfo::new("/api/v1/import/url", "POST", "Import a workbook from a URL"),
        ],
    };
    Json(ApiResponse::ok(response))
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_message: String,
}

/// GET /health - Health check
pub async fn health() -> impl IntoResponse {
    Json(ApiResponse::ok(HealthResponse {
        status: "healthy".to_string(),
        uptime_message: "Server is running".to_string(),
    }))
}

/// Version response
#[derive(Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub features: Vec<String>,
}

/// GET /version - Server version
pub async fn version(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(VersionResponse {
        version: state.version.clone(),
        features: vec![
            "export".to_string(),
            "import".to_string(),
            "import_url".to_string(),
        ],
    }))
}

/// Schema listing response
#[derive(Serialize, Default)]
pub struct SchemasResponse {
    pub schemas: Vec<String>,
}

/// GET /api/v1/schemas - Names of loaded schemas
pub async fn schemas(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(SchemasResponse {
        schemas: state.schemas.names(),
    }))
}

/// Export request
#[derive(Deserialize)]
pub struct ExportRequest {
    pub schema: String,
    pub file_name: String,
    #[serde(default)]
    pub records: Vec<Value>,
    /// Also write fields pulled in through `extends`
    #[serde(default)]
    pub include_inherited: bool,
}

/// `attachment; filename=<url-encoded name>.xlsx`
pub fn content_disposition(file_name: &str) -> String {
    format!(
        "attachment; filename={}",
        urlencoding::encode(&format!("{}.xlsx", file_name))
    )
}

/// POST /api/v1/export - Records to an .xlsx download
pub async fn export(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExportRequest>,
) -> Result<Response, ApiError> {
    let schema = lookup_schema(&state, &req.schema)?;

    let records = req
        .records
        .iter()
        .map(|value| DynamicRecord::from_json(value, &schema))
        .collect::<Result<Vec<_>, _>>()?;

    let exporter = SheetExporter::with_options(ExportOptions {
        include_inherited: req.include_inherited,
        ..ExportOptions::default()
    });
    let bytes = exporter.export_with_schema(&records, &schema)?;
    info!(
        "Export '{}' with schema '{}': {} records",
        req.file_name,
        req.schema,
        records.len()
    );

    Ok((
        [
            (
                header::CONTENT_TYPE,
                "application/octet-stream".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                content_disposition(&req.file_name),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// Import response
#[derive(Serialize, Default)]
pub struct ImportResponse {
    pub file_name: String,
    pub schema: String,
    pub count: usize,
    pub records: Vec<Value>,
}

fn import_bytes(
    schema_name: &str,
    schema: &Schema,
    file_name: &str,
    bytes: &[u8],
    options: ImportOptions,
) -> Result<ImportResponse, ApiError> {
    let records = SheetImporter::new(options).import_with_schema(
        file_name,
        bytes,
        schema,
        DynamicRecord::new,
    )?;

    Ok(ImportResponse {
        file_name: file_name.to_string(),
        schema: schema_name.to_string(),
        count: records.len(),
        records: records.iter().map(|record| record.to_json(schema)).collect(),
    })
}

fn parse_row_number(name: &str, text: &str) -> Result<usize, ApiError> {
    text.trim().parse::<usize>().map_err(|_| {
        ApiError::Sheet(SheetError::InvalidOptions(format!(
            "{} must be a non-negative integer, got '{}'",
            name, text
        )))
    })
}

/// POST /api/v1/import - Multipart upload
///
/// The first part with a non-empty file name is the workbook. Text parts: `schema`,
/// `ignore_start_rows`, `header_row`, `data_start_row`, `ignore_end_rows`,
/// `header_band`.
pub async fn import_upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<ImportResponse>>, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    let mut schema_name: Option<String> = None;
    let mut options = ImportOptions::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| SheetError::Upload(format!("Malformed multipart body: {}", e)))?
    {
        if let Some(file_name) = field.file_name().map(str::to_string) {
            // Browsers send an empty file name when no file was chosen
            if file_name.is_empty() {
                continue;
            }
            let bytes = field
                .bytes()
                .await
                .map_err(|e| SheetError::Upload(format!("Failed to read upload: {}", e)))?;
            if upload.is_none() {
                upload = Some((file_name, bytes.to_vec()));
            }
            continue;
        }

        let name = field.name().unwrap_or_default().to_string();
        let text = field
            .text()
            .await
            .map_err(|e| SheetError::Upload(format!("Failed to read field '{}': {}", name, e)))?;
        match name.as_str() {
            "schema" => schema_name = Some(text.trim().to_string()),
            "ignore_start_rows" => options.ignore_start_rows = parse_row_number(&name, &text)?,
            "header_row" => options.header_row = parse_row_number(&name, &text)?,
            "data_start_row" => options.data_start_row = parse_row_number(&name, &text)?,
            "ignore_end_rows" => options.ignore_end_rows = parse_row_number(&name, &text)?,
            "header_band" => options.header_band = parse_row_number(&name, &text)?,
            _ => {}
        }
    }

    let (file_name, bytes) =
        upload.ok_or_else(|| SheetError::Upload("No file selected".to_string()))?;
    let schema_name =
        schema_name.ok_or_else(|| SheetError::Upload("Missing 'schema' field".to_string()))?;
    let schema = lookup_schema(&state, &schema_name)?;

    let response = import_bytes(&schema_name, &schema, &file_name, &bytes, options)?;
    info!(
        "Imported upload '{}' with schema '{}': {} records",
        file_name, schema_name, response.count
    );
    Ok(Json(ApiResponse::ok(response)))
}

/// Import-from-URL request
#[derive(Deserialize)]
pub struct ImportUrlRequest {
    pub schema: String,
    /// Name with extension; picks the container format
    pub file_name: String,
    pub file_url: String,
    #[serde(default)]
    pub options: ImportOptions,
}

/// POST /api/v1/import/url - Fetch a remote workbook and import it
pub async fn import_url(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ImportUrlRequest>,
) -> Result<Json<ApiResponse<ImportResponse>>, ApiError> {
    let schema = lookup_schema(&state, &req.schema)?;
    let bytes = fetch_remote(&req.file_url).await?;

    let response = import_bytes(&req.schema, &schema, &req.file_name, &bytes, req.options)?;
    info!(
        "Imported '{}' from {} with schema '{}': {} records",
        req.file_name, req.file_url, req.schema, response.count
    );
    Ok(Json(ApiResponse::ok(response)))
}
