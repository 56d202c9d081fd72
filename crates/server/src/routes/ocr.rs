use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use service::ocr::{ItemScan, ReceiptImport, ReceiptScan, SampleScan};
use upstream::Upload;

use crate::errors::JsonApiError;
use crate::extract::{Json, Query};
use crate::routes::{today, AppState};

const FILE_FIELD: &str = "file";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/ocr/receipt", post(scan_receipt))
        .route("/api/ocr/receipt/import", post(import))
        .route("/api/ocr/item", post(scan_item))
        .route("/api/ocr/parse", post(parse))
        .route("/api/ocr/test", get(sample))
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LangQuery {
    /// Two-letter or full language name; `en` when omitted.
    pub lang: Option<String>,
}

impl LangQuery {
    fn lang(&self) -> &str {
        self.lang.as_deref().filter(|l| !l.trim().is_empty()).unwrap_or("en")
    }
}

#[derive(Debug, Deserialize)]
pub struct ParseRequest {
    #[serde(default)]
    pub text: String,
}

/// Pull the `file` part out of a multipart body.
async fn read_upload(mut multipart: Multipart) -> Result<Upload, JsonApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| JsonApiError::bad_request(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| JsonApiError::bad_request(format!("failed to read upload: {e}")))?;
        debug!(event = "upload_received", %filename, size = bytes.len());
        return Ok(Upload { field: FILE_FIELD.to_string(), filename, content_type, bytes: bytes.to_vec() });
    }
    Err(JsonApiError::bad_request("multipart field `file` required"))
}

#[utoipa::path(
    post, path = "/api/ocr/receipt", tag = "ocr",
    params(LangQuery),
    responses(
        (status = 200, description = "Recognised and parsed receipt"),
        (status = 400, description = "Missing or empty file"),
        (status = 502, description = "OCR service failed"),
        (status = 503, description = "OCR circuit open")
    )
)]
pub async fn scan_receipt(
    State(svc): State<AppState>,
    Query(q): Query<LangQuery>,
    multipart: Multipart,
) -> Result<Json<ReceiptScan>, JsonApiError> {
    let upload = read_upload(multipart).await?;
    Ok(Json(svc.ocr.scan_receipt(upload, q.lang()).await?))
}

#[utoipa::path(
    post, path = "/api/ocr/item", tag = "ocr",
    params(LangQuery),
    responses(
        (status = 200, description = "Recognised text with a suggested inventory item"),
        (status = 400, description = "Missing or empty file"),
        (status = 502, description = "OCR service failed")
    )
)]
pub async fn scan_item(
    State(svc): State<AppState>,
    Query(q): Query<LangQuery>,
    multipart: Multipart,
) -> Result<Json<ItemScan>, JsonApiError> {
    let upload = read_upload(multipart).await?;
    Ok(Json(svc.ocr.scan_item(upload, q.lang()).await?))
}

#[utoipa::path(
    post, path = "/api/ocr/parse", tag = "ocr",
    request_body = crate::openapi::TextRequestDoc,
    responses((status = 200, description = "Parsed receipt"), (status = 400, description = "Empty text"))
)]
pub async fn parse(State(svc): State<AppState>, Json(req): Json<ParseRequest>) -> Result<Json<ReceiptScan>, JsonApiError> {
    Ok(Json(svc.ocr.parse_text(&req.text)?))
}

#[utoipa::path(
    get, path = "/api/ocr/test", tag = "ocr",
    responses((status = 200, description = "The built-in sample receipt, parsed"))
)]
pub async fn sample(State(svc): State<AppState>) -> Json<SampleScan> {
    Json(svc.ocr.sample())
}

#[utoipa::path(
    post, path = "/api/ocr/receipt/import", tag = "ocr",
    responses((status = 201, description = "Items added to the inventory"), (status = 400, description = "No items"))
)]
pub async fn import(
    State(svc): State<AppState>,
    Json(req): Json<ReceiptImport>,
) -> Result<(StatusCode, Json<Value>), JsonApiError> {
    let created = svc.ocr.import(req, today()).await?;
    info!(event = "receipt_import_request", count = created.len());
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "count": created.len(), "items": created }))))
}
