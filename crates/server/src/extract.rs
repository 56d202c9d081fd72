//! Extractors whose rejections use the shared JSON error body.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::errors::JsonApiError;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(JsonApiError))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(JsonApiError))]
pub struct Path<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(JsonApiError))]
pub struct Query<T>(pub T);

impl From<JsonRejection> for JsonApiError {
    fn from(r: JsonRejection) -> Self {
        // 415 and 413 keep their status; malformed or mistyped bodies become 400
        let status = match r.status().as_u16() {
            415 | 413 => r.status(),
            _ => axum::http::StatusCode::BAD_REQUEST,
        };
        JsonApiError::new(status, "Invalid Request Body", Some(r.body_text()))
    }
}

impl From<PathRejection> for JsonApiError {
    fn from(r: PathRejection) -> Self {
        JsonApiError::new(r.status(), "Invalid Path", Some(r.body_text()))
    }
}

impl From<QueryRejection> for JsonApiError {
    fn from(r: QueryRejection) -> Self {
        JsonApiError::new(r.status(), "Invalid Query", Some(r.body_text()))
    }
}
