use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tracing::info;

use models::inventory::InventoryView;
use service::barcode::Product;

use crate::errors::JsonApiError;
use crate::extract::{Json, Path, Query};
use crate::routes::{today, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/barcode/:code", get(lookup))
        .route("/api/barcode/:code/add", post(add))
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AddQuery {
    /// Defaults to 1.
    pub quantity: Option<f64>,
}

#[utoipa::path(
    get, path = "/api/barcode/{code}", tag = "barcode",
    params(("code" = String, Path, description = "EAN-8, UPC-A, EAN-13 or GTIN-14")),
    responses(
        (status = 200, description = "Product"),
        (status = 400, description = "Malformed code or bad check digit"),
        (status = 404, description = "Unknown product")
    )
)]
pub async fn lookup(State(svc): State<AppState>, Path(code): Path<String>) -> Result<Json<Product>, JsonApiError> {
    Ok(Json(svc.barcode.lookup(&code).await?))
}

#[utoipa::path(
    post, path = "/api/barcode/{code}/add", tag = "barcode",
    params(("code" = String, Path, description = "Product barcode"), AddQuery),
    responses(
        (status = 201, description = "Added to the inventory"),
        (status = 400, description = "Validation Error"),
        (status = 404, description = "Unknown product")
    )
)]
pub async fn add(
    State(svc): State<AppState>,
    Path(code): Path<String>,
    Query(q): Query<AddQuery>,
) -> Result<(StatusCode, Json<InventoryView>), JsonApiError> {
    let today = today();
    let item = svc.barcode.add_to_inventory(&code, q.quantity, today).await?;
    info!(event = "barcode_added", code = %code, id = %item.id);
    Ok((StatusCode::CREATED, Json(item.view(today))))
}
