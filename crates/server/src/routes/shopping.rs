use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use models::shopping::{ShoppingFilter, ShoppingInput, ShoppingItem};
use service::shopping::{AddOutcome, CheckoutOutcome};

use crate::errors::JsonApiError;
use crate::extract::{Json, Path, Query};
use crate::routes::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/shopping", get(list).post(add))
        .route("/api/shopping/clear-purchased", post(clear_purchased))
        .route("/api/shopping/checkout", post(checkout))
        .route("/api/shopping/:id", put(update).delete(delete))
        .route("/api/shopping/:id/toggle", post(toggle))
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    pub purchased: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct Cleared {
    pub removed: usize,
}

#[utoipa::path(
    get, path = "/api/shopping", tag = "shopping",
    params(ListQuery),
    responses((status = 200, description = "Pending first, then by priority"))
)]
pub async fn list(State(svc): State<AppState>, Query(q): Query<ListQuery>) -> Json<Vec<ShoppingItem>> {
    Json(svc.shopping.list(&ShoppingFilter { purchased: q.purchased }).await)
}

#[utoipa::path(
    post, path = "/api/shopping", tag = "shopping",
    request_body = crate::openapi::ShoppingInputDoc,
    responses(
        (status = 201, description = "Created"),
        (status = 200, description = "Merged into an existing entry"),
        (status = 400, description = "Validation Error")
    )
)]
pub async fn add(
    State(svc): State<AppState>,
    Json(input): Json<ShoppingInput>,
) -> Result<(StatusCode, Json<AddOutcome>), JsonApiError> {
    let outcome = svc.shopping.add(input).await?;
    let status = if outcome.merged { StatusCode::OK } else { StatusCode::CREATED };
    Ok((status, Json(outcome)))
}

#[utoipa::path(
    put, path = "/api/shopping/{id}", tag = "shopping",
    params(("id" = Uuid, Path, description = "Shopping item id")),
    request_body = crate::openapi::ShoppingInputDoc,
    responses(
        (status = 200, description = "Updated"),
        (status = 400, description = "Validation Error"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update(
    State(svc): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ShoppingInput>,
) -> Result<Json<ShoppingItem>, JsonApiError> {
    Ok(Json(svc.shopping.update(id, input).await?))
}

#[utoipa::path(
    delete, path = "/api/shopping/{id}", tag = "shopping",
    params(("id" = Uuid, Path, description = "Shopping item id")),
    responses((status = 204, description = "Deleted"), (status = 404, description = "Not Found"))
)]
pub async fn delete(State(svc): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, JsonApiError> {
    svc.shopping.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post, path = "/api/shopping/{id}/toggle", tag = "shopping",
    params(("id" = Uuid, Path, description = "Shopping item id")),
    responses((status = 200, description = "Purchased flag flipped"), (status = 404, description = "Not Found"))
)]
pub async fn toggle(State(svc): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<ShoppingItem>, JsonApiError> {
    Ok(Json(svc.shopping.toggle(id).await?))
}

#[utoipa::path(
    post, path = "/api/shopping/clear-purchased", tag = "shopping",
    responses((status = 200, description = "Number of purchased entries removed"))
)]
pub async fn clear_purchased(State(svc): State<AppState>) -> Json<Cleared> {
    let removed = svc.shopping.clear_purchased().await;
    Json(Cleared { removed })
}

#[utoipa::path(
    post, path = "/api/shopping/checkout", tag = "shopping",
    responses((status = 200, description = "Purchased items moved into the inventory"))
)]
pub async fn checkout(State(svc): State<AppState>) -> Result<Json<CheckoutOutcome>, JsonApiError> {
    Ok(Json(svc.shopping.checkout().await?))
}
