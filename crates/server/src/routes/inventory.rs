use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use models::category::Category;
use models::inventory::{InventoryFilter, InventoryInput, InventoryView, EXPIRING_SOON_DAYS};
use service::inventory::ConsumeOutcome;

use crate::errors::JsonApiError;
use crate::extract::{Json, Path, Query};
use crate::routes::{today, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/inventory", get(list).post(create))
        .route("/api/inventory/expiring", get(expiring))
        .route("/api/inventory/:id", get(get_item).put(update).delete(delete))
        .route("/api/inventory/:id/consume", post(consume))
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    pub category: Option<String>,
    pub location: Option<String>,
    /// Case-insensitive substring of the name.
    pub search: Option<String>,
    pub expiring_within_days: Option<i64>,
}

impl TryFrom<ListQuery> for InventoryFilter {
    type Error = JsonApiError;

    fn try_from(q: ListQuery) -> Result<Self, Self::Error> {
        let category = q.category.filter(|c| !c.trim().is_empty());
        if let Some(c) = category.as_deref() {
            if Category::parse(c).is_none() {
                return Err(JsonApiError::bad_request(format!("unknown category: {c}")));
            }
        }
        Ok(InventoryFilter {
            category,
            location: q.location,
            search: q.search,
            expiring_within_days: q.expiring_within_days,
        })
    }
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExpiringQuery {
    /// Defaults to 3.
    pub days: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ConsumeRequest {
    pub amount: f64,
}

#[utoipa::path(
    get, path = "/api/inventory", tag = "inventory",
    params(ListQuery),
    responses(
        (status = 200, description = "Items sorted by expiry"),
        (status = 400, description = "Unknown category")
    )
)]
pub async fn list(State(svc): State<AppState>, Query(q): Query<ListQuery>) -> Result<Json<Vec<InventoryView>>, JsonApiError> {
    let filter = InventoryFilter::try_from(q)?;
    Ok(Json(svc.inventory.list(&filter, today()).await))
}

#[utoipa::path(
    post, path = "/api/inventory", tag = "inventory",
    request_body = crate::openapi::InventoryInputDoc,
    responses(
        (status = 201, description = "Created"),
        (status = 400, description = "Validation Error")
    )
)]
pub async fn create(
    State(svc): State<AppState>,
    Json(input): Json<InventoryInput>,
) -> Result<(StatusCode, Json<InventoryView>), JsonApiError> {
    let item = svc.inventory.create(input).await?;
    Ok((StatusCode::CREATED, Json(item.view(today()))))
}

#[utoipa::path(
    get, path = "/api/inventory/{id}", tag = "inventory",
    params(("id" = Uuid, Path, description = "Inventory item id")),
    responses((status = 200, description = "OK"), (status = 404, description = "Not Found"))
)]
pub async fn get_item(State(svc): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<InventoryView>, JsonApiError> {
    let item = svc.inventory.get(id).await?;
    Ok(Json(item.view(today())))
}

#[utoipa::path(
    put, path = "/api/inventory/{id}", tag = "inventory",
    params(("id" = Uuid, Path, description = "Inventory item id")),
    request_body = crate::openapi::InventoryInputDoc,
    responses(
        (status = 200, description = "Updated"),
        (status = 400, description = "Validation Error"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update(
    State(svc): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<InventoryInput>,
) -> Result<Json<InventoryView>, JsonApiError> {
    let item = svc.inventory.update(id, input).await?;
    Ok(Json(item.view(today())))
}

#[utoipa::path(
    delete, path = "/api/inventory/{id}", tag = "inventory",
    params(("id" = Uuid, Path, description = "Inventory item id")),
    responses((status = 204, description = "Deleted"), (status = 404, description = "Not Found"))
)]
pub async fn delete(State(svc): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, JsonApiError> {
    svc.inventory.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post, path = "/api/inventory/{id}/consume", tag = "inventory",
    params(("id" = Uuid, Path, description = "Inventory item id")),
    request_body = crate::openapi::ConsumeRequestDoc,
    responses(
        (status = 200, description = "Remaining quantity, or removed"),
        (status = 400, description = "Validation Error"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn consume(
    State(svc): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ConsumeRequest>,
) -> Result<Json<ConsumeOutcome>, JsonApiError> {
    let outcome = svc.inventory.consume(id, req.amount).await?;
    if outcome.removed {
        info!(event = "inventory_used_up", %id, name = %outcome.name);
    }
    Ok(Json(outcome))
}

#[utoipa::path(
    get, path = "/api/inventory/expiring", tag = "inventory",
    params(ExpiringQuery),
    responses((status = 200, description = "Expiring and expired items"))
)]
pub async fn expiring(State(svc): State<AppState>, Query(q): Query<ExpiringQuery>) -> Json<Vec<InventoryView>> {
    let days = q.days.unwrap_or(EXPIRING_SOON_DAYS);
    Json(svc.inventory.expiring(days, today()).await)
}
