use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use models::consumption::{ConsumptionEntry, ConsumptionFilter, ConsumptionInput};
use service::consumption::ConsumptionSummary;

use crate::errors::JsonApiError;
use crate::extract::{Json, Path, Query};
use crate::routes::meal_plans::RangeQuery;
use crate::routes::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/consumption", get(list).post(log))
        .route("/api/consumption/summary", get(summary))
        .route("/api/consumption/:id", delete(remove))
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    pub member: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[utoipa::path(
    get, path = "/api/consumption", tag = "consumption",
    params(ListQuery),
    responses((status = 200, description = "Newest first"))
)]
pub async fn list(State(svc): State<AppState>, Query(q): Query<ListQuery>) -> Json<Vec<ConsumptionEntry>> {
    let filter = ConsumptionFilter { member: q.member, from: q.from, to: q.to };
    Json(svc.consumption.list(&filter).await)
}

#[utoipa::path(
    post, path = "/api/consumption", tag = "consumption",
    request_body = crate::openapi::ConsumptionInputDoc,
    responses(
        (status = 201, description = "Logged"),
        (status = 400, description = "Validation Error"),
        (status = 404, description = "Linked inventory item not found")
    )
)]
pub async fn log(
    State(svc): State<AppState>,
    Json(input): Json<ConsumptionInput>,
) -> Result<(StatusCode, Json<ConsumptionEntry>), JsonApiError> {
    let entry = svc.consumption.log(input).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

#[utoipa::path(
    get, path = "/api/consumption/summary", tag = "consumption",
    params(RangeQuery),
    responses((status = 200, description = "Per-member totals"))
)]
pub async fn summary(State(svc): State<AppState>, Query(q): Query<RangeQuery>) -> Json<ConsumptionSummary> {
    Json(svc.consumption.summary(q.from, q.to).await)
}

#[utoipa::path(
    delete, path = "/api/consumption/{id}", tag = "consumption",
    params(("id" = Uuid, Path, description = "Entry id")),
    responses((status = 204, description = "Deleted"), (status = 404, description = "Not Found"))
)]
pub async fn remove(State(svc): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, JsonApiError> {
    svc.consumption.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
