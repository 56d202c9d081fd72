use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use models::meal_plan::{DayPlan, MealPlan, MealPlanInput};

use crate::errors::JsonApiError;
use crate::extract::{Json, Path, Query};
use crate::routes::{today, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/meal-plans", get(list).post(create))
        .route("/api/meal-plans/week", get(week))
        .route("/api/meal-plans/:id", put(update).delete(delete))
}

/// Inclusive date range, either end optional.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RangeQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WeekQuery {
    /// First day of the week; today when omitted.
    pub start: Option<NaiveDate>,
}

#[utoipa::path(
    get, path = "/api/meal-plans", tag = "meal-plans",
    params(RangeQuery),
    responses((status = 200, description = "Plans by date then meal order"))
)]
pub async fn list(State(svc): State<AppState>, Query(q): Query<RangeQuery>) -> Json<Vec<MealPlan>> {
    Json(svc.meal_plans.list(q.from, q.to).await)
}

#[utoipa::path(
    post, path = "/api/meal-plans", tag = "meal-plans",
    request_body = crate::openapi::MealPlanInputDoc,
    responses((status = 201, description = "Created"), (status = 400, description = "Validation Error"))
)]
pub async fn create(
    State(svc): State<AppState>,
    Json(input): Json<MealPlanInput>,
) -> Result<(StatusCode, Json<MealPlan>), JsonApiError> {
    let plan = svc.meal_plans.create(input).await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

#[utoipa::path(
    get, path = "/api/meal-plans/week", tag = "meal-plans",
    params(WeekQuery),
    responses((status = 200, description = "Seven days, empty days included"))
)]
pub async fn week(State(svc): State<AppState>, Query(q): Query<WeekQuery>) -> Json<Vec<DayPlan>> {
    Json(svc.meal_plans.week(q.start.unwrap_or_else(today)).await)
}

#[utoipa::path(
    put, path = "/api/meal-plans/{id}", tag = "meal-plans",
    params(("id" = Uuid, Path, description = "Meal plan id")),
    request_body = crate::openapi::MealPlanInputDoc,
    responses(
        (status = 200, description = "Updated"),
        (status = 400, description = "Validation Error"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update(
    State(svc): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<MealPlanInput>,
) -> Result<Json<MealPlan>, JsonApiError> {
    Ok(Json(svc.meal_plans.update(id, input).await?))
}

#[utoipa::path(
    delete, path = "/api/meal-plans/{id}", tag = "meal-plans",
    params(("id" = Uuid, Path, description = "Meal plan id")),
    responses((status = 204, description = "Deleted"), (status = 404, description = "Not Found"))
)]
pub async fn delete(State(svc): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, JsonApiError> {
    svc.meal_plans.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
