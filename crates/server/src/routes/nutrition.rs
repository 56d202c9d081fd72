use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use service::nutrition::{FoodSummary, MealAnalysis, MealIngredient, Nutrition, PortionUpdate, PortionValidation, PreciseNutrition};

use crate::errors::JsonApiError;
use crate::extract::Json;
use crate::routes::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/nutrition/calculate", post(calculate))
        .route("/api/nutrition/portion", post(portion))
        .route("/api/nutrition/meal", post(meal))
        .route("/api/nutrition/foods", get(foods))
}

#[derive(Debug, Deserialize)]
pub struct CalculateRequest {
    pub food_name: String,
    pub weight_g: f64,
    /// Include micronutrients, calorie breakdown and quality score.
    #[serde(default)]
    pub precise: bool,
}

#[derive(Debug, Deserialize)]
pub struct PortionRequest {
    pub food_name: String,
    #[serde(alias = "new_weight_g")]
    pub weight_g: f64,
    /// When present the response also reports the change from this weight.
    #[serde(default)]
    pub original_weight_g: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct MealRequest {
    pub ingredients: Vec<MealIngredient>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CalculateResponse {
    Basic(Nutrition),
    Precise(Box<PreciseNutrition>),
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PortionResponse {
    Checked(PortionValidation),
    Updated(Box<PortionUpdate>),
}

#[utoipa::path(
    post, path = "/api/nutrition/calculate", tag = "nutrition",
    request_body = crate::openapi::CalculateRequestDoc,
    responses((status = 200, description = "Nutrition for the given weight"), (status = 400, description = "Unknown food or bad weight"))
)]
pub async fn calculate(State(svc): State<AppState>, Json(req): Json<CalculateRequest>) -> Result<Json<CalculateResponse>, JsonApiError> {
    let out = if req.precise {
        CalculateResponse::Precise(Box::new(svc.nutrition.precise(&req.food_name, req.weight_g)?))
    } else {
        CalculateResponse::Basic(svc.nutrition.calculate(&req.food_name, req.weight_g)?)
    };
    Ok(Json(out))
}

#[utoipa::path(
    post, path = "/api/nutrition/portion", tag = "nutrition",
    responses((status = 200, description = "Portion check or recalculation"), (status = 400, description = "Unknown food or bad weight"))
)]
pub async fn portion(State(svc): State<AppState>, Json(req): Json<PortionRequest>) -> Result<Json<PortionResponse>, JsonApiError> {
    let out = match req.original_weight_g {
        Some(original) => PortionResponse::Updated(Box::new(svc.nutrition.update_portion(&req.food_name, req.weight_g, original)?)),
        None => PortionResponse::Checked(svc.nutrition.validate_portion(&req.food_name, req.weight_g)?),
    };
    Ok(Json(out))
}

#[utoipa::path(
    post, path = "/api/nutrition/meal", tag = "nutrition",
    responses((status = 200, description = "Portion estimates and meal totals"), (status = 400, description = "No ingredients"))
)]
pub async fn meal(State(svc): State<AppState>, Json(req): Json<MealRequest>) -> Result<Json<MealAnalysis>, JsonApiError> {
    if req.ingredients.is_empty() {
        return Err(JsonApiError::bad_request("ingredients required"));
    }
    Ok(Json(svc.nutrition.analyze_meal(&req.ingredients)))
}

#[utoipa::path(
    get, path = "/api/nutrition/foods", tag = "nutrition",
    responses((status = 200, description = "Foods in the nutrition table"))
)]
pub async fn foods(State(svc): State<AppState>) -> Json<Vec<FoodSummary>> {
    Json(svc.nutrition.foods())
}
