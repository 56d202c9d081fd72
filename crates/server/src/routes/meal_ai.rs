use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use models::meal_plan::MealType;
use service::meal_ai::{ExpiringIngredient, GeneratedMeal, GenerationSummary, MealRecord, UserPreference, WasteStats};

use crate::errors::JsonApiError;
use crate::extract::{Json, Path, Query};
use crate::routes::{today, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/ai/meals/preferences", post(set_preferences))
        .route("/api/ai/meals/preferences/:user", get(preferences))
        .route("/api/ai/meals/record", post(record))
        .route("/api/ai/meals/batch-learn", post(batch_learn))
        .route("/api/ai/meals/suggestions/:user", get(suggestions))
        .route("/api/ai/meals/generate", post(generate))
        .route("/api/ai/meals/optimize-waste", post(optimize_waste))
        .route("/api/ai/meals/rate", post(rate))
        .route("/api/ai/meals/insights/:user", get(insights))
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub user_id: String,
    #[serde(default = "default_days")]
    pub days: u32,
    #[serde(default = "default_meals_per_day")]
    pub meals_per_day: u32,
    #[serde(default)]
    pub available_ingredients: Vec<String>,
    /// Switch to the waste plan when expiring ingredients are also given.
    #[serde(default)]
    pub optimize_for_waste: bool,
    #[serde(default)]
    pub expiring_ingredients: Vec<ExpiringIngredient>,
}

fn default_days() -> u32 { 7 }
fn default_meals_per_day() -> u32 { 3 }

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SuggestionQuery {
    /// breakfast, lunch, dinner or snack; defaults to lunch.
    pub meal_type: Option<String>,
    /// 1 to 20; defaults to 5.
    pub count: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct WasteRequest {
    pub user_id: String,
    pub expiring_ingredients: Vec<ExpiringIngredient>,
}

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub user_id: String,
    pub meal_name: String,
    pub rating: f64,
}

#[derive(Debug, Serialize)]
pub struct GenerationResponse {
    pub success: bool,
    pub user_id: String,
    pub meals: Vec<GeneratedMeal>,
    pub summary: GenerationSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waste_reduction_stats: Option<WasteStats>,
}

#[utoipa::path(
    post, path = "/api/ai/meals/preferences", tag = "meal-ai",
    responses((status = 200, description = "Preferences stored"), (status = 400, description = "Validation Error"))
)]
pub async fn set_preferences(State(svc): State<AppState>, Json(pref): Json<UserPreference>) -> Result<Json<Value>, JsonApiError> {
    let pref = svc.meal_ai.set_preferences(pref)?;
    Ok(Json(json!({
        "success": true,
        "message": format!("Preferences updated for user {}", pref.user_id),
        "preferences": pref,
    })))
}

#[utoipa::path(
    get, path = "/api/ai/meals/preferences/{user}", tag = "meal-ai",
    params(("user" = String, Path, description = "User id")),
    responses((status = 200, description = "Stored preferences, or defaults with success=false"))
)]
pub async fn preferences(State(svc): State<AppState>, Path(user): Path<String>) -> Json<Value> {
    let (pref, stored) = svc.meal_ai.preferences(&user);
    Json(json!({ "success": stored, "user_id": user, "preferences": pref }))
}

#[utoipa::path(
    post, path = "/api/ai/meals/record", tag = "meal-ai",
    responses((status = 200, description = "Meal recorded"), (status = 400, description = "Validation Error"))
)]
pub async fn record(State(svc): State<AppState>, Json(rec): Json<MealRecord>) -> Result<Json<Value>, JsonApiError> {
    let rec = svc.meal_ai.record_meal(rec, today())?;
    Ok(Json(json!({
        "success": true,
        "message": format!("Meal '{}' recorded successfully", rec.meal_name),
        "meal": rec,
    })))
}

#[utoipa::path(
    post, path = "/api/ai/meals/batch-learn", tag = "meal-ai",
    responses((status = 200, description = "Every meal recorded"), (status = 400, description = "Empty batch or an invalid meal"))
)]
pub async fn batch_learn(State(svc): State<AppState>, Json(records): Json<Vec<MealRecord>>) -> Result<Json<Value>, JsonApiError> {
    let processed = svc.meal_ai.record_batch(records, today())?;
    Ok(Json(json!({
        "success": true,
        "message": format!("Learned from {processed} meals"),
        "processed_count": processed,
    })))
}

#[utoipa::path(
    get, path = "/api/ai/meals/suggestions/{user}", tag = "meal-ai",
    params(("user" = String, Path, description = "User id"), SuggestionQuery),
    responses((status = 200, description = "Top recipes for one meal type"), (status = 400, description = "Unknown meal type or bad count"))
)]
pub async fn suggestions(
    State(svc): State<AppState>,
    Path(user): Path<String>,
    Query(q): Query<SuggestionQuery>,
) -> Result<Json<Value>, JsonApiError> {
    let meal_type = match q.meal_type.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(s) => MealType::parse(s).ok_or_else(|| JsonApiError::bad_request(format!("unknown meal_type: {s}")))?,
        None => MealType::Lunch,
    };
    let meals = svc.meal_ai.suggestions(&user, meal_type, q.count.unwrap_or(5), today())?;
    Ok(Json(json!({
        "success": true,
        "user_id": user,
        "meal_type": meal_type,
        "count": meals.len(),
        "suggestions": meals,
    })))
}

#[utoipa::path(
    post, path = "/api/ai/meals/generate", tag = "meal-ai",
    responses((status = 200, description = "Personalised meal plan"), (status = 400, description = "Validation Error"))
)]
pub async fn generate(State(svc): State<AppState>, Json(req): Json<GenerateRequest>) -> Result<Json<GenerationResponse>, JsonApiError> {
    let today = today();
    if req.optimize_for_waste && !req.expiring_ingredients.is_empty() {
        let plan = svc.meal_ai.optimize_waste(&req.user_id, &req.expiring_ingredients, today)?;
        return Ok(Json(GenerationResponse {
            success: true,
            summary: GenerationSummary::of(&plan.meals, true),
            user_id: req.user_id,
            meals: plan.meals,
            waste_reduction_stats: Some(plan.stats),
        }));
    }
    let meals = svc
        .meal_ai
        .generate(&req.user_id, req.days, req.meals_per_day, &req.available_ingredients, today)?;
    Ok(Json(GenerationResponse {
        success: true,
        summary: GenerationSummary::of(&meals, false),
        user_id: req.user_id,
        meals,
        waste_reduction_stats: None,
    }))
}

#[utoipa::path(
    post, path = "/api/ai/meals/optimize-waste", tag = "meal-ai",
    responses((status = 200, description = "Meals that use expiring ingredients"), (status = 400, description = "Validation Error"))
)]
pub async fn optimize_waste(State(svc): State<AppState>, Json(req): Json<WasteRequest>) -> Result<Json<Value>, JsonApiError> {
    let plan = svc.meal_ai.optimize_waste(&req.user_id, &req.expiring_ingredients, today())?;
    Ok(Json(json!({
        "success": true,
        "user_id": req.user_id,
        "meals": plan.meals,
        "waste_reduction_stats": plan.stats,
    })))
}

#[utoipa::path(
    post, path = "/api/ai/meals/rate", tag = "meal-ai",
    responses(
        (status = 200, description = "Rating recorded"),
        (status = 400, description = "Rating out of range"),
        (status = 404, description = "No such meal in the user's history")
    )
)]
pub async fn rate(State(svc): State<AppState>, Json(req): Json<RateRequest>) -> Result<Json<Value>, JsonApiError> {
    let rec = svc.meal_ai.rate_meal(&req.user_id, &req.meal_name, req.rating)?;
    Ok(Json(json!({ "success": true, "message": "Meal rating recorded successfully", "meal": rec })))
}

#[utoipa::path(
    get, path = "/api/ai/meals/insights/{user}", tag = "meal-ai",
    params(("user" = String, Path, description = "User id")),
    responses((status = 200, description = "Eating pattern insights"))
)]
pub async fn insights(State(svc): State<AppState>, Path(user): Path<String>) -> Json<Value> {
    let insights = svc.meal_ai.insights(&user);
    Json(json!({ "success": true, "user_id": user, "insights": insights }))
}
