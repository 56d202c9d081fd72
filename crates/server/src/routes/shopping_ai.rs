use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use common::types::Envelope;
use service::shopping_ai::{self, Feedback, HistoryEntry, PantrySnapshot, Prediction, SmartList};

use crate::errors::JsonApiError;
use crate::extract::{Json, Path};
use crate::routes::{today, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/shopping/ai/predict", post(predict))
        .route("/api/shopping/ai/patterns", post(patterns))
        .route("/api/shopping/ai/insights/:user", get(insights))
        .route("/api/shopping/ai/feedback", post(feedback))
        .route("/api/shopping/ai/apply", post(apply))
        .route("/api/shopping/ai/smart-prioritize", post(smart_prioritize))
        .route("/api/shopping/ai/categories", get(categories))
        .route("/api/shopping/ai/seasonal/:month", get(seasonal))
}

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub user_id: String,
    /// Falls back to the live inventory when omitted.
    #[serde(default)]
    pub current_inventory: Option<Vec<PantrySnapshot>>,
    #[serde(default)]
    pub shopping_history: Vec<HistoryEntry>,
    #[serde(default)]
    pub budget_limit: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct PatternRequest {
    pub user_id: String,
    pub shopping_history: Vec<HistoryEntry>,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub user_id: String,
    pub item_name: String,
    pub feedback: Feedback,
}

#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    pub predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
pub struct PrioritizeRequest {
    pub user_id: String,
    pub shopping_list: Vec<Prediction>,
    #[serde(default)]
    pub budget_limit: Option<f64>,
}

#[utoipa::path(
    post, path = "/api/shopping/ai/predict", tag = "shopping-ai",
    responses((status = 200, description = "Smart shopping list"), (status = 400, description = "Validation Error"))
)]
pub async fn predict(
    State(svc): State<AppState>,
    Json(req): Json<PredictRequest>,
) -> Result<Json<Envelope<SmartList>>, JsonApiError> {
    let today = today();
    let pantry = match req.current_inventory {
        Some(items) => items,
        None => svc.shopping_ai.pantry_snapshot(today).await,
    };
    let list = svc.shopping_ai.predict(&req.user_id, &pantry, &req.shopping_history, req.budget_limit, today)?;
    Ok(Json(Envelope::ok(list)))
}

#[utoipa::path(
    post, path = "/api/shopping/ai/patterns", tag = "shopping-ai",
    responses((status = 200, description = "Stored purchase patterns"), (status = 400, description = "Validation Error"))
)]
pub async fn patterns(State(svc): State<AppState>, Json(req): Json<PatternRequest>) -> Result<Json<Value>, JsonApiError> {
    let pattern = svc.shopping_ai.analyze(&req.user_id, &req.shopping_history)?;
    Ok(Json(json!({
        "success": true,
        "user_id": req.user_id,
        "patterns": {
            "item_frequencies": pattern.item_frequencies,
            "category_preferences": pattern.category_preferences,
            "seasonal_patterns": pattern.seasonal_patterns,
            "budget_patterns": pattern.budget_patterns,
        },
        "analysis_date": today(),
    })))
}

#[utoipa::path(
    get, path = "/api/shopping/ai/insights/{user}", tag = "shopping-ai",
    params(("user" = String, Path, description = "User id")),
    responses((status = 200, description = "Shopping insights"))
)]
pub async fn insights(State(svc): State<AppState>, Path(user): Path<String>) -> Json<Value> {
    let insights = svc.shopping_ai.insights(&user, today());
    Json(json!({ "success": true, "user_id": user, "insights": insights }))
}

#[utoipa::path(
    post, path = "/api/shopping/ai/feedback", tag = "shopping-ai",
    responses((status = 200, description = "Frequency adjusted"), (status = 404, description = "Unknown user"))
)]
pub async fn feedback(State(svc): State<AppState>, Json(req): Json<FeedbackRequest>) -> Result<Json<Value>, JsonApiError> {
    let frequency = svc.shopping_ai.feedback(&req.user_id, &req.item_name, req.feedback)?;
    Ok(Json(json!({
        "success": true,
        "user_id": req.user_id,
        "item": req.item_name,
        "feedback": req.feedback,
        "frequency": frequency,
    })))
}

#[utoipa::path(
    post, path = "/api/shopping/ai/apply", tag = "shopping-ai",
    responses((status = 201, description = "Predictions added to the shopping list"), (status = 400, description = "Validation Error"))
)]
pub async fn apply(State(svc): State<AppState>, Json(req): Json<ApplyRequest>) -> Result<(StatusCode, Json<Value>), JsonApiError> {
    let added = svc.shopping_ai.apply(req.predictions).await?;
    info!(event = "predictions_applied", count = added.len());
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "count": added.len(), "items": added }))))
}

#[utoipa::path(
    post, path = "/api/shopping/ai/smart-prioritize", tag = "shopping-ai",
    responses((status = 200, description = "List ranked by priority, trimmed to the budget"), (status = 400, description = "Validation Error"))
)]
pub async fn smart_prioritize(State(svc): State<AppState>, Json(req): Json<PrioritizeRequest>) -> Result<Json<Value>, JsonApiError> {
    let budget_applied = req.budget_limit.is_some();
    let list = svc.shopping_ai.prioritize(&req.user_id, req.shopping_list, req.budget_limit)?;
    Ok(Json(json!({
        "success": true,
        "total_items": list.len(),
        "prioritized_list": list,
        "budget_applied": budget_applied,
    })))
}

#[utoipa::path(
    get, path = "/api/shopping/ai/categories", tag = "shopping-ai",
    responses((status = 200, description = "Predictor categories"))
)]
pub async fn categories(State(svc): State<AppState>) -> Json<Value> {
    Json(json!({ "success": true, "categories": svc.shopping_ai.categories() }))
}

#[utoipa::path(
    get, path = "/api/shopping/ai/seasonal/{month}", tag = "shopping-ai",
    params(("month" = String, Path, description = "Month name or number 1-12")),
    responses((status = 200, description = "Seasonal ideas"), (status = 400, description = "Unknown month"))
)]
pub async fn seasonal(Path(month): Path<String>) -> Result<Json<Value>, JsonApiError> {
    let ideas = shopping_ai::seasonal(&month).ok_or_else(|| JsonApiError::bad_request(format!("unknown month: {month}")))?;
    Ok(Json(json!({ "success": true, "month": month, "seasonal_recommendations": ideas })))
}
