//! Read-only views for the dashboard landing page.

use axum::{
    extract::State,
    routing::get,
    Router,
};
use serde::Deserialize;

use service::dashboard::DashboardStats;
use service::suggestions::MealSuggestion;

use crate::extract::{Json, Query};
use crate::routes::{today, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/ai/suggestions", get(suggestions))
        .route("/api/dashboard", get(dashboard))
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SuggestionQuery {
    /// 1..=20, default 5.
    pub limit: Option<usize>,
}

#[utoipa::path(
    get, path = "/api/ai/suggestions", tag = "dashboard",
    params(SuggestionQuery),
    responses((status = 200, description = "Recipes that use what is in the pantry"))
)]
pub async fn suggestions(State(svc): State<AppState>, Query(q): Query<SuggestionQuery>) -> Json<Vec<MealSuggestion>> {
    Json(svc.suggestions.suggest(q.limit, today()).await)
}

#[utoipa::path(
    get, path = "/api/dashboard", tag = "dashboard",
    responses((status = 200, description = "Counts for the landing page"))
)]
pub async fn dashboard(State(svc): State<AppState>) -> Json<DashboardStats> {
    Json(svc.dashboard.stats(today()).await)
}
