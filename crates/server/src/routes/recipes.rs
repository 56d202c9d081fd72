use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tracing::info;

use models::meal_plan::MealType;
use models::recipe::{Difficulty, Recipe, RecipeFilter};
use service::recipes::{MissingAdded, RecipeMatch};

use crate::errors::JsonApiError;
use crate::extract::{Json, Path, Query};
use crate::routes::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/recipes", get(list))
        .route("/api/recipes/matches", get(matches))
        .route("/api/recipes/:id", get(get_recipe))
        .route("/api/recipes/:id/shopping", post(add_missing))
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecipeQuery {
    /// breakfast, lunch, dinner or snack
    pub meal_type: Option<String>,
    pub cuisine: Option<String>,
    /// Dietary label such as `vegetarian`.
    pub dietary: Option<String>,
    pub max_prep_time: Option<u32>,
    /// beginner/easy, intermediate/medium or advanced/hard; harder recipes are left out.
    pub max_difficulty: Option<String>,
    pub search: Option<String>,
}

impl TryFrom<RecipeQuery> for RecipeFilter {
    type Error = JsonApiError;

    fn try_from(q: RecipeQuery) -> Result<Self, Self::Error> {
        let meal_type = match q.meal_type.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(s) => Some(MealType::parse(s).ok_or_else(|| JsonApiError::bad_request(format!("unknown meal_type: {s}")))?),
            None => None,
        };
        let max_difficulty = match q.max_difficulty.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(s) => Some(Difficulty::parse(s).ok_or_else(|| JsonApiError::bad_request(format!("unknown difficulty: {s}")))?),
            None => None,
        };
        Ok(RecipeFilter {
            meal_type,
            cuisine: q.cuisine,
            dietary: q.dietary,
            max_prep_time: q.max_prep_time,
            max_difficulty,
            search: q.search,
        })
    }
}

#[utoipa::path(
    get, path = "/api/recipes", tag = "recipes",
    params(RecipeQuery),
    responses((status = 200, description = "OK"), (status = 400, description = "Validation Error"))
)]
pub async fn list(State(svc): State<AppState>, Query(q): Query<RecipeQuery>) -> Result<Json<Vec<Recipe>>, JsonApiError> {
    let filter = RecipeFilter::try_from(q)?;
    Ok(Json(svc.recipes.list(&filter)))
}

#[utoipa::path(
    get, path = "/api/recipes/{id}", tag = "recipes",
    params(("id" = String, Path, description = "Recipe slug")),
    responses((status = 200, description = "OK"), (status = 404, description = "Not Found"))
)]
pub async fn get_recipe(State(svc): State<AppState>, Path(id): Path<String>) -> Result<Json<Recipe>, JsonApiError> {
    Ok(Json(svc.recipes.get(&id)?))
}

#[utoipa::path(
    get, path = "/api/recipes/matches", tag = "recipes",
    responses((status = 200, description = "Recipes ranked by pantry coverage"))
)]
pub async fn matches(State(svc): State<AppState>) -> Json<Vec<RecipeMatch>> {
    Json(svc.recipes.match_inventory().await)
}

#[utoipa::path(
    post, path = "/api/recipes/{id}/shopping", tag = "recipes",
    params(("id" = String, Path, description = "Recipe slug")),
    responses((status = 200, description = "Missing ingredients added"), (status = 404, description = "Not Found"))
)]
pub async fn add_missing(State(svc): State<AppState>, Path(id): Path<String>) -> Result<Json<MissingAdded>, JsonApiError> {
    let added = svc.recipes.add_missing_to_shopping(&id).await?;
    info!(event = "recipe_missing_to_shopping", recipe = %id, count = added.added.len());
    Ok(Json(added))
}
