//! Dashboard meal ideas: recipes ranked by how much of the pantry they use,
//! expiring items counting double.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use models::inventory::InventoryView;
use models::meal_plan::MealType;
use models::text::names_match;

use crate::inventory::{sort_by_expiry, InventoryService};
use crate::nutrition::round;
use crate::recipes::{match_recipe, RecipeService};

/// Items within this many days of expiry (or past it) count as expiring.
pub const EXPIRING_WINDOW_DAYS: i64 = 3;
pub const DEFAULT_LIMIT: usize = 5;
const MAX_LIMIT: usize = 20;

#[derive(Clone, Debug, Serialize)]
pub struct MealSuggestion {
    pub recipe_id: String,
    pub name: String,
    pub meal_type: MealType,
    pub prep_time: u32,
    pub score: f64,
    pub coverage: f64,
    /// Pantry item names this recipe would use up before they spoil.
    pub uses_expiring: Vec<String>,
    pub missing: Vec<String>,
    pub reason: String,
}

#[derive(Clone)]
pub struct SuggestionService {
    inventory: Arc<InventoryService>,
    recipes: RecipeService,
}

impl SuggestionService {
    pub fn new(inventory: Arc<InventoryService>, recipes: RecipeService) -> Self {
        Self { inventory, recipes }
    }

    pub async fn suggest(&self, limit: Option<usize>, today: NaiveDate) -> Vec<MealSuggestion> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let items = self.inventory.all().await;
        let pantry: Vec<String> = items.iter().map(|i| i.name.clone()).collect();
        let mut expiring: Vec<InventoryView> = items
            .into_iter()
            .map(|i| i.view(today))
            .filter(|v| v.days_until_expiry.is_some_and(|d| d <= EXPIRING_WINDOW_DAYS))
            .collect();
        sort_by_expiry(&mut expiring);

        let mut out: Vec<MealSuggestion> = self
            .recipes
            .catalogue()
            .iter()
            .filter_map(|recipe| {
                let m = match_recipe(recipe, &pantry);
                let uses_expiring: Vec<String> = expiring
                    .iter()
                    .filter(|v| recipe.ingredients.iter().any(|ing| names_match(ing, &v.item.name)))
                    .map(|v| v.item.name.clone())
                    .collect();
                let score = uses_expiring.len() as f64 * 2.0 + m.coverage;
                if score <= 0.0 {
                    return None;
                }
                let reason = reason(&uses_expiring, m.available.len(), recipe.ingredients.len());
                Some(MealSuggestion {
                    recipe_id: recipe.id.clone(),
                    name: recipe.name.clone(),
                    meal_type: recipe.meal_type,
                    prep_time: recipe.prep_time,
                    score: round(score, 2),
                    coverage: round(m.coverage, 2),
                    uses_expiring,
                    missing: m.missing,
                    reason,
                })
            })
            .collect();
        out.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.missing.len().cmp(&b.missing.len()))
                .then_with(|| a.name.cmp(&b.name))
        });
        out.truncate(limit);
        debug!(event = "suggestions_ranked", count = out.len(), expiring = expiring.len());
        out
    }
}

fn reason(uses_expiring: &[String], have: usize, total: usize) -> String {
    match (uses_expiring, have == total) {
        ([], true) => "You have every ingredient".to_string(),
        ([], false) => format!("You have {have} of {total} ingredients"),
        ([one], _) => format!("Uses {one} before it expires"),
        (many, _) => format!("Uses {} expiring items: {}", many.len(), many.join(", ")),
    }
}
