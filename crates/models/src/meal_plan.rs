use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub const ALL: [MealType; 4] = [MealType::Breakfast, MealType::Lunch, MealType::Dinner, MealType::Snack];

    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        MealType::ALL.into_iter().find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MealPlan {
    pub id: Uuid,
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub title: String,
    pub recipe_id: Option<String>,
    pub servings: u32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MealPlanInput {
    pub date: NaiveDate,
    pub meal_type: MealType,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub recipe_id: Option<String>,
    #[serde(default = "one")]
    pub servings: u32,
    #[serde(default)]
    pub notes: Option<String>,
}

fn one() -> u32 { 1 }

impl MealPlanInput {
    /// Title may be omitted only when a recipe supplies it.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.servings == 0 {
            return Err(ModelError::invalid("servings must be >= 1"));
        }
        let has_title = self.title.as_deref().is_some_and(|t| !t.trim().is_empty());
        let has_recipe = self.recipe_id.as_deref().is_some_and(|r| !r.trim().is_empty());
        if !has_title && !has_recipe {
            return Err(ModelError::invalid("title or recipe_id required"));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DayPlan {
    pub date: NaiveDate,
    pub meals: Vec<MealPlan>,
}
