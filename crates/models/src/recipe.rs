use serde::{Deserialize, Serialize};

use crate::meal_plan::MealType;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" | "easy" => Some(Difficulty::Beginner),
            "intermediate" | "medium" => Some(Difficulty::Intermediate),
            "advanced" | "hard" => Some(Difficulty::Advanced),
            _ => None,
        }
    }
}

/// Catalogue entry. `ingredients` are normalised snake_case names so they can be
/// compared against inventory and preference keys.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub ingredients: Vec<String>,
    pub meal_type: MealType,
    /// Minutes.
    pub prep_time: u32,
    pub cost: f64,
    pub calories: u32,
    pub protein: u32,
    pub dietary_labels: Vec<String>,
    pub cuisine: String,
    pub difficulty: Difficulty,
    pub instructions: Vec<String>,
}

impl Recipe {
    pub fn has_label(&self, label: &str) -> bool {
        self.dietary_labels.iter().any(|l| l.eq_ignore_ascii_case(label))
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RecipeFilter {
    pub meal_type: Option<MealType>,
    pub cuisine: Option<String>,
    pub dietary: Option<String>,
    pub max_prep_time: Option<u32>,
    /// Hardest level the cook is comfortable with.
    pub max_difficulty: Option<Difficulty>,
    pub search: Option<String>,
}

impl RecipeFilter {
    pub fn matches(&self, r: &Recipe) -> bool {
        if self.meal_type.is_some_and(|m| m != r.meal_type) {
            return false;
        }
        if let Some(c) = self.cuisine.as_deref().filter(|c| !c.trim().is_empty()) {
            if !r.cuisine.eq_ignore_ascii_case(c.trim()) {
                return false;
            }
        }
        if let Some(d) = self.dietary.as_deref().filter(|d| !d.trim().is_empty()) {
            if !r.has_label(d.trim()) {
                return false;
            }
        }
        if self.max_prep_time.is_some_and(|max| r.prep_time > max) {
            return false;
        }
        if self.max_difficulty.is_some_and(|max| r.difficulty > max) {
            return false;
        }
        if let Some(q) = self.search.as_deref().map(crate::text::normalize_name).filter(|q| !q.is_empty()) {
            let in_name = r.name.to_lowercase().contains(&q);
            let in_ingredients = r.ingredients.iter().any(|i| crate::text::normalize_name(i).contains(&q));
            if !in_name && !in_ingredients {
                return false;
            }
        }
        true
    }
}
