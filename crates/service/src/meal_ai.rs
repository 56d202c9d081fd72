//! Personalised meal generation.
//!
//! Each user carries preferences, a meal history and learned per-ingredient
//! scores in `[-1, 1]`. Generation scores every catalogue recipe of a meal type
//! against that state; nothing here is random, consecutive days rotate through
//! the best candidates instead.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use models::meal_plan::MealType;
use models::recipe::{Difficulty, Recipe};
use models::text::{names_match, normalize_name};

use crate::errors::ServiceError;
use crate::nutrition::round;
use crate::recipes::RecipeService;

const LEARNING_RATE: f64 = 0.1;
const MIN_SCORE: f64 = 0.3;
/// Meals needed before preferences are re-derived from history.
const LEARN_AFTER: usize = 5;
/// Upper bound on a recorded prep time, in minutes.
pub const MAX_PREP_MINUTES: u32 = 24 * 60;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserPreference {
    pub user_id: String,
    #[serde(default)]
    pub dietary_restrictions: Vec<String>,
    #[serde(default)]
    pub favorite_ingredients: Vec<String>,
    #[serde(default)]
    pub disliked_ingredients: Vec<String>,
    #[serde(default)]
    pub preferred_cuisines: Vec<String>,
    #[serde(default = "default_frequency")]
    pub meal_frequency: BTreeMap<MealType, u32>,
    #[serde(default = "default_skill")]
    pub cooking_skill: Difficulty,
    /// Max minutes per meal type.
    #[serde(default = "default_time_constraints")]
    pub time_constraints: BTreeMap<MealType, u32>,
    #[serde(default = "default_goals")]
    pub health_goals: Vec<String>,
    #[serde(default = "default_budget")]
    pub budget_range: String,
    #[serde(default = "default_family")]
    pub family_size: u32,
}

fn default_frequency() -> BTreeMap<MealType, u32> {
    BTreeMap::from([(MealType::Breakfast, 7), (MealType::Lunch, 7), (MealType::Dinner, 7), (MealType::Snack, 3)])
}
fn default_time_constraints() -> BTreeMap<MealType, u32> {
    BTreeMap::from([(MealType::Breakfast, 15), (MealType::Lunch, 30), (MealType::Dinner, 45), (MealType::Snack, 10)])
}
fn default_skill() -> Difficulty { Difficulty::Intermediate }
fn default_goals() -> Vec<String> { vec!["maintenance".into()] }
fn default_budget() -> String { "medium".into() }
fn default_family() -> u32 { 1 }

impl UserPreference {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            dietary_restrictions: Vec::new(),
            favorite_ingredients: Vec::new(),
            disliked_ingredients: Vec::new(),
            preferred_cuisines: Vec::new(),
            meal_frequency: default_frequency(),
            cooking_skill: default_skill(),
            time_constraints: default_time_constraints(),
            health_goals: default_goals(),
            budget_range: default_budget(),
            family_size: default_family(),
        }
    }

    fn max_time(&self, meal_type: MealType) -> u32 {
        self.time_constraints.get(&meal_type).copied().unwrap_or(60)
    }

    fn has_goal(&self, goal: &str) -> bool {
        self.health_goals.iter().any(|g| g.eq_ignore_ascii_case(goal))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MealRecord {
    pub user_id: String,
    pub meal_name: String,
    pub ingredients: Vec<String>,
    pub meal_type: MealType,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// 1..=5 stars.
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub prep_time: Option<u32>,
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub calories: Option<u32>,
    /// Finished the plate.
    #[serde(default)]
    pub enjoyed: Option<bool>,
}

impl MealRecord {
    fn validate(&self) -> Result<(), ServiceError> {
        if self.user_id.trim().is_empty() {
            return Err(ServiceError::invalid("user_id required"));
        }
        if self.meal_name.trim().is_empty() {
            return Err(ServiceError::invalid("meal_name required"));
        }
        if self.prep_time.is_some_and(|t| t > MAX_PREP_MINUTES) {
            return Err(ServiceError::invalid(format!("prep_time must be at most {MAX_PREP_MINUTES} minutes")));
        }
        validate_rating(self.rating)
    }

    /// Rating wins over `enjoyed`; `None` when neither says anything.
    fn preference_signal(&self) -> Option<f64> {
        match (self.rating, self.enjoyed) {
            (Some(r), _) => Some((r - 3.0) / 2.0),
            (None, Some(true)) => Some(1.0),
            (None, Some(false)) => Some(-0.5),
            (None, None) => None,
        }
    }
}

fn validate_rating(rating: Option<f64>) -> Result<(), ServiceError> {
    match rating {
        Some(r) if !(1.0..=5.0).contains(&r) => Err(ServiceError::invalid("rating must be between 1 and 5")),
        _ => Ok(()),
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct GeneratedMeal {
    pub meal_id: String,
    pub recipe_id: String,
    pub name: String,
    pub day: u32,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub meal_type: MealType,
    pub estimated_prep_time: u32,
    pub estimated_cost: f64,
    pub estimated_calories: u32,
    pub confidence_score: f64,
    pub reasoning: String,
    pub dietary_labels: Vec<String>,
    pub cuisine: String,
    pub difficulty: Difficulty,
}

#[derive(Clone, Debug, Serialize)]
pub struct GenerationSummary {
    pub total_meals: usize,
    pub avg_confidence: f64,
    pub meal_types: BTreeMap<MealType, usize>,
    pub avg_prep_time: f64,
    pub total_estimated_cost: f64,
    pub cuisines_variety: usize,
    pub waste_optimized: bool,
}

impl GenerationSummary {
    pub fn of(meals: &[GeneratedMeal], waste_optimized: bool) -> Self {
        let n = meals.len();
        let mut meal_types: BTreeMap<MealType, usize> = MealType::ALL.iter().map(|m| (*m, 0)).collect();
        for m in meals {
            *meal_types.entry(m.meal_type).or_default() += 1;
        }
        let avg = |total: f64| if n == 0 { 0.0 } else { round(total / n as f64, 2) };
        Self {
            total_meals: n,
            avg_confidence: avg(meals.iter().map(|m| m.confidence_score).sum()),
            meal_types,
            avg_prep_time: avg(meals.iter().map(|m| m.estimated_prep_time as f64).sum()),
            total_estimated_cost: round(meals.iter().map(|m| m.estimated_cost).sum(), 2),
            cuisines_variety: meals.iter().map(|m| m.cuisine.as_str()).collect::<HashSet<_>>().len(),
            waste_optimized,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ExpiringIngredient {
    pub name: String,
    #[serde(default)]
    pub days_left: i64,
    #[serde(default)]
    pub cost: Option<f64>,
}

#[derive(Clone, Debug, Serialize)]
pub struct WasteStats {
    pub expiring_ingredients_count: usize,
    pub ingredients_utilized: usize,
    pub utilization_rate: f64,
    pub meals_generated: usize,
    /// Sum of the used items' cost, 2.0 each when unknown.
    pub estimated_waste_prevented: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct WastePlan {
    pub meals: Vec<GeneratedMeal>,
    pub stats: WasteStats,
}

#[derive(Clone, Debug, Serialize)]
pub struct TimeAnalysis {
    pub average_time: f64,
    pub preferred_range: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct DietaryAdherence {
    pub adherence_rate: f64,
    pub violations: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct InsightReport {
    pub total_meals_tracked: usize,
    pub favorite_meal_type: Option<MealType>,
    pub average_rating: Option<f64>,
    pub most_used_ingredients: Vec<(String, usize)>,
    pub preferred_cuisines: Vec<String>,
    pub dietary_adherence: DietaryAdherence,
    pub cooking_time_analysis: BTreeMap<MealType, TimeAnalysis>,
    pub recommendations: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum MealInsights {
    NotEnoughData { message: String },
    Report(Box<InsightReport>),
}

#[derive(Clone, Debug, Default)]
struct UserState {
    prefs: Option<UserPreference>,
    history: Vec<MealRecord>,
    ingredient_scores: HashMap<String, f64>,
}

/// Ingredient key used for learned scores: `Sweet Potato` and `sweet_potato` agree.
fn key(name: &str) -> String {
    normalize_name(name).replace(' ', "_")
}

fn violation_terms(restriction: &str) -> &'static [&'static str] {
    match restriction.trim().to_ascii_lowercase().as_str() {
        "vegetarian" => &["meat", "chicken", "beef", "pork", "fish", "salmon", "bacon"],
        "vegan" => &["meat", "chicken", "beef", "pork", "fish", "salmon", "bacon", "dairy", "eggs", "milk", "cheese", "butter", "yogurt", "honey"],
        "gluten_free" | "gluten-free" => &["wheat", "bread", "pasta", "flour", "tortilla"],
        "dairy_free" | "dairy-free" => &["milk", "cheese", "butter", "yogurt", "feta", "parmesan"],
        _ => &[],
    }
}

fn violates(ingredients: &[String], restriction: &str) -> bool {
    violation_terms(restriction).iter().any(|term| ingredients.iter().any(|i| names_match(i, term)))
}

/// 个性化餐食推荐
#[derive(Clone)]
pub struct MealAiService {
    users: Arc<DashMap<String, UserState>>,
    recipes: RecipeService,
}

impl MealAiService {
    pub fn new(recipes: RecipeService) -> Self {
        Self { users: Arc::new(DashMap::new()), recipes }
    }

    pub fn set_preferences(&self, pref: UserPreference) -> Result<UserPreference, ServiceError> {
        if pref.user_id.trim().is_empty() {
            return Err(ServiceError::invalid("user_id required"));
        }
        if pref.family_size == 0 {
            return Err(ServiceError::invalid("family_size must be >= 1"));
        }
        self.users.entry(pref.user_id.clone()).or_default().prefs = Some(pref.clone());
        info!(event = "meal_preferences_updated", user = %pref.user_id);
        Ok(pref)
    }

    /// Stored preferences and whether they exist; defaults otherwise.
    pub fn preferences(&self, user_id: &str) -> (UserPreference, bool) {
        match self.users.get(user_id).and_then(|s| s.prefs.clone()) {
            Some(p) => (p, true),
            None => (UserPreference::for_user(user_id), false),
        }
    }

    pub fn record_meal(&self, mut record: MealRecord, today: NaiveDate) -> Result<MealRecord, ServiceError> {
        record.validate()?;
        record.date.get_or_insert(today);
        let mut state = self.users.entry(record.user_id.clone()).or_default();
        learn(&mut state, &record);
        state.history.push(record.clone());
        relearn_preferences(&mut state, &record.user_id);
        info!(event = "meal_recorded", user = %record.user_id, meal = %record.meal_name, history = state.history.len());
        Ok(record)
    }

    /// Validate the whole batch first, then learn from each record in order.
    pub fn record_batch(&self, records: Vec<MealRecord>, today: NaiveDate) -> Result<usize, ServiceError> {
        if records.is_empty() {
            return Err(ServiceError::invalid("meals must not be empty"));
        }
        for r in &records {
            r.validate()?;
        }
        let count = records.len();
        for record in records {
            self.record_meal(record, today)?;
        }
        info!(event = "meal_batch_recorded", count);
        Ok(count)
    }

    /// Quick picks for one meal type, best first.
    pub fn suggestions(
        &self,
        user_id: &str,
        meal_type: MealType,
        count: usize,
        today: NaiveDate,
    ) -> Result<Vec<GeneratedMeal>, ServiceError> {
        if !(1..=20).contains(&count) {
            return Err(ServiceError::invalid("count must be between 1 and 20"));
        }
        let (prefs, scores) = self.snapshot(user_id)?;
        let picks: Vec<GeneratedMeal> = self
            .rank(meal_type, &prefs, &scores, &[])
            .into_iter()
            .take(count)
            .enumerate()
            .map(|(i, (recipe, score))| {
                let mut meal = build_meal(user_id, recipe, score, 0, &prefs, &scores, &[], today);
                meal.meal_id.push_str(&format!("_{i}"));
                meal
            })
            .collect();
        debug!(event = "meal_suggestions", user = %user_id, meal_type = meal_type.as_str(), count = picks.len());
        Ok(picks)
    }

    /// Attach a rating to the latest history entry with this meal name and learn from it.
    pub fn rate_meal(&self, user_id: &str, meal_name: &str, rating: f64) -> Result<MealRecord, ServiceError> {
        validate_rating(Some(rating))?;
        let mut state = self.users.get_mut(user_id).ok_or_else(|| ServiceError::not_found("meal history"))?;
        let idx = state
            .history
            .iter()
            .rposition(|m| m.meal_name.eq_ignore_ascii_case(meal_name.trim()))
            .ok_or_else(|| ServiceError::not_found("meal"))?;
        state.history[idx].rating = Some(rating);
        let record = state.history[idx].clone();
        learn(&mut state, &record);
        relearn_preferences(&mut state, user_id);
        info!(event = "meal_rated", user = %user_id, meal = %record.meal_name, rating);
        Ok(record)
    }

    pub fn generate(
        &self,
        user_id: &str,
        days: u32,
        meals_per_day: u32,
        available: &[String],
        today: NaiveDate,
    ) -> Result<Vec<GeneratedMeal>, ServiceError> {
        if !(1..=31).contains(&days) {
            return Err(ServiceError::invalid("days must be between 1 and 31"));
        }
        if meals_per_day == 0 {
            return Err(ServiceError::invalid("meals_per_day must be >= 1"));
        }
        let (prefs, scores) = self.snapshot(user_id)?;
        let mut meal_types = vec![MealType::Breakfast, MealType::Lunch, MealType::Dinner];
        if meals_per_day > 3 {
            meal_types.push(MealType::Snack);
        }

        let mut meals = Vec::new();
        for meal_type in meal_types {
            let candidates = self.rank(meal_type, &prefs, &scores, available);
            if candidates.is_empty() {
                debug!(event = "meal_ai_no_candidates", user = %user_id, meal_type = meal_type.as_str());
                continue;
            }
            let window = candidates.len().min(3);
            for day in 0..days {
                let (recipe, score) = candidates[day as usize % window];
                meals.push(build_meal(user_id, recipe, score, day, &prefs, &scores, available, today));
            }
        }
        meals.sort_by_key(|m| (m.day, m.meal_type));
        info!(event = "meal_plan_generated", user = %user_id, days, meals = meals.len());
        Ok(meals)
    }

    /// Current preferences (defaults stored on first use) and learned scores.
    fn snapshot(&self, user_id: &str) -> Result<(UserPreference, HashMap<String, f64>), ServiceError> {
        if user_id.trim().is_empty() {
            return Err(ServiceError::invalid("user_id required"));
        }
        let mut state = self.users.entry(user_id.to_string()).or_default();
        let prefs = state.prefs.get_or_insert_with(|| UserPreference::for_user(user_id)).clone();
        Ok((prefs, state.ingredient_scores.clone()))
    }

    /// Catalogue recipes of one meal type above the score floor, best first.
    fn rank(
        &self,
        meal_type: MealType,
        prefs: &UserPreference,
        scores: &HashMap<String, f64>,
        available: &[String],
    ) -> Vec<(&Recipe, f64)> {
        let mut candidates: Vec<(&Recipe, f64)> = self
            .recipes
            .catalogue()
            .iter()
            .filter(|r| r.meal_type == meal_type)
            .map(|r| (r, score_recipe(r, prefs, scores, available)))
            .filter(|(_, s)| *s > MIN_SCORE)
            .collect();
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.name.cmp(&b.0.name)));
        candidates
    }

    /// Three days of meals built around what is about to expire.
    pub fn optimize_waste(
        &self,
        user_id: &str,
        expiring: &[ExpiringIngredient],
        today: NaiveDate,
    ) -> Result<WastePlan, ServiceError> {
        if expiring.is_empty() {
            return Err(ServiceError::invalid("expiring_ingredients must not be empty"));
        }
        let names: Vec<String> = expiring.iter().map(|e| e.name.clone()).collect();
        let mut used: HashSet<usize> = HashSet::new();
        let mut meals = Vec::new();
        for mut meal in self.generate(user_id, 3, 3, &names, today)? {
            let mut count = 0;
            let mut bonus = 0.0;
            for (idx, item) in expiring.iter().enumerate() {
                if !meal.ingredients.iter().any(|i| names_match(i, &item.name)) {
                    continue;
                }
                count += 1;
                used.insert(idx);
                bonus += match item.days_left {
                    d if d <= 2 => 0.5,
                    d if d <= 5 => 0.3,
                    _ => 0.0,
                };
            }
            if count > 0 {
                meal.reasoning.push_str(&format!(" | Uses {count} expiring ingredients"));
                meal.confidence_score = round(meal.confidence_score + bonus * 0.2, 3);
                meals.push(meal);
            }
        }
        let stats = WasteStats {
            expiring_ingredients_count: expiring.len(),
            ingredients_utilized: used.len(),
            utilization_rate: round(used.len() as f64 / expiring.len() as f64, 2),
            meals_generated: meals.len(),
            estimated_waste_prevented: round(used.iter().map(|i| expiring[*i].cost.unwrap_or(2.0)).sum(), 2),
        };
        info!(event = "meal_waste_optimized", user = %user_id, meals = meals.len(), utilized = stats.ingredients_utilized);
        Ok(WastePlan { meals, stats })
    }

    pub fn insights(&self, user_id: &str) -> MealInsights {
        let Some(state) = self.users.get(user_id).filter(|s| !s.history.is_empty()) else {
            return MealInsights::NotEnoughData { message: "Not enough data for insights".into() };
        };
        let history = &state.history;

        let mut type_counts: BTreeMap<MealType, usize> = BTreeMap::new();
        for m in history {
            *type_counts.entry(m.meal_type).or_default() += 1;
        }
        let favorite_meal_type = type_counts.iter().max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0))).map(|(t, _)| *t);

        let ratings: Vec<f64> = history.iter().filter_map(|m| m.rating).collect();
        let average_rating = (!ratings.is_empty()).then(|| round(ratings.iter().sum::<f64>() / ratings.len() as f64, 2));

        let mut ingredient_counts: HashMap<String, usize> = HashMap::new();
        for ing in history.iter().flat_map(|m| &m.ingredients) {
            *ingredient_counts.entry(key(ing)).or_default() += 1;
        }
        let mut most_used: Vec<(String, usize)> = ingredient_counts.into_iter().collect();
        most_used.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        most_used.truncate(10);

        let mut times: BTreeMap<MealType, Vec<u32>> = BTreeMap::new();
        for m in history {
            if let Some(t) = m.prep_time.filter(|t| *t > 0) {
                times.entry(m.meal_type).or_default().push(t);
            }
        }
        let cooking_time_analysis = times
            .into_iter()
            .filter_map(|(meal_type, ts)| {
                let (min, max) = (ts.iter().min()?, ts.iter().max()?);
                let average_time = round(ts.iter().map(|t| *t as f64).sum::<f64>() / ts.len() as f64, 1);
                Some((meal_type, TimeAnalysis { average_time, preferred_range: format!("{min}-{max} minutes") }))
            })
            .collect();

        let prefs = state.prefs.clone();
        MealInsights::Report(Box::new(InsightReport {
            total_meals_tracked: history.len(),
            favorite_meal_type,
            average_rating,
            most_used_ingredients: most_used,
            preferred_cuisines: prefs.as_ref().map(|p| p.preferred_cuisines.clone()).unwrap_or_default(),
            dietary_adherence: adherence(history, prefs.as_ref()),
            cooking_time_analysis,
            recommendations: recommendations(history),
        }))
    }
}

#[allow(clippy::too_many_arguments)]
fn build_meal(
    user_id: &str,
    recipe: &Recipe,
    score: f64,
    day: u32,
    prefs: &UserPreference,
    scores: &HashMap<String, f64>,
    available: &[String],
    today: NaiveDate,
) -> GeneratedMeal {
    GeneratedMeal {
        meal_id: format!("{user_id}_{}_{day}_{}", recipe.meal_type.as_str(), today.format("%Y%m%d")),
        recipe_id: recipe.id.clone(),
        name: recipe.name.clone(),
        day,
        ingredients: recipe.ingredients.clone(),
        instructions: recipe.instructions.clone(),
        meal_type: recipe.meal_type,
        estimated_prep_time: recipe.prep_time,
        estimated_cost: recipe.cost,
        estimated_calories: recipe.calories,
        confidence_score: round(score, 3),
        reasoning: reasoning(recipe, prefs, scores, available),
        dietary_labels: recipe.dietary_labels.clone(),
        cuisine: recipe.cuisine.clone(),
        difficulty: recipe.difficulty,
    }
}

fn learn(state: &mut UserState, record: &MealRecord) {
    let Some(signal) = record.preference_signal() else { return };
    for ingredient in &record.ingredients {
        let current = state.ingredient_scores.entry(key(ingredient)).or_insert(0.0);
        *current += LEARNING_RATE * (signal - *current);
    }
}

fn relearn_preferences(state: &mut UserState, user_id: &str) {
    let prefs = state.prefs.get_or_insert_with(|| UserPreference::for_user(user_id));
    let history = &state.history;
    if history.len() < LEARN_AFTER {
        return;
    }

    let mut rated: HashMap<String, Vec<f64>> = HashMap::new();
    for m in tail(history, 50) {
        if let Some(r) = m.rating.filter(|r| *r >= 4.0) {
            for ing in &m.ingredients {
                rated.entry(key(ing)).or_default().push(r);
            }
        }
    }
    let mut averaged: Vec<(String, f64)> =
        rated.into_iter().map(|(k, v)| (k, v.iter().sum::<f64>() / v.len() as f64)).collect();
    averaged.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    prefs.favorite_ingredients = averaged.into_iter().take(15).map(|(k, _)| k).collect();

    let mut frequency = BTreeMap::new();
    for m in tail(history, 30) {
        *frequency.entry(m.meal_type).or_insert(0u32) += 1;
    }
    prefs.meal_frequency = frequency;

    let mut times: BTreeMap<MealType, Vec<u32>> = BTreeMap::new();
    for m in tail(history, 20) {
        if let (Some(t), Some(r)) = (m.prep_time, m.rating) {
            if t > 0 && r >= 4.0 {
                times.entry(m.meal_type).or_default().push(t);
            }
        }
    }
    for (meal_type, ts) in times {
        // The mean never exceeds the largest sample, so it fits back into u32.
        let avg = ts.iter().map(|t| u64::from(*t)).sum::<u64>() / ts.len() as u64;
        prefs.time_constraints.insert(meal_type, u32::try_from(avg).unwrap_or(u32::MAX));
    }
}

fn tail<T>(items: &[T], n: usize) -> &[T] {
    &items[items.len().saturating_sub(n)..]
}

fn score_recipe(recipe: &Recipe, prefs: &UserPreference, scores: &HashMap<String, f64>, available: &[String]) -> f64 {
    let mut score = 0.5;

    if !recipe.ingredients.is_empty() {
        let mut ingredient_score = 0.0;
        for ing in &recipe.ingredients {
            let k = key(ing);
            ingredient_score += scores.get(&k).copied().unwrap_or(0.0);
            if prefs.favorite_ingredients.iter().any(|f| key(f) == k) {
                ingredient_score += 0.3;
            }
            if prefs.disliked_ingredients.iter().any(|d| names_match(d, ing)) {
                ingredient_score -= 0.5;
            }
            if available.iter().any(|a| names_match(a, ing)) {
                ingredient_score += 0.2;
            }
        }
        score += ingredient_score / recipe.ingredients.len() as f64;
    }

    if !prefs.dietary_restrictions.is_empty() {
        if prefs.dietary_restrictions.iter().any(|r| recipe.has_label(r)) {
            score += 0.3;
        } else {
            for restriction in &prefs.dietary_restrictions {
                if violates(&recipe.ingredients, restriction) {
                    score -= 0.8;
                }
            }
        }
    }

    score += if recipe.prep_time <= prefs.max_time(recipe.meal_type) { 0.2 } else { -0.3 };

    if prefs.preferred_cuisines.iter().any(|c| c.eq_ignore_ascii_case(&recipe.cuisine)) {
        score += 0.2;
    }

    score += if recipe.difficulty <= prefs.cooking_skill { 0.1 } else { -0.2 };

    if prefs.has_goal("weight_loss") {
        if recipe.calories < 400 {
            score += 0.2;
        }
    } else if prefs.has_goal("muscle_gain") && recipe.protein > 20 {
        score += 0.2;
    }

    score.clamp(0.0, 1.0)
}

fn reasoning(recipe: &Recipe, prefs: &UserPreference, scores: &HashMap<String, f64>, available: &[String]) -> String {
    let mut parts = Vec::new();
    let liked = recipe.ingredients.iter().any(|i| {
        let k = key(i);
        scores.get(&k).is_some_and(|s| *s > 0.0) || prefs.favorite_ingredients.iter().any(|f| key(f) == k)
    });
    if liked {
        parts.push("Contains your favorite ingredients");
    }
    if recipe.prep_time <= prefs.max_time(recipe.meal_type) {
        parts.push("Fits your time constraints");
    }
    if recipe.ingredients.iter().any(|i| available.iter().any(|a| names_match(a, i))) {
        parts.push("Uses ingredients you have available");
    }
    if prefs.dietary_restrictions.iter().any(|r| recipe.has_label(r)) {
        parts.push("Matches your dietary needs");
    }
    if prefs.preferred_cuisines.iter().any(|c| c.eq_ignore_ascii_case(&recipe.cuisine)) {
        parts.push("One of your preferred cuisines");
    }
    if parts.is_empty() {
        "Good nutritional balance".into()
    } else {
        parts.join("; ")
    }
}

fn adherence(history: &[MealRecord], prefs: Option<&UserPreference>) -> DietaryAdherence {
    let restrictions = match prefs {
        Some(p) if !p.dietary_restrictions.is_empty() => &p.dietary_restrictions,
        _ => return DietaryAdherence { adherence_rate: 100.0, violations: Vec::new() },
    };
    let violations: Vec<String> = history
        .iter()
        .filter(|m| restrictions.iter().any(|r| violates(&m.ingredients, r)))
        .map(|m| m.meal_name.clone())
        .collect();
    let rate = 100.0 * (history.len() - violations.len()) as f64 / history.len() as f64;
    DietaryAdherence { adherence_rate: round(rate, 1), violations }
}

fn recommendations(history: &[MealRecord]) -> Vec<String> {
    let mut out = Vec::new();
    if history.len() <= 10 {
        return out;
    }
    let recent = tail(history, 14);
    let count = |t: MealType| recent.iter().filter(|m| m.meal_type == t).count();
    if count(MealType::Breakfast) < 10 {
        out.push("Try to include breakfast more regularly for better nutrition balance".to_string());
    }
    if count(MealType::Snack) > 10 {
        out.push("Consider reducing snacks and focus on balanced main meals".to_string());
    }
    let unique: HashSet<String> = tail(history, 20).iter().flat_map(|m| m.ingredients.iter().map(|i| key(i))).collect();
    if unique.len() < 30 {
        out.push("Try to diversify your ingredients for better nutrition".to_string());
    }
    out
}
