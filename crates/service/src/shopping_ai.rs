//! Shopping-list predictions from purchase history.
//!
//! `analyze` turns a user's history into a [`UserPattern`]; `predict` combines
//! four heuristics (frequency, season, category balance, replenishment) over
//! that pattern and the current inventory, then ranks and budgets the result.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use models::category::Category;
use models::shopping::{Priority, ShoppingInput};
use models::text::normalize_name;

use crate::errors::ServiceError;
use crate::inventory::InventoryService;
use crate::nutrition::round;
use crate::shopping::{AddOutcome, ShoppingService};

/// Categories the predictor reasons in; coarser than the inventory's.
pub const CATEGORIES: [&str; 10] = [
    "fruits", "vegetables", "dairy", "meat", "grains", "snacks", "beverages", "household", "personal_care", "other",
];

/// Predictions at or above this score go on the list as high priority.
pub const HIGH_PRIORITY_SCORE: f64 = 0.7;

#[derive(Clone, Debug, Deserialize)]
pub struct HistoryItem {
    pub name: String,
    #[serde(default = "other")]
    pub category: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default = "one")]
    pub quantity: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct HistoryEntry {
    pub date: NaiveDate,
    pub items: Vec<HistoryItem>,
    #[serde(default)]
    pub total_cost: f64,
    #[serde(default)]
    pub store: Option<String>,
}

/// One pantry line as the predictor sees it.
#[derive(Clone, Debug, Deserialize)]
pub struct PantrySnapshot {
    pub name: String,
    pub quantity: f64,
    #[serde(default = "other")]
    pub category: String,
    #[serde(default, alias = "daysLeft")]
    pub days_left: Option<i64>,
    #[serde(default)]
    pub price: Option<f64>,
}

fn other() -> String { "other".into() }
fn one() -> u32 { 1 }

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feedback {
    Positive,
    Negative,
    Neutral,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct UserPattern {
    pub user_id: String,
    pub item_frequencies: BTreeMap<String, u32>,
    /// Last category each item was bought under.
    pub item_categories: BTreeMap<String, String>,
    /// Share of purchased items per category, sums to 1.
    pub category_preferences: BTreeMap<String, f64>,
    /// Month name -> category -> purchases.
    pub seasonal_patterns: BTreeMap<String, BTreeMap<String, u32>>,
    /// Item -> weekdays bought (0 = Monday).
    pub time_patterns: BTreeMap<String, Vec<u32>>,
    /// `YYYY-MM` -> average trip cost.
    pub budget_patterns: BTreeMap<String, f64>,
}

impl UserPattern {
    fn frequency(&self, name: &str) -> u32 {
        self.item_frequencies.get(name).copied().unwrap_or(0)
    }

    fn top_categories(&self, n: usize) -> Vec<(String, f64)> {
        let mut cats: Vec<(String, f64)> = self.category_preferences.iter().map(|(k, v)| (k.clone(), *v)).collect();
        cats.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        cats.truncate(n);
        cats
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub name: String,
    #[serde(default = "other")]
    pub category: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default = "one")]
    pub quantity: u32,
    #[serde(default = "piece")]
    pub unit: String,
    #[serde(default)]
    pub priority_score: f64,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub reason: String,
}

fn piece() -> String { "piece".into() }

impl Prediction {
    fn new(name: &str, category: &str, confidence: f64, reason: String) -> Self {
        Self {
            name: name.to_string(),
            category: category.to_string(),
            brand: None,
            price: None,
            quantity: 1,
            unit: piece(),
            priority_score: 0.0,
            confidence,
            reason,
        }
    }

    fn estimated_cost(&self) -> f64 {
        self.price.unwrap_or_else(|| category_cost(&self.category) * self.quantity as f64)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct PredictionInsights {
    pub prediction_confidence: f64,
    pub categories_predicted: usize,
    pub seasonal_items: usize,
    pub frequent_items: usize,
    pub smart_suggestions: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct PatternDigest {
    pub top_categories: Vec<String>,
    pub shopping_frequency: usize,
    pub predicted_budget: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct SmartList {
    pub shopping_list: Vec<Prediction>,
    pub total_items: usize,
    pub insights: PredictionInsights,
    pub user_patterns: PatternDigest,
}

#[derive(Clone, Debug, Serialize)]
pub struct ShoppingInsightReport {
    pub top_items: Vec<(String, u32)>,
    pub favorite_categories: Vec<(String, f64)>,
    pub seasonal_trends: BTreeMap<String, BTreeMap<String, u32>>,
    pub shopping_recommendations: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum ShoppingInsights {
    NoHistory { insights: String },
    Report(ShoppingInsightReport),
}

/// Per-category cost estimate for one unit.
fn category_cost(category: &str) -> f64 {
    match category {
        "fruits" => 3.0,
        "vegetables" => 2.5,
        "dairy" => 4.0,
        "meat" => 8.0,
        "grains" => 3.5,
        "other" => 2.0,
        _ => 3.0,
    }
}

fn keyword_category(name: &str) -> &'static str {
    const KEYWORDS: [(&str, &[&str]); 5] = [
        ("fruits", &["apple", "banana", "orange", "grape", "strawberry"]),
        ("vegetables", &["tomato", "onion", "carrot", "lettuce", "potato"]),
        ("dairy", &["milk", "cheese", "yogurt", "butter", "cream"]),
        ("meat", &["chicken", "beef", "pork", "fish", "turkey"]),
        ("grains", &["bread", "rice", "pasta", "oats", "cereal"]),
    ];
    let lower = name.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
        .map(|(cat, _)| *cat)
        .unwrap_or("other")
}

fn seasonal_category_items(category: &str, month: &str) -> &'static [&'static str] {
    match (category, month) {
        ("fruits", "January") => &["apple", "orange", "grapefruit"],
        ("fruits", "April") => &["strawberry", "apricot"],
        ("fruits", "July") => &["watermelon", "peach", "berries"],
        ("fruits", "October") => &["pumpkin", "apple", "pear"],
        ("vegetables", "January") => &["cabbage", "carrot", "onion"],
        ("vegetables", "April") => &["asparagus", "lettuce"],
        ("vegetables", "July") => &["tomato", "cucumber", "corn"],
        ("vegetables", "October") => &["pumpkin", "squash", "potato"],
        _ => &[],
    }
}

fn common_category_items(category: &str) -> &'static [&'static str] {
    match category {
        "fruits" => &["banana", "apple", "orange"],
        "vegetables" => &["tomato", "onion", "potato"],
        "dairy" => &["milk", "cheese", "yogurt"],
        "meat" => &["chicken", "ground beef"],
        "grains" => &["bread", "rice", "pasta"],
        "other" => &["salt", "pepper", "oil"],
        _ => &[],
    }
}

fn month_name(month: u32) -> &'static str {
    const MONTHS: [&str; 12] = [
        "January", "February", "March", "April", "May", "June",
        "July", "August", "September", "October", "November", "December",
    ];
    MONTHS[(month.clamp(1, 12) - 1) as usize]
}

/// Seasonal shopping ideas for a month given by name (`july`) or number (`7`).
pub fn seasonal(month: &str) -> Option<Vec<&'static str>> {
    let m = month.trim().to_lowercase();
    let name = match m.parse::<u32>() {
        Ok(n @ 1..=12) => month_name(n).to_lowercase(),
        Ok(_) => return None,
        Err(_) => m,
    };
    let ideas: &[&str] = match name.as_str() {
        "january" => &["citrus fruits", "winter vegetables", "hearty soups"],
        "april" => &["spring vegetables", "fresh herbs", "light salads"],
        "july" => &["summer fruits", "grilling items", "cold beverages"],
        "october" => &["pumpkins", "apples", "warm spices"],
        "february" | "march" | "may" | "june" | "august" | "september" | "november" | "december" => &[],
        _ => return None,
    };
    Some(ideas.to_vec())
}

/// Map a predictor category onto the shopping list's categories.
fn list_category(category: &str) -> Option<Category> {
    match category {
        "household" | "personal_care" => Some(Category::Other),
        c => Category::parse(c),
    }
}

/// 智能购物清单
#[derive(Clone)]
pub struct ShoppingAiService {
    patterns: Arc<DashMap<String, UserPattern>>,
    inventory: Arc<InventoryService>,
    shopping: Arc<ShoppingService>,
}

impl ShoppingAiService {
    pub fn new(inventory: Arc<InventoryService>, shopping: Arc<ShoppingService>) -> Self {
        Self { patterns: Arc::new(DashMap::new()), inventory, shopping }
    }

    pub fn categories(&self) -> &'static [&'static str] {
        &CATEGORIES
    }

    pub fn pattern(&self, user_id: &str) -> Option<UserPattern> {
        self.patterns.get(user_id).map(|p| p.clone())
    }

    pub fn analyze(&self, user_id: &str, history: &[HistoryEntry]) -> Result<UserPattern, ServiceError> {
        if user_id.trim().is_empty() {
            return Err(ServiceError::invalid("user_id required"));
        }
        let mut pattern = UserPattern { user_id: user_id.to_string(), ..Default::default() };
        let mut category_counts: BTreeMap<String, u32> = BTreeMap::new();
        let mut budgets: BTreeMap<String, Vec<f64>> = BTreeMap::new();

        for entry in history {
            let month = month_name(entry.date.month()).to_string();
            for item in &entry.items {
                let name = normalize_name(&item.name);
                if name.is_empty() {
                    continue;
                }
                let category = normalize_name(&item.category).replace(' ', "_");
                *pattern.item_frequencies.entry(name.clone()).or_default() += 1;
                *category_counts.entry(category.clone()).or_default() += 1;
                *pattern.seasonal_patterns.entry(month.clone()).or_default().entry(category.clone()).or_default() += 1;
                pattern.time_patterns.entry(name.clone()).or_default().push(entry.date.weekday().num_days_from_monday());
                pattern.item_categories.insert(name, category);
            }
            budgets.entry(entry.date.format("%Y-%m").to_string()).or_default().push(entry.total_cost);
        }

        let total: u32 = category_counts.values().sum();
        if total > 0 {
            pattern.category_preferences =
                category_counts.into_iter().map(|(c, n)| (c, n as f64 / total as f64)).collect();
        }
        pattern.budget_patterns = budgets
            .into_iter()
            .map(|(m, costs)| (m, round(costs.iter().sum::<f64>() / costs.len() as f64, 2)))
            .collect();

        self.patterns.insert(user_id.to_string(), pattern.clone());
        info!(event = "shopping_pattern_analyzed", user = %user_id, trips = history.len(), items = pattern.item_frequencies.len());
        Ok(pattern)
    }

    /// Pantry snapshot from live inventory, used when the caller sends none.
    pub async fn pantry_snapshot(&self, today: NaiveDate) -> Vec<PantrySnapshot> {
        self.inventory
            .all()
            .await
            .into_iter()
            .map(|i| PantrySnapshot {
                category: i.category.as_str().to_string(),
                days_left: i.days_until_expiry(today),
                name: i.name,
                quantity: i.quantity,
                price: i.price,
            })
            .collect()
    }

    pub fn predict(
        &self,
        user_id: &str,
        pantry: &[PantrySnapshot],
        history: &[HistoryEntry],
        budget: Option<f64>,
        today: NaiveDate,
    ) -> Result<SmartList, ServiceError> {
        if budget.is_some_and(|b| !b.is_finite() || b <= 0.0) {
            return Err(ServiceError::invalid("budget_limit must be > 0"));
        }
        let pattern = self.analyze(user_id, history)?;
        let month = month_name(today.month());
        let held: HashSet<String> = pantry.iter().map(|p| normalize_name(&p.name)).collect();

        let mut raw = Vec::new();
        predict_by_frequency(&pattern, &held, &mut raw);
        predict_seasonal(&pattern, &held, month, &mut raw);
        predict_by_category(&pattern, pantry, &held, &mut raw);
        predict_replenishment(&pattern, pantry, &mut raw);

        let mut items = dedupe(raw);
        for item in &mut items {
            item.priority_score = priority_score(item, &pattern);
        }
        items.sort_by(|a, b| b.priority_score.total_cmp(&a.priority_score).then_with(|| a.name.cmp(&b.name)));
        if let Some(limit) = budget {
            items = apply_budget(items, limit);
        }

        let n = items.len();
        let insights = PredictionInsights {
            prediction_confidence: if n == 0 { 0.0 } else { round(items.iter().map(|i| i.confidence).sum::<f64>() / n as f64, 2) },
            categories_predicted: items.iter().map(|i| i.category.as_str()).collect::<HashSet<_>>().len(),
            seasonal_items: items.iter().filter(|i| i.reason.to_lowercase().contains("seasonal")).count(),
            frequent_items: items.iter().filter(|i| i.reason.to_lowercase().contains("frequent")).count(),
            smart_suggestions: format!("Based on your shopping history, we found {n} items you might need."),
        };
        let user_patterns = PatternDigest {
            top_categories: pattern.top_categories(3).into_iter().map(|(c, _)| c).collect(),
            shopping_frequency: history.len(),
            predicted_budget: round(items.iter().map(|i| i.price.unwrap_or(3.0)).sum(), 2),
        };
        for item in &mut items {
            item.priority_score = round(item.priority_score, 2);
            item.confidence = round(item.confidence, 2);
        }
        info!(event = "shopping_predicted", user = %user_id, items = n, budget = ?budget);
        Ok(SmartList { total_items: n, shopping_list: items, insights, user_patterns })
    }

    /// Nudge an item's frequency; returns the new count.
    pub fn feedback(&self, user_id: &str, item_name: &str, feedback: Feedback) -> Result<u32, ServiceError> {
        let mut pattern = self.patterns.get_mut(user_id).ok_or_else(|| ServiceError::not_found("shopping pattern"))?;
        let name = normalize_name(item_name);
        if name.is_empty() {
            return Err(ServiceError::invalid("item_name required"));
        }
        let current = pattern.frequency(&name);
        let updated = match feedback {
            Feedback::Positive => current + 1,
            Feedback::Negative => current.saturating_sub(1),
            Feedback::Neutral => current,
        };
        if feedback != Feedback::Neutral {
            pattern.item_frequencies.insert(name.clone(), updated);
        }
        info!(event = "shopping_feedback", user = %user_id, item = %name, feedback = ?feedback, frequency = updated);
        Ok(updated)
    }

    pub fn insights(&self, user_id: &str, today: NaiveDate) -> ShoppingInsights {
        let Some(pattern) = self.patterns.get(user_id) else {
            return ShoppingInsights::NoHistory { insights: "No shopping history available".into() };
        };
        let mut top_items: Vec<(String, u32)> = pattern.item_frequencies.iter().map(|(k, v)| (k.clone(), *v)).collect();
        top_items.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_items.truncate(5);

        let favorite_categories = pattern.top_categories(3);
        let mut recommendations = Vec::new();
        if let Some((top, _)) = favorite_categories.first() {
            recommendations.push(format!("You frequently shop in {top} category"));
        }
        let month = month_name(today.month());
        if pattern.seasonal_patterns.contains_key(month) {
            recommendations.push(format!("Consider seasonal {month} items"));
        }
        ShoppingInsights::Report(ShoppingInsightReport {
            top_items,
            favorite_categories,
            seasonal_trends: pattern.seasonal_patterns.clone(),
            shopping_recommendations: recommendations,
        })
    }

    /// Rank a caller-supplied list by the same priority score `predict` uses,
    /// then trim it to the budget. Users without a stored pattern are scored
    /// against a neutral one.
    pub fn prioritize(&self, user_id: &str, items: Vec<Prediction>, budget: Option<f64>) -> Result<Vec<Prediction>, ServiceError> {
        if user_id.trim().is_empty() {
            return Err(ServiceError::invalid("user_id required"));
        }
        if budget.is_some_and(|b| !b.is_finite() || b <= 0.0) {
            return Err(ServiceError::invalid("budget_limit must be > 0"));
        }
        if items.iter().any(|i| normalize_name(&i.name).is_empty()) {
            return Err(ServiceError::invalid("item name required"));
        }
        let pattern = self.pattern(user_id).unwrap_or_else(|| UserPattern {
            user_id: user_id.to_string(),
            category_preferences: BTreeMap::from([("other".to_string(), 1.0)]),
            ..Default::default()
        });
        let mut items: Vec<Prediction> = items
            .into_iter()
            .map(|mut i| {
                i.name = normalize_name(&i.name);
                if i.reason.is_empty() {
                    i.reason = "User added".into();
                }
                i.priority_score = priority_score(&i, &pattern);
                i
            })
            .collect();
        items.sort_by(|a, b| b.priority_score.total_cmp(&a.priority_score).then_with(|| a.name.cmp(&b.name)));
        if let Some(limit) = budget {
            items = apply_budget(items, limit);
        }
        for item in &mut items {
            item.priority_score = round(item.priority_score, 2);
        }
        info!(event = "shopping_prioritized", user = %user_id, items = items.len(), budget = ?budget);
        Ok(items)
    }

    /// Put chosen predictions on the shopping list.
    pub async fn apply(&self, predictions: Vec<Prediction>) -> Result<Vec<AddOutcome>, ServiceError> {
        if predictions.is_empty() {
            return Err(ServiceError::invalid("no predictions to apply"));
        }
        let mut added = Vec::with_capacity(predictions.len());
        for p in predictions {
            let priority = if p.priority_score >= HIGH_PRIORITY_SCORE { Priority::High } else { Priority::Normal };
            let input = ShoppingInput {
                unit: Some(p.unit.clone()),
                category: list_category(&p.category),
                priority: Some(priority),
                note: (!p.reason.is_empty()).then(|| p.reason.clone()),
                ..ShoppingInput::named(p.name.clone(), p.quantity.max(1) as f64)
            };
            added.push(self.shopping.add(input).await?);
        }
        info!(event = "shopping_predictions_applied", count = added.len());
        Ok(added)
    }
}

fn predict_by_frequency(pattern: &UserPattern, held: &HashSet<String>, out: &mut Vec<Prediction>) {
    for (name, &freq) in &pattern.item_frequencies {
        if freq > 2 && !held.contains(name) {
            let category = match pattern.item_categories.get(name).map(String::as_str) {
                Some(c) if c != "other" => c,
                _ => keyword_category(name),
            };
            let confidence = (freq as f64 / 10.0).min(0.9);
            out.push(Prediction::new(name, category, confidence, format!("Frequently purchased ({freq} times)")));
        }
    }
}

fn predict_seasonal(pattern: &UserPattern, held: &HashSet<String>, month: &str, out: &mut Vec<Prediction>) {
    let Some(cats) = pattern.seasonal_patterns.get(month) else { return };
    for (category, &count) in cats {
        if count <= 1 {
            continue;
        }
        for item in seasonal_category_items(category, month) {
            if !held.contains(*item) {
                out.push(Prediction::new(item, category, 0.7, format!("Seasonal trend for {month}")));
            }
        }
    }
}

fn predict_by_category(pattern: &UserPattern, pantry: &[PantrySnapshot], held: &HashSet<String>, out: &mut Vec<Prediction>) {
    let mut current: HashMap<&str, usize> = HashMap::new();
    for p in pantry {
        *current.entry(p.category.as_str()).or_default() += 1;
    }
    let total = pantry.len().max(1) as f64;
    for (category, &preference) in &pattern.category_preferences {
        let ratio = current.get(category.as_str()).copied().unwrap_or(0) as f64 / total;
        if ratio >= preference * 0.5 {
            continue;
        }
        for item in common_category_items(category).iter().take(2) {
            if !held.contains(*item) {
                out.push(Prediction::new(item, category, 0.6, format!("Category preference: {category}")));
            }
        }
    }
}

fn predict_replenishment(pattern: &UserPattern, pantry: &[PantrySnapshot], out: &mut Vec<Prediction>) {
    for p in pantry {
        let name = normalize_name(&p.name);
        let low = p.quantity <= 2.0 || p.days_left.unwrap_or(999) <= 3;
        let freq = pattern.frequency(&name);
        if low && freq > 1 {
            let mut prediction = Prediction::new(&name, &p.category, 0.85, "Running low (frequent purchase)".into());
            prediction.quantity = freq / 2 + 1;
            prediction.price = p.price;
            out.push(prediction);
        }
    }
}

/// One prediction per name, highest confidence wins, first seen on ties.
fn dedupe(raw: Vec<Prediction>) -> Vec<Prediction> {
    let mut order: Vec<String> = Vec::new();
    let mut best: HashMap<String, Prediction> = HashMap::new();
    for p in raw {
        match best.get(&p.name) {
            Some(existing) if existing.confidence >= p.confidence => {}
            Some(_) => {
                best.insert(p.name.clone(), p);
            }
            None => {
                order.push(p.name.clone());
                best.insert(p.name.clone(), p);
            }
        }
    }
    order.into_iter().filter_map(|n| best.remove(&n)).collect()
}

fn priority_score(item: &Prediction, pattern: &UserPattern) -> f64 {
    let frequency = (pattern.frequency(&item.name) as f64 / 5.0).min(1.0);
    let category = pattern.category_preferences.get(&item.category).copied().unwrap_or(0.1);
    let reason = item.reason.to_lowercase();
    let urgency = if ["running low", "expiring", "out of"].iter().any(|k| reason.contains(k)) { 0.1 } else { 0.0 };
    (item.confidence * 0.4 + frequency * 0.3 + category * 0.2 + urgency).min(1.0)
}

/// Greedy fill in priority order; one extra item may overshoot while spend is under 90%.
fn apply_budget(items: Vec<Prediction>, limit: f64) -> Vec<Prediction> {
    let mut total = 0.0;
    let mut kept = Vec::new();
    for item in items {
        let cost = item.estimated_cost();
        if total + cost <= limit {
            total += cost;
            kept.push(item);
        } else if total < limit * 0.9 {
            kept.push(item);
            break;
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> ShoppingAiService {
        let inventory = Arc::new(InventoryService::new());
        let shopping = Arc::new(ShoppingService::new(inventory.clone()));
        ShoppingAiService::new(inventory, shopping)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn trip(d: NaiveDate, items: &[(&str, &str)], cost: f64) -> HistoryEntry {
        HistoryEntry {
            date: d,
            items: items
                .iter()
                .map(|(n, c)| HistoryItem { name: n.to_string(), category: c.to_string(), brand: None, price: None, quantity: 1 })
                .collect(),
            total_cost: cost,
            store: None,
        }
    }

    fn snapshot(name: &str, quantity: f64, category: &str, days_left: Option<i64>) -> PantrySnapshot {
        PantrySnapshot { name: name.into(), quantity, category: category.into(), days_left, price: None }
    }

    fn history() -> Vec<HistoryEntry> {
        vec![
            trip(date(2025, 9, 1), &[("Milk", "dairy"), ("Bread", "grains"), ("Chicken", "meat")], 25.5),
            trip(date(2025, 9, 15), &[("milk", "dairy"), ("Apple", "fruits"), ("Yogurt", "dairy")], 18.75),
            trip(date(2025, 9, 22), &[("milk", "dairy"), ("Bread", "grains")], 10.0),
        ]
    }

    #[test]
    fn analyze_builds_pattern() {
        let svc = service();
        let p = svc.analyze("u", &history()).unwrap();
        assert_eq!(p.item_frequencies["milk"], 3);
        assert_eq!(p.item_frequencies["bread"], 2);
        assert!((p.category_preferences["dairy"] - 0.5).abs() < 1e-9);
        assert_eq!(p.seasonal_patterns["September"]["dairy"], 4);
        assert_eq!(p.time_patterns["milk"], vec![0, 0, 0]);
        assert_eq!(p.budget_patterns["2025-09"], 18.08);
        assert!(svc.pattern("u").is_some());
        assert!(svc.analyze(" ", &[]).is_err());
    }

    #[test]
    fn predict_combines_heuristics() {
        let svc = service();
        let pantry = vec![snapshot("bread", 0.5, "grains", Some(1)), snapshot("apple", 3.0, "fruits", Some(5))];
        let list = svc.predict("u", &pantry, &history(), None, date(2025, 9, 30)).unwrap();
        let names: Vec<&str> = list.shopping_list.iter().map(|p| p.name.as_str()).collect();

        let milk = list.shopping_list.iter().find(|p| p.name == "milk").unwrap();
        // the category heuristic outranks the frequency one for milk
        assert_eq!(milk.reason, "Category preference: dairy");
        assert_eq!(milk.confidence, 0.6);
        assert_eq!(milk.category, "dairy");

        let bread = list.shopping_list.iter().find(|p| p.name == "bread").unwrap();
        assert_eq!(bread.confidence, 0.85);
        assert_eq!(bread.quantity, 2);
        assert!(bread.reason.contains("Running low"));

        assert!(names.contains(&"chicken"), "meat is under-represented: {names:?}");
        assert!(!names.contains(&"apple"));
        assert_eq!(list.total_items, list.shopping_list.len());
        let scores: Vec<f64> = list.shopping_list.iter().map(|p| p.priority_score).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(list.user_patterns.top_categories[0], "dairy");
    }

    #[test]
    fn seasonal_predictions_use_current_month() {
        let svc = service();
        let h = vec![trip(date(2024, 7, 2), &[("Peach", "fruits"), ("Plum", "fruits")], 9.0)];
        let list = svc.predict("s", &[], &h, None, date(2025, 7, 10)).unwrap();
        assert!(list.shopping_list.iter().any(|p| p.name == "watermelon" && p.reason == "Seasonal trend for July"));
        assert!(list.insights.seasonal_items >= 3);
    }

    #[test]
    fn budget_keeps_one_overshoot() {
        let mk = |name: &str, price: f64| Prediction { price: Some(price), ..Prediction::new(name, "other", 0.5, String::new()) };
        let kept = apply_budget(vec![mk("a", 4.0), mk("b", 4.0), mk("c", 4.0), mk("d", 1.0)], 10.0);
        let names: Vec<&str> = kept.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);

        let kept = apply_budget(vec![mk("a", 9.5), mk("b", 4.0), mk("c", 0.5)], 10.0);
        let names: Vec<&str> = kept.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
        assert!(service().predict("u", &[], &history(), Some(0.0), date(2025, 9, 30)).is_err());
    }

    #[test]
    fn dedupe_keeps_highest_confidence() {
        let raw = vec![
            Prediction::new("milk", "dairy", 0.3, "Frequently purchased (3 times)".into()),
            Prediction::new("eggs", "dairy", 0.6, String::new()),
            Prediction::new("milk", "dairy", 0.85, "Running low (frequent purchase)".into()),
        ];
        let out = dedupe(raw);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].name, "milk");
        assert_eq!(out[0].confidence, 0.85);
    }

    #[test]
    fn feedback_and_insights() {
        let svc = service();
        let today = date(2025, 9, 30);
        assert!(matches!(svc.insights("u", today), ShoppingInsights::NoHistory { .. }));
        assert!(svc.feedback("u", "milk", Feedback::Positive).is_err());

        svc.analyze("u", &history()).unwrap();
        assert_eq!(svc.feedback("u", "Milk", Feedback::Positive).unwrap(), 4);
        assert_eq!(svc.feedback("u", "tofu", Feedback::Negative).unwrap(), 0);
        assert_eq!(svc.feedback("u", "milk", Feedback::Neutral).unwrap(), 4);

        let ShoppingInsights::Report(r) = svc.insights("u", today) else { panic!("expected report") };
        assert_eq!(r.top_items[0], ("milk".to_string(), 4));
        assert_eq!(r.favorite_categories[0].0, "dairy");
        assert_eq!(r.shopping_recommendations, vec!["You frequently shop in dairy category", "Consider seasonal September items"]);
    }

    #[test]
    fn seasonal_lookup() {
        assert_eq!(seasonal("July").unwrap(), vec!["summer fruits", "grilling items", "cold beverages"]);
        assert_eq!(seasonal("10").unwrap()[0], "pumpkins");
        assert!(seasonal("march").unwrap().is_empty());
        assert!(seasonal("13").is_none());
        assert!(seasonal("smarch").is_none());
    }

    #[test]
    fn prioritize_ranks_by_pattern_and_budget() {
        let svc = service();
        let mk = |name: &str, category: &str, price: f64| Prediction { price: Some(price), ..Prediction::new(name, category, 0.5, String::new()) };
        let list = || vec![mk("Tofu", "other", 3.0), mk("Milk", "dairy", 2.0), mk("Bread", "grains", 4.0)];

        // no stored pattern: the neutral one favours "other"
        let ranked = svc.prioritize("new", list(), None).unwrap();
        assert_eq!(ranked[0].name, "tofu");
        assert_eq!(ranked[0].reason, "User added");

        svc.analyze("u", &history()).unwrap();
        let ranked = svc.prioritize("u", list(), None).unwrap();
        let names: Vec<&str> = ranked.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["milk", "bread", "tofu"]);
        assert!(ranked.windows(2).all(|w| w[0].priority_score >= w[1].priority_score));

        let budgeted = svc.prioritize("u", list(), Some(5.0)).unwrap();
        let names: Vec<&str> = budgeted.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["milk", "bread"]);

        assert!(svc.prioritize("u", list(), Some(-1.0)).is_err());
        assert!(svc.prioritize("u", vec![mk(" ", "other", 1.0)], None).is_err());
        assert!(svc.prioritize("", list(), None).is_err());
    }

    #[tokio::test]
    async fn apply_adds_with_priority() {
        let svc = service();
        let mut hot = Prediction::new("milk", "dairy", 0.9, "Running low (frequent purchase)".into());
        hot.priority_score = 0.8;
        hot.quantity = 2;
        let cold = Prediction::new("salt", "other", 0.6, "Category preference: other".into());
        let added = svc.apply(vec![hot, cold]).await.unwrap();
        assert_eq!(added[0].item.priority, Priority::High);
        assert_eq!(added[0].item.quantity, 2.0);
        assert_eq!(added[0].item.category, Category::Dairy);
        assert_eq!(added[1].item.priority, Priority::Normal);
        assert!(svc.apply(vec![]).await.is_err());
    }
}
