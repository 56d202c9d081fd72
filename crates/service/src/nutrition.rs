//! Nutrition table and calorie arithmetic.
//!
//! Values are per 100 g. Only a handful of fruits carry the extended
//! micronutrient row; everything else reports zeros there.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use models::text::singular;

use crate::errors::ServiceError;

pub const MAX_WEIGHT_G: f64 = 10_000.0;
const MIN_PORTION_G: f64 = 10.0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Micros {
    pub sugar: f64,
    pub saturated_fat: f64,
    pub monounsaturated_fat: f64,
    pub polyunsaturated_fat: f64,
    pub trans_fat: f64,
    pub cholesterol: f64,
    pub sodium: f64,
    pub potassium: f64,
    pub vitamin_c: f64,
    pub vitamin_a: f64,
    pub vitamin_e: f64,
    pub vitamin_k: f64,
    pub thiamine: f64,
    pub riboflavin: f64,
    pub niacin: f64,
    pub folate: f64,
    pub calcium: f64,
    pub iron: f64,
    pub magnesium: f64,
    pub phosphorus: f64,
    pub zinc: f64,
    pub copper: f64,
    pub manganese: f64,
    pub selenium: f64,
}

impl Micros {
    fn row(v: [f64; 24]) -> Self {
        Self {
            sugar: v[0],
            saturated_fat: v[1],
            monounsaturated_fat: v[2],
            polyunsaturated_fat: v[3],
            trans_fat: v[4],
            cholesterol: v[5],
            sodium: v[6],
            potassium: v[7],
            vitamin_c: v[8],
            vitamin_a: v[9],
            vitamin_e: v[10],
            vitamin_k: v[11],
            thiamine: v[12],
            riboflavin: v[13],
            niacin: v[14],
            folate: v[15],
            calcium: v[16],
            iron: v[17],
            magnesium: v[18],
            phosphorus: v[19],
            zinc: v[20],
            copper: v[21],
            manganese: v[22],
            selenium: v[23],
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FoodInfo {
    pub name: &'static str,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
    /// g/cm³
    pub density: f64,
    pub typical_portion_g: f64,
    pub portion_description: &'static str,
    pub micros: Micros,
}

#[allow(clippy::too_many_arguments)]
fn food(
    name: &'static str,
    calories: f64,
    protein: f64,
    carbs: f64,
    fat: f64,
    fiber: f64,
    density: f64,
    typical_portion_g: f64,
    portion_description: &'static str,
) -> FoodInfo {
    FoodInfo {
        name,
        calories,
        protein,
        carbs,
        fat,
        fiber,
        density,
        typical_portion_g,
        portion_description,
        micros: Micros::default(),
    }
}

static FOODS: Lazy<BTreeMap<&'static str, FoodInfo>> = Lazy::new(|| {
    let with = |f: FoodInfo, row: [f64; 24]| FoodInfo { micros: Micros::row(row), ..f };
    let table = vec![
        // fruits
        with(
            food("apple", 52.0, 0.3, 14.0, 0.2, 2.4, 0.6, 182.0, "1 medium apple"),
            [10.4, 0.0, 0.0, 0.1, 0.0, 0.0, 1.0, 107.0, 4.6, 3.0, 0.2, 2.2, 0.0, 0.0, 0.1, 3.0, 6.0, 0.1, 5.0, 11.0, 0.0, 0.0, 0.0, 0.0],
        ),
        with(
            food("banana", 89.0, 1.1, 23.0, 0.3, 2.6, 0.7, 120.0, "1 medium banana"),
            [12.2, 0.1, 0.0, 0.1, 0.0, 0.0, 1.0, 358.0, 8.7, 64.0, 0.1, 0.5, 0.0, 0.1, 0.7, 20.0, 5.0, 0.3, 27.0, 22.0, 0.2, 0.1, 0.3, 1.0],
        ),
        with(
            food("orange", 47.0, 0.9, 12.0, 0.1, 2.4, 0.6, 131.0, "1 medium orange"),
            [9.4, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 181.0, 53.2, 225.0, 0.2, 0.0, 0.1, 0.0, 0.3, 40.0, 40.0, 0.1, 10.0, 14.0, 0.1, 0.0, 0.0, 0.0],
        ),
        with(
            food("grape", 67.0, 0.6, 17.0, 0.2, 0.9, 0.7, 92.0, "1 cup grapes"),
            [16.3, 0.1, 0.0, 0.1, 0.0, 0.0, 2.0, 191.0, 4.0, 66.0, 0.2, 14.6, 0.1, 0.1, 0.2, 2.0, 10.0, 0.4, 7.0, 20.0, 0.1, 0.1, 0.1, 0.1],
        ),
        with(
            food("strawberry", 32.0, 0.7, 8.0, 0.3, 2.0, 0.6, 152.0, "1 cup strawberries"),
            [4.9, 0.0, 0.0, 0.2, 0.0, 0.0, 1.0, 153.0, 58.8, 12.0, 0.3, 2.2, 0.0, 0.0, 0.4, 24.0, 16.0, 0.4, 13.0, 24.0, 0.1, 0.0, 0.4, 0.4],
        ),
        food("blueberry", 57.0, 0.7, 14.0, 0.3, 2.4, 0.6, 148.0, "1 cup blueberries"),
        food("pineapple", 50.0, 0.5, 13.0, 0.1, 1.4, 0.8, 165.0, "1 cup pineapple"),
        food("mango", 60.0, 0.8, 15.0, 0.4, 1.6, 0.7, 165.0, "1 medium mango"),
        food("peach", 39.0, 0.9, 10.0, 0.3, 1.5, 0.6, 150.0, "1 medium peach"),
        food("pear", 57.0, 0.4, 15.0, 0.1, 3.1, 0.6, 166.0, "1 medium pear"),
        // vegetables
        food("carrot", 41.0, 0.9, 10.0, 0.2, 2.8, 0.7, 61.0, "1 medium carrot"),
        food("broccoli", 34.0, 2.8, 7.0, 0.4, 2.6, 0.4, 91.0, "1 cup broccoli"),
        food("tomato", 18.0, 0.9, 4.0, 0.2, 1.2, 0.6, 123.0, "1 medium tomato"),
        food("potato", 77.0, 2.0, 17.0, 0.1, 2.2, 0.7, 150.0, "1 medium potato"),
        food("onion", 40.0, 1.1, 9.0, 0.1, 1.7, 0.6, 110.0, "1 medium onion"),
        food("lettuce", 15.0, 1.4, 3.0, 0.2, 1.3, 0.2, 36.0, "1 cup lettuce"),
        food("spinach", 23.0, 2.9, 4.0, 0.4, 2.2, 0.2, 30.0, "1 cup spinach"),
        food("cucumber", 16.0, 0.7, 4.0, 0.1, 0.5, 0.6, 119.0, "1 medium cucumber"),
        food("bell_pepper", 31.0, 1.0, 7.0, 0.3, 2.5, 0.6, 119.0, "1 medium bell pepper"),
        food("corn", 86.0, 3.3, 19.0, 1.2, 2.7, 0.7, 154.0, "1 cup corn"),
        // nuts and seeds
        food("almond", 579.0, 21.0, 22.0, 50.0, 12.0, 0.6, 28.0, "1 oz almonds"),
        food("walnut", 654.0, 15.0, 14.0, 65.0, 6.7, 0.6, 28.0, "1 oz walnuts"),
        food("cashew", 553.0, 18.0, 30.0, 44.0, 3.3, 0.6, 28.0, "1 oz cashews"),
        food("pistachio", 560.0, 20.0, 28.0, 45.0, 10.0, 0.6, 28.0, "1 oz pistachios"),
        food("peanut", 567.0, 26.0, 16.0, 49.0, 8.5, 0.6, 28.0, "1 oz peanuts"),
        food("sunflower_seed", 584.0, 21.0, 20.0, 51.0, 8.6, 0.6, 28.0, "1 oz sunflower seeds"),
        // grains
        food("rice", 130.0, 2.7, 28.0, 0.3, 0.4, 0.8, 158.0, "1 cup cooked rice"),
        food("wheat", 339.0, 13.0, 71.0, 2.5, 12.0, 0.8, 120.0, "1 cup wheat flour"),
        food("oats", 389.0, 17.0, 66.0, 7.0, 11.0, 0.6, 81.0, "1 cup oats"),
        food("quinoa", 120.0, 4.4, 22.0, 1.9, 2.8, 0.7, 185.0, "1 cup cooked quinoa"),
        food("bread", 265.0, 9.0, 49.0, 3.2, 2.7, 0.3, 28.0, "1 slice bread"),
        food("pasta", 131.0, 5.0, 25.0, 1.1, 1.8, 0.6, 140.0, "1 cup cooked pasta"),
        // proteins
        food("chicken", 165.0, 31.0, 0.0, 3.6, 0.0, 1.0, 100.0, "3.5 oz chicken breast"),
        food("beef", 250.0, 26.0, 0.0, 15.0, 0.0, 1.0, 100.0, "3.5 oz beef"),
        food("fish", 206.0, 22.0, 0.0, 12.0, 0.0, 1.0, 100.0, "3.5 oz fish"),
        food("salmon", 208.0, 25.0, 0.0, 12.0, 0.0, 1.0, 100.0, "3.5 oz salmon"),
        food("egg", 155.0, 13.0, 1.1, 11.0, 0.0, 1.0, 50.0, "1 large egg"),
        food("tofu", 76.0, 8.0, 2.0, 5.0, 0.3, 1.0, 100.0, "3.5 oz tofu"),
        food("beans", 127.0, 8.0, 23.0, 0.5, 6.0, 0.8, 177.0, "1 cup cooked beans"),
        // dairy
        food("milk", 42.0, 3.4, 5.0, 1.0, 0.0, 1.0, 244.0, "1 cup milk"),
        food("cheese", 113.0, 7.0, 1.0, 9.0, 0.0, 1.0, 28.0, "1 oz cheese"),
        food("yogurt", 59.0, 10.0, 4.0, 0.4, 0.0, 1.0, 245.0, "1 cup yogurt"),
        food("butter", 717.0, 0.9, 0.1, 81.0, 0.0, 0.9, 14.0, "1 tbsp butter"),
        // other
        food("olive_oil", 884.0, 0.0, 0.0, 100.0, 0.0, 0.9, 14.0, "1 tbsp olive oil"),
        food("sugar", 387.0, 0.0, 100.0, 0.0, 0.0, 1.6, 4.0, "1 tsp sugar"),
        food("salt", 0.0, 0.0, 0.0, 0.0, 0.0, 2.2, 6.0, "1 tsp salt"),
    ];
    table.into_iter().map(|f| (f.name, f)).collect()
});

/// Resolve a free-text food name to a table entry.
///
/// Tries the name as given, its singular, then each word from the last one
/// backwards ("grilled chicken breast" -> chicken).
pub fn find_food(name: &str) -> Option<&'static FoodInfo> {
    let key = name.trim().to_lowercase().replace(' ', "_");
    if key.is_empty() {
        return None;
    }
    if let Some(f) = FOODS.get(key.as_str()) {
        return Some(f);
    }
    let single = singular(name).replace(' ', "_");
    if let Some(f) = FOODS.get(single.as_str()) {
        return Some(f);
    }
    let words = singular(name);
    words.split(' ').rev().find_map(|w| FOODS.get(w).or_else(|| FOODS.get(singular(w).as_str())))
}

#[derive(Clone, Debug, Serialize)]
pub struct FoodSummary {
    pub name: &'static str,
    pub calories_per_100g: f64,
    pub typical_portion_g: f64,
    pub portion_description: &'static str,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Nutrition {
    pub food_name: &'static str,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
    pub portion_size_g: f64,
    pub portion_description: &'static str,
    pub density: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct Vitamins {
    pub vitamin_c: f64,
    pub vitamin_a: f64,
    pub vitamin_e: f64,
    pub vitamin_k: f64,
    pub thiamine: f64,
    pub riboflavin: f64,
    pub niacin: f64,
    pub folate: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct Minerals {
    pub calcium: f64,
    pub iron: f64,
    pub magnesium: f64,
    pub phosphorus: f64,
    pub zinc: f64,
    pub copper: f64,
    pub manganese: f64,
    pub selenium: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct FoodQuality {
    pub quality_score: f64,
    pub quality_rating: &'static str,
    pub protein_percentage: f64,
    pub carb_percentage: f64,
    pub fat_percentage: f64,
    pub fiber_per_100_calories: f64,
    pub recommendations: Vec<&'static str>,
}

#[derive(Clone, Debug, Serialize)]
pub struct PreciseNutrition {
    pub food_name: &'static str,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
    pub portion_size_g: f64,
    pub portion_description: &'static str,
    pub density: f64,
    pub calorie_accuracy: f64,
    pub calories_from_protein: f64,
    pub calories_from_carbs: f64,
    pub calories_from_fat: f64,
    pub total_calculated_calories: f64,
    pub sugar: f64,
    pub saturated_fat: f64,
    pub monounsaturated_fat: f64,
    pub polyunsaturated_fat: f64,
    pub trans_fat: f64,
    pub cholesterol: f64,
    pub sodium: f64,
    pub potassium: f64,
    pub vitamins: Vitamins,
    pub minerals: Minerals,
    pub nutritional_quality: FoodQuality,
    pub validation_errors: Vec<String>,
    pub calculation_quality: &'static str,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize)]
pub struct PortionValidation {
    pub valid: bool,
    pub typical_portion_g: f64,
    pub deviation_percent: f64,
    pub recommendation: &'static str,
}

#[derive(Clone, Debug, Serialize)]
pub struct PortionUpdate {
    pub food_name: String,
    pub original_weight_g: f64,
    pub updated_weight_g: f64,
    pub weight_change_g: f64,
    pub weight_change_percent: f64,
    pub precise_nutrition: PreciseNutrition,
    pub validation: PortionValidation,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MealIngredient {
    pub name: String,
    #[serde(default = "half")]
    pub confidence: f64,
}

fn half() -> f64 { 0.5 }

#[derive(Clone, Debug, Serialize)]
pub struct BreakdownEntry {
    pub name: String,
    pub portion_size_g: f64,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
    pub confidence: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct MealQuality {
    pub quality_score: u8,
    pub quality_rating: &'static str,
    pub protein_percentage: f64,
    pub fat_percentage: f64,
    pub fiber_content: f64,
    pub recommendations: Vec<&'static str>,
}

#[derive(Clone, Debug, Serialize)]
pub struct MealAnalysis {
    pub total_calories: f64,
    pub total_protein: f64,
    pub total_carbs: f64,
    pub total_fat: f64,
    pub total_fiber: f64,
    pub total_weight_g: f64,
    pub calories_per_100g: f64,
    pub detailed_breakdown: Vec<BreakdownEntry>,
    pub meal_type: &'static str,
    pub nutritional_quality: MealQuality,
    pub dietary_recommendations: Vec<&'static str>,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NutritionService;

impl NutritionService {
    pub fn new() -> Self {
        Self
    }

    pub fn foods(&self) -> Vec<FoodSummary> {
        FOODS
            .values()
            .map(|f| FoodSummary {
                name: f.name,
                calories_per_100g: f.calories,
                typical_portion_g: f.typical_portion_g,
                portion_description: f.portion_description,
            })
            .collect()
    }

    pub fn calculate(&self, food_name: &str, grams: f64) -> Result<Nutrition, ServiceError> {
        let f = lookup(food_name)?;
        check_weight(grams)?;
        Ok(scaled(f, grams))
    }

    pub fn precise(&self, food_name: &str, grams: f64) -> Result<PreciseNutrition, ServiceError> {
        if food_name.trim().is_empty() {
            return Err(ServiceError::invalid("Invalid food name provided"));
        }
        check_weight(grams)?;
        let f = lookup(food_name)?;
        let k = grams / 100.0;
        let calories = f.calories * k;
        let protein = f.protein * k;
        let carbs = f.carbs * k;
        let fat = f.fat * k;
        let fiber = f.fiber * k;

        let from_protein = protein * 4.0;
        let from_carbs = carbs * 4.0;
        let from_fat = fat * 9.0;
        let computed = from_protein + from_carbs + from_fat;
        let accuracy = if calories > 0.0 { (calories - computed).abs() / calories * 100.0 } else { 0.0 };

        let mut warnings = Vec::new();
        if accuracy > 5.0 {
            warnings.push(format!("Calorie calculation deviation: {accuracy:.1}%"));
        }
        if calories > 1000.0 {
            warnings.push(format!("Unusually high calorie count: {calories:.1}"));
        }
        if (calories - computed).abs() > 1.0 {
            warnings.push("Calorie calculation precision issue".to_string());
        }

        let m = &f.micros;
        let vitamins = Vitamins {
            vitamin_c: round(m.vitamin_c * k, 2),
            vitamin_a: round(m.vitamin_a * k, 2),
            vitamin_e: round(m.vitamin_e * k, 2),
            vitamin_k: round(m.vitamin_k * k, 2),
            thiamine: round(m.thiamine * k, 3),
            riboflavin: round(m.riboflavin * k, 3),
            niacin: round(m.niacin * k, 3),
            folate: round(m.folate * k, 2),
        };
        let minerals = Minerals {
            calcium: round(m.calcium * k, 2),
            iron: round(m.iron * k, 2),
            magnesium: round(m.magnesium * k, 2),
            phosphorus: round(m.phosphorus * k, 2),
            zinc: round(m.zinc * k, 2),
            copper: round(m.copper * k, 2),
            manganese: round(m.manganese * k, 2),
            selenium: round(m.selenium * k, 2),
        };
        let quality = food_quality(calories, protein, carbs, fat, fiber, &vitamins, &minerals);

        Ok(PreciseNutrition {
            food_name: f.name,
            calories: round(calories, 1),
            protein: round(protein, 2),
            carbs: round(carbs, 2),
            fat: round(fat, 2),
            fiber: round(fiber, 2),
            portion_size_g: round(grams, 1),
            portion_description: f.portion_description,
            density: f.density,
            calorie_accuracy: round(accuracy, 2),
            calories_from_protein: round(from_protein, 1),
            calories_from_carbs: round(from_carbs, 1),
            calories_from_fat: round(from_fat, 1),
            total_calculated_calories: round(computed, 1),
            sugar: round(m.sugar * k, 2),
            saturated_fat: round(m.saturated_fat * k, 2),
            monounsaturated_fat: round(m.monounsaturated_fat * k, 2),
            polyunsaturated_fat: round(m.polyunsaturated_fat * k, 2),
            trans_fat: round(m.trans_fat * k, 2),
            cholesterol: round(m.cholesterol * k, 2),
            sodium: round(m.sodium * k, 2),
            potassium: round(m.potassium * k, 2),
            vitamins,
            minerals,
            nutritional_quality: quality,
            calculation_quality: if warnings.is_empty() { "excellent" } else { "needs_review" },
            validation_errors: warnings,
            timestamp: Utc::now(),
        })
    }

    pub fn validate_portion(&self, food_name: &str, grams: f64) -> Result<PortionValidation, ServiceError> {
        let f = lookup(food_name)?;
        let typical = f.typical_portion_g;
        let deviation = (grams - typical).abs() / typical * 100.0;
        let recommendation = if deviation > 50.0 {
            "Unusually large portion - consider splitting"
        } else if deviation > 25.0 {
            "Larger than typical - ensure accuracy"
        } else if deviation < 10.0 {
            "Perfect portion size"
        } else {
            "Good portion size"
        };
        Ok(PortionValidation { valid: true, typical_portion_g: typical, deviation_percent: round(deviation, 1), recommendation })
    }

    pub fn update_portion(&self, food_name: &str, new_g: f64, original_g: f64) -> Result<PortionUpdate, ServiceError> {
        if new_g <= 0.0 {
            return Err(ServiceError::invalid("New weight must be greater than 0"));
        }
        if original_g <= 0.0 {
            return Err(ServiceError::invalid("Original weight must be greater than 0"));
        }
        let precise_nutrition = self.precise(food_name, new_g)?;
        let validation = self.validate_portion(food_name, new_g)?;
        let change = new_g - original_g;
        Ok(PortionUpdate {
            food_name: food_name.to_string(),
            original_weight_g: original_g,
            updated_weight_g: new_g,
            weight_change_g: round(change, 1),
            weight_change_percent: round(change / original_g * 100.0, 1),
            precise_nutrition,
            validation,
        })
    }

    /// Calories of one typical portion, used when a log entry has none.
    pub fn estimate_calories(&self, food_name: &str) -> Option<f64> {
        find_food(food_name).map(|f| round(f.calories * f.typical_portion_g / 100.0, 1))
    }

    pub fn analyze_meal(&self, ingredients: &[MealIngredient]) -> MealAnalysis {
        self.analyze_meal_with(ingredients, &mut rand::thread_rng())
    }

    pub fn analyze_meal_with<R: Rng + ?Sized>(&self, ingredients: &[MealIngredient], rng: &mut R) -> MealAnalysis {
        let mut breakdown = Vec::new();
        let (mut cal, mut protein, mut carbs, mut fat, mut fiber, mut weight) = (0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        for ing in ingredients {
            let name = ing.name.trim().to_lowercase();
            let Some(f) = find_food(&name) else { continue };
            let grams = estimate_portion(f, ing.confidence, rng);
            let n = scaled(f, grams);
            cal += n.calories;
            protein += n.protein;
            carbs += n.carbs;
            fat += n.fat;
            fiber += n.fiber;
            weight += n.portion_size_g;
            breakdown.push(BreakdownEntry {
                name,
                portion_size_g: n.portion_size_g,
                calories: n.calories,
                protein: n.protein,
                carbs: n.carbs,
                fat: n.fat,
                fiber: n.fiber,
                confidence: ing.confidence,
            });
        }
        MealAnalysis {
            total_calories: round(cal, 1),
            total_protein: round(protein, 1),
            total_carbs: round(carbs, 1),
            total_fat: round(fat, 1),
            total_fiber: round(fiber, 1),
            total_weight_g: round(weight, 1),
            calories_per_100g: round(if weight > 0.0 { cal / weight * 100.0 } else { 0.0 }, 1),
            detailed_breakdown: breakdown,
            meal_type: classify_meal(cal),
            nutritional_quality: meal_quality(cal, protein, fat, fiber),
            dietary_recommendations: dietary_recommendations(cal, protein, carbs, fat),
        }
    }
}

fn lookup(food_name: &str) -> Result<&'static FoodInfo, ServiceError> {
    find_food(food_name).ok_or_else(|| {
        let some: Vec<&str> = FOODS.keys().take(5).copied().collect();
        ServiceError::invalid(format!("Unknown food: {}. Available foods: {}...", food_name.trim(), some.join(", ")))
    })
}

fn check_weight(grams: f64) -> Result<(), ServiceError> {
    if !grams.is_finite() || grams <= 0.0 {
        return Err(ServiceError::invalid(format!("Invalid weight: {grams}. Must be a positive number.")));
    }
    if grams > MAX_WEIGHT_G {
        return Err(ServiceError::invalid(format!("Weight too large: {grams}g. Maximum 10kg allowed.")));
    }
    Ok(())
}

fn scaled(f: &'static FoodInfo, grams: f64) -> Nutrition {
    let k = grams / 100.0;
    Nutrition {
        food_name: f.name,
        calories: round(f.calories * k, 1),
        protein: round(f.protein * k, 1),
        carbs: round(f.carbs * k, 1),
        fat: round(f.fat * k, 1),
        fiber: round(f.fiber * k, 1),
        portion_size_g: round(grams, 1),
        portion_description: f.portion_description,
        density: f.density,
    }
}

/// typical × (0.8 + 0.4·confidence) × N(1, 0.1) clamped to [0.7, 1.3], at least 10 g.
fn estimate_portion<R: Rng + ?Sized>(f: &FoodInfo, confidence: f64, rng: &mut R) -> f64 {
    let confidence_factor = 0.8 + confidence.clamp(0.0, 1.0) * 0.4;
    let variation = Normal::new(1.0_f64, 0.1).map_or(1.0, |n| n.sample(rng)).clamp(0.7, 1.3);
    (f.typical_portion_g * confidence_factor * variation).max(MIN_PORTION_G)
}

fn classify_meal(calories: f64) -> &'static str {
    match calories {
        c if c < 200.0 => "light_snack",
        c if c < 400.0 => "snack",
        c if c < 600.0 => "light_meal",
        c if c < 800.0 => "regular_meal",
        _ => "large_meal",
    }
}

fn pct(part_calories: f64, total: f64) -> f64 {
    if total > 0.0 { part_calories / total * 100.0 } else { 0.0 }
}

fn food_quality(calories: f64, protein: f64, carbs: f64, fat: f64, fiber: f64, v: &Vitamins, m: &Minerals) -> FoodQuality {
    let p = pct(protein * 4.0, calories);
    let c = pct(carbs * 4.0, calories);
    let f = pct(fat * 9.0, calories);
    let fiber_per_100 = pct(fiber, calories);

    let band = |x: f64, best: (f64, f64), ok: (f64, f64), min: f64| -> f64 {
        if (best.0..=best.1).contains(&x) {
            25.0
        } else if (ok.0..=ok.1).contains(&x) {
            20.0
        } else if x >= min {
            15.0
        } else {
            0.0
        }
    };
    let mut score = band(p, (15.0, 35.0), (10.0, 40.0), 5.0)
        + band(c, (45.0, 65.0), (35.0, 75.0), 25.0)
        + band(f, (20.0, 35.0), (15.0, 40.0), 10.0);
    score += if fiber_per_100 >= 3.0 {
        25.0
    } else if fiber_per_100 >= 2.0 {
        20.0
    } else if fiber_per_100 >= 1.0 {
        15.0
    } else {
        0.0
    };

    let rating = match score {
        s if s >= 90.0 => "Excellent",
        s if s >= 75.0 => "Very Good",
        s if s >= 60.0 => "Good",
        s if s >= 45.0 => "Fair",
        _ => "Poor",
    };

    let mut recs = Vec::new();
    if p < 15.0 {
        recs.push("Consider adding more protein sources");
    }
    if c > 70.0 {
        recs.push("Reduce refined carbohydrates");
    }
    if f > 40.0 {
        recs.push("Consider reducing fat intake");
    }
    if fiber_per_100 < 2.0 {
        recs.push("Increase fiber intake");
    }
    if v.vitamin_c < 10.0 {
        recs.push("Add vitamin C rich foods");
    }
    if m.iron < 2.0 {
        recs.push("Consider iron-rich foods");
    }

    FoodQuality {
        quality_score: score,
        quality_rating: rating,
        protein_percentage: round(p, 1),
        carb_percentage: round(c, 1),
        fat_percentage: round(f, 1),
        fiber_per_100_calories: round(fiber_per_100, 1),
        recommendations: recs,
    }
}

fn meal_quality(calories: f64, protein: f64, fat: f64, fiber: f64) -> MealQuality {
    let mut score = 0u8;
    let mut recs = Vec::new();

    let p = pct(protein * 4.0, calories);
    if (15.0..=25.0).contains(&p) {
        score += 2;
    } else if (10.0..15.0).contains(&p) || (p > 25.0 && p <= 30.0) {
        score += 1;
        recs.push("Consider adjusting protein intake");
    }

    let f = pct(fat * 9.0, calories);
    if (20.0..=35.0).contains(&f) {
        score += 2;
    } else if (15.0..20.0).contains(&f) || (f > 35.0 && f <= 40.0) {
        score += 1;
        recs.push("Consider adjusting fat intake");
    }

    if fiber >= 5.0 {
        score += 2;
    } else if fiber >= 3.0 {
        score += 1;
        recs.push("Add more fiber-rich foods");
    } else {
        recs.push("Consider adding more vegetables and whole grains");
    }

    let rating = match score {
        6.. => "excellent",
        4..=5 => "good",
        2..=3 => "fair",
        _ => "needs_improvement",
    };
    MealQuality {
        quality_score: score,
        quality_rating: rating,
        protein_percentage: round(p, 1),
        fat_percentage: round(f, 1),
        fiber_content: round(fiber, 1),
        recommendations: recs,
    }
}

fn dietary_recommendations(calories: f64, protein: f64, carbs: f64, fat: f64) -> Vec<&'static str> {
    let mut out = Vec::new();
    if calories > 1000.0 {
        out.push("This is a high-calorie meal. Consider portion control.");
    }
    if protein < 20.0 {
        out.push("Add more protein sources like lean meat, fish, or legumes.");
    }
    if fat > 50.0 {
        out.push("Consider reducing high-fat ingredients.");
    }
    if carbs > 100.0 {
        out.push("This meal is high in carbohydrates. Consider adding more vegetables.");
    }
    if calories < 300.0 {
        out.push("This is a light meal. You might need additional snacks.");
    }
    out
}

pub(crate) fn round(v: f64, places: i32) -> f64 {
    let p = 10f64.powi(places);
    (v * p).round() / p
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn finds_foods_loosely() {
        assert_eq!(find_food("Apples").map(|f| f.name), Some("apple"));
        assert_eq!(find_food("bell peppers").map(|f| f.name), Some("bell_pepper"));
        assert_eq!(find_food("Grilled Chicken").map(|f| f.name), Some("chicken"));
        assert_eq!(find_food("strawberries").map(|f| f.name), Some("strawberry"));
        assert!(find_food("unobtainium").is_none());
        assert!(find_food("  ").is_none());
    }

    #[test]
    fn calculate_scales_linearly() {
        let svc = NutritionService::new();
        let n = svc.calculate("banana", 200.0).unwrap();
        assert_eq!(n.calories, 178.0);
        assert_eq!(n.carbs, 46.0);
        assert_eq!(n.portion_description, "1 medium banana");
    }

    #[test]
    fn precise_reports_breakdown_and_warnings() {
        let svc = NutritionService::new();
        let p = svc.precise("apple", 100.0).unwrap();
        assert_eq!(p.calories, 52.0);
        assert_eq!(p.calories_from_carbs, 56.0);
        assert_eq!(p.total_calculated_calories, 59.0);
        assert_eq!(p.calorie_accuracy, 13.46);
        assert_eq!(p.calculation_quality, "needs_review");
        assert_eq!(p.potassium, 107.0);
        assert_eq!(p.vitamins.vitamin_c, 4.6);
        assert!(p.nutritional_quality.recommendations.contains(&"Add vitamin C rich foods"));

        let chicken = svc.precise("chicken", 100.0).unwrap();
        assert!(chicken.nutritional_quality.protein_percentage > 35.0);
    }

    #[test]
    fn precise_rejects_bad_input() {
        let svc = NutritionService::new();
        let err = svc.precise("apple", 0.0).unwrap_err().to_string();
        assert!(err.contains("Invalid weight: 0"));
        let err = svc.precise("apple", 10_001.0).unwrap_err().to_string();
        assert!(err.contains("Maximum 10kg allowed"));
        assert!(svc.precise("dragonfruit", 100.0).is_err());
        assert!(svc.precise("", 100.0).is_err());
    }

    #[test]
    fn portion_validation_bands() {
        let svc = NutritionService::new();
        assert_eq!(svc.validate_portion("egg", 52.0).unwrap().recommendation, "Perfect portion size");
        assert_eq!(svc.validate_portion("egg", 60.0).unwrap().recommendation, "Good portion size");
        assert_eq!(svc.validate_portion("egg", 65.0).unwrap().recommendation, "Larger than typical - ensure accuracy");
        assert_eq!(svc.validate_portion("egg", 100.0).unwrap().recommendation, "Unusually large portion - consider splitting");
    }

    #[test]
    fn update_portion_reports_change() {
        let svc = NutritionService::new();
        let u = svc.update_portion("rice", 237.0, 158.0).unwrap();
        assert_eq!(u.weight_change_g, 79.0);
        assert_eq!(u.weight_change_percent, 50.0);
        assert_eq!(u.precise_nutrition.portion_size_g, 237.0);
        assert!(svc.update_portion("rice", 0.0, 158.0).is_err());
    }

    #[test]
    fn meal_analysis_skips_unknown_and_stays_in_range() {
        let svc = NutritionService::new();
        let mut rng = StdRng::seed_from_u64(7);
        let ingredients = vec![
            MealIngredient { name: "Chicken".into(), confidence: 0.9 },
            MealIngredient { name: "rice".into(), confidence: 0.5 },
            MealIngredient { name: "mystery sauce".into(), confidence: 0.9 },
        ];
        let a = svc.analyze_meal_with(&ingredients, &mut rng);
        assert_eq!(a.detailed_breakdown.len(), 2);
        let chicken = &a.detailed_breakdown[0];
        // 100 g typical, factor 1.16, variation within [0.7, 1.3]
        assert!(chicken.portion_size_g >= 81.0 && chicken.portion_size_g <= 151.0);
        assert!(a.total_calories > 0.0);
        assert!(a.nutritional_quality.quality_score <= 6);
    }

    #[test]
    fn meal_classification_and_advice() {
        assert_eq!(classify_meal(150.0), "light_snack");
        assert_eq!(classify_meal(650.0), "regular_meal");
        assert_eq!(classify_meal(900.0), "large_meal");
        let recs = dietary_recommendations(1200.0, 10.0, 120.0, 60.0);
        assert_eq!(recs.len(), 4);
        let q = meal_quality(500.0, 25.0, 15.0, 6.0);
        assert_eq!(q.quality_score, 6);
        assert_eq!(q.quality_rating, "excellent");
    }

    #[test]
    fn estimates_typical_portion_calories() {
        let svc = NutritionService::new();
        assert_eq!(svc.estimate_calories("Eggs"), Some(77.5));
        assert_eq!(svc.estimate_calories("widget"), None);
        assert_eq!(svc.foods().len(), FOODS.len());
    }
}
