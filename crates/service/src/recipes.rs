//! Read-only recipe catalogue and inventory matching.

use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::Serialize;
use tracing::info;

use models::meal_plan::MealType;
use models::recipe::{Difficulty, Recipe, RecipeFilter};
use models::shopping::ShoppingInput;
use models::text::names_match;

use crate::errors::ServiceError;
use crate::inventory::InventoryService;
use crate::shopping::{AddOutcome, ShoppingService};

#[derive(Clone, Debug, Serialize)]
pub struct RecipeMatch {
    pub recipe: Recipe,
    /// Share of ingredients found in inventory, 0.0..=1.0.
    pub coverage: f64,
    pub available: Vec<String>,
    pub missing: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct MissingAdded {
    pub recipe_id: String,
    pub added: Vec<AddOutcome>,
}

#[derive(Clone)]
pub struct RecipeService {
    catalogue: Arc<Vec<Recipe>>,
    inventory: Arc<InventoryService>,
    shopping: Arc<ShoppingService>,
}

impl RecipeService {
    pub fn new(inventory: Arc<InventoryService>, shopping: Arc<ShoppingService>) -> Self {
        Self { catalogue: Arc::new(CATALOGUE.clone()), inventory, shopping }
    }

    pub fn catalogue(&self) -> &[Recipe] {
        &self.catalogue
    }

    pub fn list(&self, filter: &RecipeFilter) -> Vec<Recipe> {
        self.catalogue.iter().filter(|r| filter.matches(r)).cloned().collect()
    }

    pub fn get(&self, id: &str) -> Result<Recipe, ServiceError> {
        self.catalogue
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found("recipe"))
    }

    pub async fn match_inventory(&self) -> Vec<RecipeMatch> {
        let names: Vec<String> = self.inventory.all().await.into_iter().map(|i| i.name).collect();
        let mut matches: Vec<RecipeMatch> = self.catalogue.iter().map(|r| match_recipe(r, &names)).collect();
        matches.sort_by(|a, b| {
            b.coverage
                .total_cmp(&a.coverage)
                .then_with(|| a.recipe.prep_time.cmp(&b.recipe.prep_time))
                .then_with(|| a.recipe.name.cmp(&b.recipe.name))
        });
        matches
    }

    /// Put every ingredient the pantry lacks on the shopping list.
    pub async fn add_missing_to_shopping(&self, recipe_id: &str) -> Result<MissingAdded, ServiceError> {
        let recipe = self.get(recipe_id)?;
        let names: Vec<String> = self.inventory.all().await.into_iter().map(|i| i.name).collect();
        let m = match_recipe(&recipe, &names);
        let mut added = Vec::with_capacity(m.missing.len());
        for ingredient in m.missing {
            let input = ShoppingInput {
                note: Some(format!("for {}", recipe.name)),
                ..ShoppingInput::named(display_name(&ingredient), 1.0)
            };
            added.push(self.shopping.add(input).await?);
        }
        info!(event = "recipe_missing_added", recipe = %recipe.id, count = added.len());
        Ok(MissingAdded { recipe_id: recipe.id, added })
    }
}

pub fn match_recipe(recipe: &Recipe, pantry: &[String]) -> RecipeMatch {
    let (available, missing): (Vec<String>, Vec<String>) = recipe
        .ingredients
        .iter()
        .cloned()
        .partition(|ing| pantry.iter().any(|p| names_match(ing, p)));
    let coverage = if recipe.ingredients.is_empty() {
        0.0
    } else {
        available.len() as f64 / recipe.ingredients.len() as f64
    };
    RecipeMatch { recipe: recipe.clone(), coverage, available, missing }
}

/// `olive_oil` -> `Olive oil`
pub fn display_name(ingredient: &str) -> String {
    let spaced = ingredient.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[allow(clippy::too_many_arguments)]
fn recipe(
    id: &str,
    name: &str,
    meal_type: MealType,
    ingredients: &[&str],
    prep_time: u32,
    cost: f64,
    calories: u32,
    protein: u32,
    labels: &[&str],
    cuisine: &str,
    difficulty: Difficulty,
    instructions: &[&str],
) -> Recipe {
    Recipe {
        id: id.into(),
        name: name.into(),
        ingredients: ingredients.iter().map(|s| s.to_string()).collect(),
        meal_type,
        prep_time,
        cost,
        calories,
        protein,
        dietary_labels: labels.iter().map(|s| s.to_string()).collect(),
        cuisine: cuisine.into(),
        difficulty,
        instructions: instructions.iter().map(|s| s.to_string()).collect(),
    }
}

static CATALOGUE: Lazy<Vec<Recipe>> = Lazy::new(|| {
    use Difficulty::*;
    use MealType::*;
    vec![
        recipe(
            "avocado-toast-scrambled-eggs",
            "Avocado Toast with Scrambled Eggs",
            Breakfast,
            &["bread", "avocado", "eggs", "salt", "pepper", "butter"],
            10, 4.0, 350, 15,
            &["vegetarian"],
            "American",
            Beginner,
            &[
                "Toast bread slices",
                "Mash avocado with salt and pepper",
                "Scramble eggs in butter",
                "Spread avocado on toast, top with eggs",
            ],
        ),
        recipe(
            "overnight-oats-berries",
            "Overnight Oats with Berries",
            Breakfast,
            &["oats", "milk", "berries", "honey", "chia_seeds"],
            5, 2.5, 310, 12,
            &["vegetarian"],
            "American",
            Beginner,
            &[
                "Stir oats, milk and chia seeds together in a jar",
                "Refrigerate overnight",
                "Top with berries and a drizzle of honey",
            ],
        ),
        recipe(
            "spinach-mushroom-omelette",
            "Spinach Mushroom Omelette",
            Breakfast,
            &["eggs", "spinach", "mushrooms", "cheese", "butter"],
            12, 3.5, 320, 22,
            &["vegetarian", "gluten_free"],
            "French",
            Beginner,
            &[
                "Saute mushrooms in butter, add spinach until wilted",
                "Whisk eggs and pour into the pan",
                "Add cheese, fold and serve",
            ],
        ),
        recipe(
            "greek-yogurt-parfait",
            "Greek Yogurt Parfait",
            Breakfast,
            &["yogurt", "berries", "granola", "honey"],
            5, 3.0, 290, 17,
            &["vegetarian"],
            "Health",
            Beginner,
            &["Layer yogurt, berries and granola in a glass", "Finish with honey"],
        ),
        recipe(
            "greek-quinoa-bowl",
            "Greek Quinoa Bowl",
            Lunch,
            &["quinoa", "cucumber", "tomato", "feta", "olives", "olive_oil", "lemon"],
            25, 6.0, 420, 18,
            &["vegetarian", "gluten_free"],
            "Mediterranean",
            Intermediate,
            &[
                "Cook quinoa according to package instructions",
                "Chop cucumber and tomato",
                "Mix vegetables with quinoa",
                "Top with feta and olives",
                "Drizzle with olive oil and lemon",
            ],
        ),
        recipe(
            "chicken-caesar-wrap",
            "Chicken Caesar Wrap",
            Lunch,
            &["tortilla", "chicken_breast", "lettuce", "parmesan", "caesar_dressing"],
            15, 6.0, 450, 32,
            &[],
            "American",
            Beginner,
            &[
                "Grill and slice the chicken",
                "Toss lettuce with dressing and parmesan",
                "Fill the tortilla and roll tightly",
            ],
        ),
        recipe(
            "lentil-vegetable-soup",
            "Lentil Vegetable Soup",
            Lunch,
            &["lentils", "carrots", "onion", "celery", "garlic", "tomato"],
            40, 3.5, 340, 18,
            &["vegan", "vegetarian", "gluten_free", "dairy_free"],
            "Mediterranean",
            Beginner,
            &[
                "Sweat onion, carrot, celery and garlic",
                "Add lentils, tomato and water",
                "Simmer for 30 minutes and season",
            ],
        ),
        recipe(
            "grilled-chicken-sweet-potato",
            "Grilled Chicken with Sweet Potato",
            Dinner,
            &["chicken_breast", "sweet_potato", "broccoli", "olive_oil", "garlic", "herbs"],
            35, 8.0, 480, 35,
            &["gluten_free", "dairy_free"],
            "American",
            Intermediate,
            &[
                "Season chicken with herbs and garlic",
                "Grill chicken for 6-7 minutes per side",
                "Roast sweet potato at 400°F for 25 minutes",
                "Steam broccoli until tender",
                "Serve together with olive oil drizzle",
            ],
        ),
        recipe(
            "vegetarian-stir-fry",
            "Vegetarian Stir Fry",
            Dinner,
            &["tofu", "bell_peppers", "broccoli", "carrots", "soy_sauce", "ginger", "garlic", "rice"],
            20, 5.5, 380, 20,
            &["vegetarian", "vegan"],
            "Asian",
            Intermediate,
            &[
                "Press and cube tofu",
                "Cook rice according to package instructions",
                "Heat oil in wok, add tofu and cook until golden",
                "Add vegetables and stir fry for 5-7 minutes",
                "Add sauce and serve over rice",
            ],
        ),
        recipe(
            "tomato-basil-pasta",
            "Tomato Basil Pasta",
            Dinner,
            &["pasta", "tomato", "garlic", "basil", "olive_oil", "parmesan"],
            25, 4.5, 520, 16,
            &["vegetarian"],
            "Italian",
            Beginner,
            &[
                "Boil pasta until al dente",
                "Cook garlic and chopped tomato in olive oil",
                "Toss pasta with sauce and basil, finish with parmesan",
            ],
        ),
        recipe(
            "black-bean-tacos",
            "Black Bean Tacos",
            Dinner,
            &["beans", "tortilla", "tomato", "onion", "lettuce", "cheese", "lime"],
            20, 4.0, 430, 18,
            &["vegetarian"],
            "Mexican",
            Beginner,
            &[
                "Warm beans with onion and spices",
                "Heat tortillas",
                "Fill with beans, tomato, lettuce and cheese, squeeze lime over",
            ],
        ),
        recipe(
            "salmon-rice-bowl",
            "Salmon Rice Bowl",
            Dinner,
            &["salmon", "rice", "cucumber", "avocado", "soy_sauce", "sesame_seeds"],
            25, 9.0, 560, 34,
            &["dairy_free"],
            "Japanese",
            Intermediate,
            &[
                "Cook rice",
                "Pan-sear salmon skin side down",
                "Slice cucumber and avocado",
                "Assemble bowls and dress with soy sauce and sesame",
            ],
        ),
        recipe(
            "beef-and-broccoli",
            "Beef and Broccoli",
            Dinner,
            &["beef", "broccoli", "soy_sauce", "garlic", "ginger", "rice"],
            30, 9.0, 610, 38,
            &["dairy_free"],
            "Asian",
            Advanced,
            &[
                "Slice beef thinly against the grain",
                "Sear beef in a very hot wok and set aside",
                "Stir fry broccoli with garlic and ginger",
                "Return beef, add sauce and serve over rice",
            ],
        ),
        recipe(
            "berry-protein-smoothie",
            "Berry Protein Smoothie",
            Snack,
            &["berries", "protein_powder", "banana", "almond_milk", "spinach", "chia_seeds"],
            5, 3.0, 280, 25,
            &["vegan", "gluten_free"],
            "Health",
            Beginner,
            &[
                "Add all ingredients to blender",
                "Blend until smooth",
                "Adjust consistency with more almond milk if needed",
                "Serve immediately",
            ],
        ),
        recipe(
            "hummus-veggie-plate",
            "Hummus Veggie Plate",
            Snack,
            &["hummus", "carrots", "cucumber", "bell_peppers"],
            5, 2.5, 180, 6,
            &["vegan", "vegetarian", "gluten_free", "dairy_free"],
            "Mediterranean",
            Beginner,
            &["Cut vegetables into sticks", "Serve with hummus"],
        ),
        recipe(
            "apple-peanut-butter-bites",
            "Apple Peanut Butter Bites",
            Snack,
            &["apple", "peanut_butter", "granola"],
            5, 1.5, 220, 6,
            &["vegetarian"],
            "American",
            Beginner,
            &["Core and slice the apple", "Spread peanut butter, sprinkle granola"],
        ),
    ]
});
