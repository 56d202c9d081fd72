//! Domain records for the pantry: inventory, shopping list, meal plans,
//! consumption log and the recipe catalogue, with their input validation.

pub mod category;
pub mod consumption;
pub mod errors;
pub mod inventory;
pub mod meal_plan;
pub mod recipe;
pub mod shopping;
pub mod text;

pub use category::{guess_category, Category};
pub use meal_plan::MealType;
