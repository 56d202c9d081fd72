//! Demo records loaded at startup when `seed.demo_data` is on, so a fresh
//! dashboard has something to show. Dates are relative to `today`.

use chrono::{Duration, NaiveDate};
use tracing::info;

use models::category::Category;
use models::consumption::ConsumptionInput;
use models::inventory::InventoryInput;
use models::meal_plan::{MealPlanInput, MealType};
use models::shopping::{Priority, ShoppingInput};

use crate::errors::ServiceError;
use crate::state::AppServices;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub inventory: usize,
    pub shopping: usize,
    pub meal_plans: usize,
    pub consumption: usize,
}

/// (name, quantity, unit, location, expires in days)
const PANTRY: [(&str, f64, &str, &str, i64); 10] = [
    ("Milk", 1.0, "gallon", "fridge", 2),
    ("Eggs", 12.0, "pcs", "fridge", 14),
    ("Spinach", 1.0, "bag", "fridge", 1),
    ("Chicken Breast", 2.0, "lb", "fridge", 3),
    ("Greek Yogurt", 4.0, "cups", "fridge", 9),
    ("Bananas", 6.0, "pcs", "counter", 4),
    ("Tomatoes", 5.0, "pcs", "counter", 5),
    ("Rice", 2.0, "kg", "pantry", 300),
    ("Pasta", 1.0, "box", "pantry", 400),
    ("Garlic", 1.0, "bulb", "pantry", 20),
];

pub async fn load_demo_data(services: &AppServices, today: NaiveDate) -> Result<SeedReport, ServiceError> {
    let inventory_inputs = PANTRY
        .iter()
        .map(|(name, quantity, unit, location, days)| InventoryInput {
            unit: Some(unit.to_string()),
            location: Some(location.to_string()),
            purchase_date: Some(today - Duration::days(2)),
            expiry_date: Some(today + Duration::days(*days)),
            ..InventoryInput::named(*name, *quantity)
        })
        .collect();
    let items = services.inventory.create_many(inventory_inputs).await?;

    let shopping = [
        ShoppingInput { priority: Some(Priority::High), category: Some(Category::Bakery), ..ShoppingInput::named("Bread", 1.0) },
        ShoppingInput { unit: Some("bunch".into()), ..ShoppingInput::named("Basil", 1.0) },
        ShoppingInput { priority: Some(Priority::Low), ..ShoppingInput::named("Olive oil", 1.0) },
    ];
    for input in shopping.iter().cloned() {
        services.shopping.add(input).await?;
    }

    let plans = [
        (0, MealType::Dinner, "tomato-basil-pasta"),
        (1, MealType::Breakfast, "spinach-mushroom-omelette"),
        (2, MealType::Dinner, "grilled-chicken-sweet-potato"),
    ];
    for (offset, meal_type, recipe) in plans {
        services
            .meal_plans
            .create(MealPlanInput {
                date: today + Duration::days(offset),
                meal_type,
                title: None,
                recipe_id: Some(recipe.into()),
                servings: 2,
                notes: None,
            })
            .await?;
    }

    let logs = [("Alex", "Bananas", 1.0, MealType::Breakfast), ("Sam", "Greek Yogurt", 1.0, MealType::Snack)];
    for (member, item, quantity, meal_type) in logs {
        services
            .consumption
            .log(ConsumptionInput {
                member: member.into(),
                item_name: Some(item.into()),
                quantity,
                meal_type: Some(meal_type),
                ..Default::default()
            })
            .await?;
    }

    let report = SeedReport {
        inventory: items.len(),
        shopping: shopping.len(),
        meal_plans: plans.len(),
        consumption: logs.len(),
    };
    info!(event = "demo_data_loaded", inventory = report.inventory, shopping = report.shopping, meal_plans = report.meal_plans);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use configs::AppConfig;

    #[tokio::test]
    async fn demo_data_fills_every_store() {
        let services = AppServices::new(&AppConfig::default()).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let report = load_demo_data(&services, today).await.unwrap();
        assert_eq!(report, SeedReport { inventory: 10, shopping: 3, meal_plans: 3, consumption: 2 });

        let stats = services.dashboard.stats(today).await;
        assert_eq!(stats.inventory_count, 10);
        assert_eq!(stats.expiring_soon, 3);
        assert_eq!(stats.meals_planned_week, 3);
        assert!(!services.suggestions.suggest(None, today).await.is_empty());
    }
}
