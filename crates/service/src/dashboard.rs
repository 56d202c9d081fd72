use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use models::category::Category;
use models::inventory::ExpiryStatus;

use crate::consumption::ConsumptionService;
use crate::inventory::InventoryService;
use crate::meal_plans::MealPlanService;
use crate::shopping::ShoppingService;

/// Counts shown on the dashboard landing page.
#[derive(Clone, Debug, Serialize)]
pub struct DashboardStats {
    pub inventory_count: usize,
    pub expired: usize,
    /// Within three days, not yet expired.
    pub expiring_soon: usize,
    pub categories: BTreeMap<Category, usize>,
    pub shopping_pending: usize,
    pub shopping_purchased: usize,
    /// Plans from today through the next six days.
    pub meals_planned_week: usize,
    /// Consumption entries since seven days ago.
    pub consumption_week: usize,
}

#[derive(Clone)]
pub struct DashboardService {
    inventory: Arc<InventoryService>,
    shopping: Arc<ShoppingService>,
    meal_plans: MealPlanService,
    consumption: ConsumptionService,
}

impl DashboardService {
    pub fn new(
        inventory: Arc<InventoryService>,
        shopping: Arc<ShoppingService>,
        meal_plans: MealPlanService,
        consumption: ConsumptionService,
    ) -> Self {
        Self { inventory, shopping, meal_plans, consumption }
    }

    pub async fn stats(&self, today: NaiveDate) -> DashboardStats {
        let items = self.inventory.all().await;
        let mut categories = BTreeMap::new();
        let (mut expired, mut expiring_soon) = (0, 0);
        for item in &items {
            *categories.entry(item.category).or_insert(0) += 1;
            match item.status(today) {
                ExpiryStatus::Expired => expired += 1,
                ExpiryStatus::ExpiringSoon => expiring_soon += 1,
                ExpiryStatus::Fresh | ExpiryStatus::Unknown => {}
            }
        }
        DashboardStats {
            inventory_count: items.len(),
            expired,
            expiring_soon,
            categories,
            shopping_pending: self.shopping.pending_count().await,
            shopping_purchased: self.shopping.purchased_count().await,
            meals_planned_week: self.meal_plans.list(Some(today), Some(today + Duration::days(6))).await.len(),
            consumption_week: self.consumption.count_since(today - Duration::days(7)).await,
        }
    }
}
