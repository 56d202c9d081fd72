use chrono::{Duration, NaiveDate, Utc};
use tracing::info;
use uuid::Uuid;

use models::meal_plan::{DayPlan, MealPlan, MealPlanInput};

use crate::errors::ServiceError;
use crate::recipes::RecipeService;
use crate::storage::MemoryStore;

#[derive(Clone)]
pub struct MealPlanService {
    store: MemoryStore<Uuid, MealPlan>,
    recipes: RecipeService,
}

impl MealPlanService {
    pub fn new(recipes: RecipeService) -> Self {
        Self { store: MemoryStore::new(), recipes }
    }

    /// Inclusive date range; either bound may be open.
    pub async fn list(&self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Vec<MealPlan> {
        let mut plans: Vec<MealPlan> = self
            .store
            .list()
            .await
            .into_iter()
            .filter(|p| from.map_or(true, |f| p.date >= f) && to.map_or(true, |t| p.date <= t))
            .collect();
        plans.sort_by(|a, b| {
            (a.date, a.meal_type)
                .cmp(&(b.date, b.meal_type))
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        plans
    }

    pub async fn create(&self, input: MealPlanInput) -> Result<MealPlan, ServiceError> {
        let plan = self.build(Uuid::new_v4(), input, Utc::now())?;
        self.store.insert(plan.id, plan.clone()).await;
        info!(event = "meal_plan_created", id = %plan.id, date = %plan.date, meal = plan.meal_type.as_str());
        Ok(plan)
    }

    pub async fn update(&self, id: Uuid, input: MealPlanInput) -> Result<MealPlan, ServiceError> {
        let existing = self.store.get(&id).await.ok_or_else(|| ServiceError::not_found("meal plan"))?;
        let plan = self.build(id, input, existing.created_at)?;
        self.store
            .update_map(|map| {
                let slot = map.get_mut(&id).ok_or_else(|| ServiceError::not_found("meal plan"))?;
                *slot = plan.clone();
                Ok(plan)
            })
            .await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        if self.store.remove(&id).await {
            info!(event = "meal_plan_deleted", id = %id);
            Ok(())
        } else {
            Err(ServiceError::not_found("meal plan"))
        }
    }

    /// Seven consecutive days from `start`, empty days included.
    pub async fn week(&self, start: NaiveDate) -> Vec<DayPlan> {
        let end = start + Duration::days(6);
        let plans = self.list(Some(start), Some(end)).await;
        (0..7)
            .map(|offset| {
                let date = start + Duration::days(offset);
                let meals = plans.iter().filter(|p| p.date == date).cloned().collect();
                DayPlan { date, meals }
            })
            .collect()
    }

    fn build(&self, id: Uuid, input: MealPlanInput, created_at: chrono::DateTime<Utc>) -> Result<MealPlan, ServiceError> {
        input.validate()?;
        let recipe_id = input.recipe_id.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());
        let recipe = match recipe_id.as_deref() {
            Some(rid) => Some(
                self.recipes
                    .get(rid)
                    .map_err(|_| ServiceError::invalid(format!("unknown recipe: {rid}")))?,
            ),
            None => None,
        };
        let title = input
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .or_else(|| recipe.as_ref().map(|r| r.name.clone()))
            .ok_or_else(|| ServiceError::invalid("title or recipe_id required"))?;
        Ok(MealPlan {
            id,
            date: input.date,
            meal_type: input.meal_type,
            title,
            recipe_id,
            servings: input.servings,
            notes: input.notes,
            created_at,
        })
    }
}
