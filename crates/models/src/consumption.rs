use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;
use crate::meal_plan::MealType;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionEntry {
    pub id: Uuid,
    pub member: String,
    pub item_name: String,
    pub inventory_id: Option<Uuid>,
    pub quantity: f64,
    pub unit: String,
    pub meal_type: Option<MealType>,
    pub calories: Option<f64>,
    pub consumed_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionInput {
    pub member: String,
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(default)]
    pub inventory_id: Option<Uuid>,
    #[serde(default = "one")]
    pub quantity: f64,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub meal_type: Option<MealType>,
    #[serde(default)]
    pub calories: Option<f64>,
    #[serde(default)]
    pub consumed_at: Option<DateTime<Utc>>,
}

fn one() -> f64 { 1.0 }

impl ConsumptionInput {
    /// Item name may come from the linked inventory record, so only one of the two is required.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.member.trim().is_empty() {
            return Err(ModelError::invalid("member required"));
        }
        let named = self.item_name.as_deref().is_some_and(|n| !n.trim().is_empty());
        if !named && self.inventory_id.is_none() {
            return Err(ModelError::invalid("item_name or inventory_id required"));
        }
        if !self.quantity.is_finite() || self.quantity <= 0.0 {
            return Err(ModelError::invalid("quantity must be > 0"));
        }
        if let Some(c) = self.calories {
            if !c.is_finite() || c < 0.0 {
                return Err(ModelError::invalid("calories must be >= 0"));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ConsumptionFilter {
    pub member: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl ConsumptionFilter {
    pub fn matches(&self, e: &ConsumptionEntry) -> bool {
        let day = e.consumed_at.date_naive();
        self.member.as_deref().map_or(true, |m| e.member.eq_ignore_ascii_case(m.trim()))
            && self.from.map_or(true, |f| day >= f)
            && self.to.map_or(true, |t| day <= t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation() {
        let mut input = ConsumptionInput { member: "Ana".into(), item_name: Some("Apple".into()), ..Default::default() };
        input.quantity = 1.0;
        assert!(input.validate().is_ok());
        input.quantity = 0.0;
        assert!(input.validate().is_err());
        input.quantity = 1.0;
        input.item_name = None;
        assert!(input.validate().is_err());
        input.inventory_id = Some(Uuid::new_v4());
        assert!(input.validate().is_ok());
        input.member = " ".into();
        assert!(input.validate().is_err());
    }
}
