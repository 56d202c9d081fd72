use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::category::Category;
use crate::errors::ModelError;
use crate::inventory::MAX_NAME_LEN;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShoppingItem {
    pub id: Uuid,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub category: Category,
    pub priority: Priority,
    pub purchased: bool,
    pub note: Option<String>,
    pub added_at: DateTime<Utc>,
    pub purchased_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ShoppingInput {
    pub name: String,
    #[serde(default = "one")]
    pub quantity: f64,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub note: Option<String>,
}

fn one() -> f64 { 1.0 }

impl ShoppingInput {
    pub fn named(name: impl Into<String>, quantity: f64) -> Self {
        Self { name: name.into(), quantity, ..Default::default() }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ModelError::invalid("name required"));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(ModelError::invalid(format!("name longer than {MAX_NAME_LEN} characters")));
        }
        if !self.quantity.is_finite() || self.quantity <= 0.0 {
            return Err(ModelError::invalid("quantity must be > 0"));
        }
        Ok(())
    }

    pub fn unit_or_default(&self) -> String {
        self.unit
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or("pcs")
            .to_string()
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ShoppingFilter {
    pub purchased: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_orders_and_serializes() {
        assert!(Priority::High > Priority::Normal && Priority::Normal > Priority::Low);
        assert_eq!(serde_json::to_value(Priority::High).unwrap(), "high");
    }

    #[test]
    fn input_defaults() {
        let input: ShoppingInput = serde_json::from_str(r#"{"name":"Milk"}"#).unwrap();
        assert_eq!(input.quantity, 1.0);
        assert_eq!(input.unit_or_default(), "pcs");
        assert!(input.validate().is_ok());
        assert!(ShoppingInput::named("Milk", 0.0).validate().is_err());
        assert!(ShoppingInput::named("x".repeat(MAX_NAME_LEN + 1), 1.0).validate().is_err());
        assert!(ShoppingInput::named("x".repeat(MAX_NAME_LEN), 1.0).validate().is_ok());
    }
}
