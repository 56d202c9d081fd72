use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::category::{guess_category, Category};
use crate::errors::ModelError;

pub const MAX_NAME_LEN: usize = 100;
/// Items at or below this many days are flagged as expiring soon.
pub const EXPIRING_SOON_DAYS: i64 = 3;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: Uuid,
    pub name: String,
    pub category: Category,
    pub quantity: f64,
    pub unit: String,
    pub location: String,
    pub expiry_date: Option<NaiveDate>,
    pub purchase_date: Option<NaiveDate>,
    pub price: Option<f64>,
    pub barcode: Option<String>,
    pub added_at: DateTime<Utc>,
}

/// 创建/更新输入：不包含 id/added_at，由服务端生成
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryInput {
    pub name: String,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default = "default_quantity")]
    pub quantity: f64,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub purchase_date: Option<NaiveDate>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub barcode: Option<String>,
}

fn default_quantity() -> f64 { 1.0 }

impl InventoryInput {
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
        if !self.quantity.is_finite() || self.quantity < 0.0 {
            return Err(ModelError::invalid("quantity must be >= 0"));
        }
        if let Some(p) = self.price {
            if !p.is_finite() || p < 0.0 {
                return Err(ModelError::invalid("price must be >= 0"));
            }
        }
        Ok(())
    }

    /// Build a full record. Category is guessed when absent; expiry falls back to
    /// purchase date plus the category's shelf life.
    pub fn into_item(self, id: Uuid, added_at: DateTime<Utc>) -> Result<InventoryItem, ModelError> {
        self.validate()?;
        let name = self.name.trim().to_string();
        let category = self.category.unwrap_or_else(|| guess_category(&name));
        let expiry_date = self
            .expiry_date
            .or_else(|| self.purchase_date.map(|d| default_expiry(category, d)));
        Ok(InventoryItem {
            id,
            name,
            category,
            quantity: self.quantity,
            unit: non_blank(self.unit).unwrap_or_else(|| "pcs".into()),
            location: non_blank(self.location).unwrap_or_else(|| "pantry".into()),
            expiry_date,
            purchase_date: self.purchase_date,
            price: self.price,
            barcode: non_blank(self.barcode),
            added_at,
        })
    }
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

pub fn default_expiry(category: Category, from: NaiveDate) -> NaiveDate {
    from + Duration::days(category.shelf_life_days())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryStatus {
    Expired,
    ExpiringSoon,
    Fresh,
    Unknown,
}

impl ExpiryStatus {
    pub fn from_days(days: Option<i64>) -> Self {
        match days {
            None => ExpiryStatus::Unknown,
            Some(d) if d < 0 => ExpiryStatus::Expired,
            Some(d) if d <= EXPIRING_SOON_DAYS => ExpiryStatus::ExpiringSoon,
            Some(_) => ExpiryStatus::Fresh,
        }
    }
}

impl InventoryItem {
    /// Whole calendar days from `today` to expiry; negative once past.
    pub fn days_until_expiry(&self, today: NaiveDate) -> Option<i64> {
        self.expiry_date.map(|d| (d - today).num_days())
    }

    pub fn status(&self, today: NaiveDate) -> ExpiryStatus {
        ExpiryStatus::from_days(self.days_until_expiry(today))
    }

    pub fn view(&self, today: NaiveDate) -> InventoryView {
        let days = self.days_until_expiry(today);
        InventoryView { item: self.clone(), days_until_expiry: days, status: ExpiryStatus::from_days(days) }
    }
}

/// Output shape: the record plus values derived against today's date.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InventoryView {
    #[serde(flatten)]
    pub item: InventoryItem,
    pub days_until_expiry: Option<i64>,
    pub status: ExpiryStatus,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct InventoryFilter {
    pub category: Option<String>,
    pub location: Option<String>,
    pub search: Option<String>,
    pub expiring_within_days: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate { NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap() }

    #[test]
    fn defaults_and_guessing() {
        let item = InventoryInput::named("  Greek Yogurt ", 2.0).into_item(Uuid::new_v4(), Utc::now()).unwrap();
        assert_eq!(item.name, "Greek Yogurt");
        assert_eq!(item.category, Category::Dairy);
        assert_eq!(item.unit, "pcs");
        assert_eq!(item.location, "pantry");
        assert!(item.expiry_date.is_none());
    }

    #[test]
    fn expiry_from_purchase_date() {
        let mut input = InventoryInput::named("Chicken Thighs", 1.0);
        input.purchase_date = Some(day("2024-03-01"));
        let item = input.into_item(Uuid::new_v4(), Utc::now()).unwrap();
        assert_eq!(item.expiry_date, Some(day("2024-03-05")));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(InventoryInput::named("   ", 1.0).validate().is_err());
        assert!(InventoryInput::named("x", -1.0).validate().is_err());
        assert!(InventoryInput::named("x".repeat(101), 1.0).validate().is_err());
        assert!(InventoryInput::named("x", 0.0).validate().is_ok());
    }

    #[test]
    fn status_bands() {
        let mut item = InventoryInput::named("Milk", 1.0).into_item(Uuid::new_v4(), Utc::now()).unwrap();
        let today = day("2024-05-10");
        assert_eq!(item.status(today), ExpiryStatus::Unknown);
        item.expiry_date = Some(day("2024-05-09"));
        assert_eq!(item.status(today), ExpiryStatus::Expired);
        assert_eq!(item.days_until_expiry(today), Some(-1));
        item.expiry_date = Some(day("2024-05-10"));
        assert_eq!(item.status(today), ExpiryStatus::ExpiringSoon);
        item.expiry_date = Some(day("2024-05-13"));
        assert_eq!(item.status(today), ExpiryStatus::ExpiringSoon);
        item.expiry_date = Some(day("2024-05-14"));
        assert_eq!(item.status(today), ExpiryStatus::Fresh);
    }

    #[test]
    fn view_flattens_record() {
        let item = InventoryInput::named("Apples", 3.0).into_item(Uuid::new_v4(), Utc::now()).unwrap();
        let v = serde_json::to_value(item.view(day("2024-01-01"))).unwrap();
        assert_eq!(v["name"], "Apples");
        assert_eq!(v["category"], "produce");
        assert_eq!(v["status"], "unknown");
    }
}
