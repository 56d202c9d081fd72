use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use models::category::Category;
use models::inventory::{InventoryFilter, InventoryInput, InventoryItem, InventoryView};

use crate::errors::ServiceError;
use crate::storage::MemoryStore;

/// Result of taking some amount out of an inventory item.
#[derive(Clone, Debug, Serialize)]
pub struct ConsumeOutcome {
    pub id: Uuid,
    pub name: String,
    pub consumed: f64,
    pub remaining: f64,
    /// True when the item hit zero and was removed.
    pub removed: bool,
    pub item: Option<InventoryItem>,
}

/// 库存服务：内存中的食材记录
#[derive(Clone, Default)]
pub struct InventoryService {
    store: MemoryStore<Uuid, InventoryItem>,
}

impl InventoryService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw records, unordered.
    pub async fn all(&self) -> Vec<InventoryItem> {
        self.store.list().await
    }

    pub async fn list(&self, filter: &InventoryFilter, today: NaiveDate) -> Vec<InventoryView> {
        let category = filter.category.as_deref().and_then(Category::parse);
        let location = filter.location.as_deref().map(str::trim).filter(|l| !l.is_empty());
        let search = filter.search.as_deref().map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty());

        let mut items: Vec<InventoryView> = self
            .store
            .list()
            .await
            .into_iter()
            .filter(|i| category.map_or(true, |c| i.category == c))
            .filter(|i| location.map_or(true, |l| i.location.eq_ignore_ascii_case(l)))
            .filter(|i| search.as_deref().map_or(true, |s| i.name.to_lowercase().contains(s)))
            .map(|i| i.view(today))
            .filter(|v| match filter.expiring_within_days {
                Some(days) => v.days_until_expiry.is_some_and(|d| d <= days),
                None => true,
            })
            .collect();
        sort_by_expiry(&mut items);
        items
    }

    pub async fn get(&self, id: Uuid) -> Result<InventoryItem, ServiceError> {
        self.store.get(&id).await.ok_or_else(|| ServiceError::not_found("inventory item"))
    }

    pub async fn create(&self, input: InventoryInput) -> Result<InventoryItem, ServiceError> {
        let item = input.into_item(Uuid::new_v4(), Utc::now())?;
        self.store.insert(item.id, item.clone()).await;
        info!(event = "inventory_created", id = %item.id, name = %item.name, category = %item.category);
        Ok(item)
    }

    /// All-or-nothing: one invalid input means nothing is stored.
    pub async fn create_many(&self, inputs: Vec<InventoryInput>) -> Result<Vec<InventoryItem>, ServiceError> {
        let items = build_items(inputs)?;
        self.insert_items(&items).await?;
        Ok(items)
    }

    /// Store records that were already built and validated.
    pub async fn insert_items(&self, items: &[InventoryItem]) -> Result<(), ServiceError> {
        self.store
            .update_map(|map| {
                for item in items {
                    map.insert(item.id, item.clone());
                }
                Ok(())
            })
            .await?;
        info!(event = "inventory_bulk_created", count = items.len());
        Ok(())
    }

    /// Replace every mutable field; id and `added_at` are kept.
    pub async fn update(&self, id: Uuid, input: InventoryInput) -> Result<InventoryItem, ServiceError> {
        self.store
            .update_map(|map| {
                let existing = map.get_mut(&id).ok_or_else(|| ServiceError::not_found("inventory item"))?;
                let updated = input.into_item(id, existing.added_at)?;
                *existing = updated.clone();
                Ok(updated)
            })
            .await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        if self.store.remove(&id).await {
            info!(event = "inventory_deleted", id = %id);
            Ok(())
        } else {
            Err(ServiceError::not_found("inventory item"))
        }
    }

    /// Decrease quantity; the item is removed once nothing is left.
    pub async fn consume(&self, id: Uuid, amount: f64) -> Result<ConsumeOutcome, ServiceError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(ServiceError::invalid("amount must be > 0"));
        }
        let outcome = self
            .store
            .update_map(|map| {
                let item = map.get_mut(&id).ok_or_else(|| ServiceError::not_found("inventory item"))?;
                let consumed = amount.min(item.quantity);
                item.quantity = round2(item.quantity - amount);
                if item.quantity <= 0.0 {
                    let gone = map.remove(&id).ok_or_else(|| ServiceError::not_found("inventory item"))?;
                    return Ok(ConsumeOutcome { id, name: gone.name, consumed, remaining: 0.0, removed: true, item: None });
                }
                Ok(ConsumeOutcome {
                    id,
                    name: item.name.clone(),
                    consumed,
                    remaining: item.quantity,
                    removed: false,
                    item: Some(item.clone()),
                })
            })
            .await?;
        info!(event = "inventory_consumed", id = %id, amount, removed = outcome.removed);
        Ok(outcome)
    }

    /// Items expiring within `days` (already expired ones included), soonest first.
    pub async fn expiring(&self, days: i64, today: NaiveDate) -> Vec<InventoryView> {
        let filter = InventoryFilter { expiring_within_days: Some(days), ..Default::default() };
        self.list(&filter, today).await
    }

    pub async fn count(&self) -> usize {
        self.store.len().await
    }
}

/// Soonest expiry first, undated items last, then by name.
/// Validate and build every record before anything touches a store.
pub(crate) fn build_items(inputs: Vec<InventoryInput>) -> Result<Vec<InventoryItem>, ServiceError> {
    let now = Utc::now();
    Ok(inputs
        .into_iter()
        .map(|i| i.into_item(Uuid::new_v4(), now))
        .collect::<Result<Vec<_>, _>>()?)
}

pub(crate) fn sort_by_expiry(items: &mut [InventoryView]) {
    items.sort_by(|a, b| {
        let ka = (a.item.expiry_date.is_none(), a.item.expiry_date);
        let kb = (b.item.expiry_date.is_none(), b.item.expiry_date);
        ka.cmp(&kb).then_with(|| a.item.name.to_lowercase().cmp(&b.item.name.to_lowercase()))
    });
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn day(s: &str) -> NaiveDate { NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap() }

    fn dated(name: &str, expiry: Option<NaiveDate>) -> InventoryInput {
        InventoryInput { expiry_date: expiry, ..InventoryInput::named(name, 2.0) }
    }

    #[tokio::test]
    async fn list_sorts_and_filters() {
        let svc = InventoryService::new();
        let today = day("2024-04-10");
        svc.create(dated("Rice", None)).await.unwrap();
        svc.create(dated("Milk", Some(today + Duration::days(2)))).await.unwrap();
        svc.create(dated("Spinach", Some(today - Duration::days(1)))).await.unwrap();
        svc.create(dated("Cheddar", Some(today + Duration::days(20)))).await.unwrap();

        let all = svc.list(&InventoryFilter::default(), today).await;
        let names: Vec<_> = all.iter().map(|v| v.item.name.as_str()).collect();
        assert_eq!(names, vec!["Spinach", "Milk", "Cheddar", "Rice"]);

        let dairy = svc.list(&InventoryFilter { category: Some("dairy".into()), ..Default::default() }, today).await;
        assert_eq!(dairy.len(), 2);

        let search = svc.list(&InventoryFilter { search: Some("SPIN".into()), ..Default::default() }, today).await;
        assert_eq!(search.len(), 1);

        let expiring = svc.expiring(3, today).await;
        let names: Vec<_> = expiring.iter().map(|v| v.item.name.as_str()).collect();
        assert_eq!(names, vec!["Spinach", "Milk"]);
    }

    #[tokio::test]
    async fn consume_decrements_then_removes() {
        let svc = InventoryService::new();
        let item = svc.create(InventoryInput::named("Eggs", 3.0)).await.unwrap();

        let first = svc.consume(item.id, 1.0).await.unwrap();
        assert!(!first.removed);
        assert_eq!(first.remaining, 2.0);

        let second = svc.consume(item.id, 5.0).await.unwrap();
        assert!(second.removed);
        assert_eq!(second.consumed, 2.0);
        assert!(matches!(svc.get(item.id).await, Err(ServiceError::NotFound(_))));

        assert!(matches!(svc.consume(item.id, 1.0).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(svc.consume(Uuid::new_v4(), 0.0).await, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn update_keeps_identity() {
        let svc = InventoryService::new();
        let item = svc.create(InventoryInput::named("Yoghurt", 1.0)).await.unwrap();
        let updated = svc
            .update(item.id, InventoryInput { location: Some("fridge".into()), ..InventoryInput::named("Greek Yoghurt", 4.0) })
            .await
            .unwrap();
        assert_eq!(updated.id, item.id);
        assert_eq!(updated.added_at, item.added_at);
        assert_eq!(updated.location, "fridge");
        assert_eq!(updated.quantity, 4.0);

        assert!(svc.update(Uuid::new_v4(), InventoryInput::named("x", 1.0)).await.is_err());
        svc.delete(item.id).await.unwrap();
        assert!(svc.delete(item.id).await.is_err());
    }

    #[tokio::test]
    async fn invalid_input_is_rejected() {
        let svc = InventoryService::new();
        let err = svc.create(InventoryInput::named("", 1.0)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Model(_)));
        assert_eq!(svc.count().await, 0);
    }
}
