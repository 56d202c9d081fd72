use std::sync::Arc;

use chrono::{Local, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use models::category::guess_category;
use models::inventory::{InventoryInput, InventoryItem};
use models::shopping::{ShoppingFilter, ShoppingInput, ShoppingItem};
use models::text::singular;

use crate::errors::ServiceError;
use crate::inventory::{build_items, InventoryService};
use crate::storage::MemoryStore;

#[derive(Clone, Debug, Serialize)]
pub struct AddOutcome {
    pub item: ShoppingItem,
    /// True when the quantity was folded into an existing unpurchased entry.
    pub merged: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct CheckoutOutcome {
    pub moved: usize,
    pub inventory_items: Vec<InventoryItem>,
}

#[derive(Clone)]
pub struct ShoppingService {
    store: MemoryStore<Uuid, ShoppingItem>,
    inventory: Arc<InventoryService>,
}

impl ShoppingService {
    pub fn new(inventory: Arc<InventoryService>) -> Self {
        Self { store: MemoryStore::new(), inventory }
    }

    /// Unpurchased first, then priority high to low, then oldest first.
    pub async fn list(&self, filter: &ShoppingFilter) -> Vec<ShoppingItem> {
        let mut items: Vec<ShoppingItem> = self
            .store
            .list()
            .await
            .into_iter()
            .filter(|i| filter.purchased.map_or(true, |p| i.purchased == p))
            .collect();
        items.sort_by(|a, b| {
            a.purchased
                .cmp(&b.purchased)
                .then_with(|| b.priority.cmp(&a.priority))
                .then_with(|| a.added_at.cmp(&b.added_at))
        });
        items
    }

    pub async fn get(&self, id: Uuid) -> Result<ShoppingItem, ServiceError> {
        self.store.get(&id).await.ok_or_else(|| ServiceError::not_found("shopping item"))
    }

    pub async fn add(&self, input: ShoppingInput) -> Result<AddOutcome, ServiceError> {
        input.validate()?;
        let key = merge_key(&input.name);
        let unit = input.unit_or_default();
        let outcome = self
            .store
            .update_map(|map| {
                let existing = map
                    .values_mut()
                    .find(|i| !i.purchased && i.unit.eq_ignore_ascii_case(&unit) && merge_key(&i.name) == key);
                if let Some(item) = existing {
                    item.quantity += input.quantity;
                    if let Some(p) = input.priority {
                        item.priority = item.priority.max(p);
                    }
                    if item.note.is_none() {
                        item.note = input.note.clone();
                    }
                    return Ok(AddOutcome { item: item.clone(), merged: true });
                }
                let name = input.name.trim().to_string();
                let item = ShoppingItem {
                    id: Uuid::new_v4(),
                    category: input.category.unwrap_or_else(|| guess_category(&name)),
                    name,
                    quantity: input.quantity,
                    unit,
                    priority: input.priority.unwrap_or_default(),
                    purchased: false,
                    note: input.note.clone(),
                    added_at: Utc::now(),
                    purchased_at: None,
                };
                map.insert(item.id, item.clone());
                Ok(AddOutcome { item, merged: false })
            })
            .await?;
        info!(event = "shopping_added", id = %outcome.item.id, name = %outcome.item.name, merged = outcome.merged);
        Ok(outcome)
    }

    pub async fn update(&self, id: Uuid, input: ShoppingInput) -> Result<ShoppingItem, ServiceError> {
        input.validate()?;
        self.store
            .update_map(|map| {
                let item = map.get_mut(&id).ok_or_else(|| ServiceError::not_found("shopping item"))?;
                let name = input.name.trim().to_string();
                item.category = input.category.unwrap_or_else(|| guess_category(&name));
                item.name = name;
                item.quantity = input.quantity;
                item.unit = input.unit_or_default();
                item.priority = input.priority.unwrap_or(item.priority);
                item.note = input.note;
                Ok(item.clone())
            })
            .await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        if self.store.remove(&id).await {
            info!(event = "shopping_deleted", id = %id);
            Ok(())
        } else {
            Err(ServiceError::not_found("shopping item"))
        }
    }

    pub async fn toggle(&self, id: Uuid) -> Result<ShoppingItem, ServiceError> {
        self.store
            .update_map(|map| {
                let item = map.get_mut(&id).ok_or_else(|| ServiceError::not_found("shopping item"))?;
                item.purchased = !item.purchased;
                item.purchased_at = item.purchased.then(Utc::now);
                Ok(item.clone())
            })
            .await
    }

    pub async fn clear_purchased(&self) -> usize {
        let removed = self.store.retain(|_, i| !i.purchased).await;
        info!(event = "shopping_cleared", removed);
        removed
    }

    /// Move every purchased entry into the inventory. The inventory records are
    /// built and validated under the shopping lock, so a rejected entry leaves
    /// the list untouched.
    pub async fn checkout(&self) -> Result<CheckoutOutcome, ServiceError> {
        let today = Local::now().date_naive();
        let created = self
            .store
            .update_map(|map| {
                let purchased: Vec<&ShoppingItem> = map.values().filter(|i| i.purchased).collect();
                let inputs = purchased
                    .iter()
                    .map(|i| InventoryInput {
                        name: i.name.clone(),
                        category: Some(i.category),
                        quantity: i.quantity,
                        unit: Some(i.unit.clone()),
                        purchase_date: Some(i.purchased_at.map_or(today, |t| t.with_timezone(&Local).date_naive())),
                        ..Default::default()
                    })
                    .collect();
                let ids: Vec<Uuid> = purchased.iter().map(|i| i.id).collect();
                let items = build_items(inputs)?;
                for id in ids {
                    map.remove(&id);
                }
                Ok(items)
            })
            .await?;
        self.inventory.insert_items(&created).await?;
        info!(event = "shopping_checkout", moved = created.len());
        Ok(CheckoutOutcome { moved: created.len(), inventory_items: created })
    }

    pub async fn pending_count(&self) -> usize {
        self.store.list().await.iter().filter(|i| !i.purchased).count()
    }

    pub async fn purchased_count(&self) -> usize {
        self.store.list().await.iter().filter(|i| i.purchased).count()
    }
}

fn merge_key(name: &str) -> String {
    singular(name)
}
