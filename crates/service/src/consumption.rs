use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use models::consumption::{ConsumptionEntry, ConsumptionFilter, ConsumptionInput};

use crate::errors::ServiceError;
use crate::inventory::InventoryService;
use crate::nutrition::{round, NutritionService};
use crate::storage::MemoryStore;

#[derive(Clone, Debug, Serialize)]
pub struct MemberSummary {
    pub member: String,
    pub entries: usize,
    pub total_calories: f64,
    /// Most logged item names, at most three.
    pub top_items: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ConsumptionSummary {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub total_entries: usize,
    pub total_calories: f64,
    pub members: Vec<MemberSummary>,
}

/// 家庭消耗记录
#[derive(Clone)]
pub struct ConsumptionService {
    store: MemoryStore<Uuid, ConsumptionEntry>,
    inventory: Arc<InventoryService>,
    nutrition: NutritionService,
}

impl ConsumptionService {
    pub fn new(inventory: Arc<InventoryService>, nutrition: NutritionService) -> Self {
        Self { store: MemoryStore::new(), inventory, nutrition }
    }

    pub async fn log(&self, input: ConsumptionInput) -> Result<ConsumptionEntry, ServiceError> {
        input.validate()?;
        let mut item_name = input.item_name.as_deref().map(str::trim).filter(|n| !n.is_empty()).map(String::from);
        let mut unit = input.unit.clone();

        if let Some(id) = input.inventory_id {
            let outcome = self.inventory.consume(id, input.quantity).await?;
            if item_name.is_none() {
                item_name = Some(outcome.name.clone());
            }
            if unit.is_none() {
                unit = outcome.item.as_ref().map(|i| i.unit.clone());
            }
            if outcome.consumed < input.quantity {
                warn!(event = "consumption_exceeds_stock", id = %id, requested = input.quantity, available = outcome.consumed);
            }
        }
        let item_name = item_name.ok_or_else(|| ServiceError::invalid("item_name or inventory_id required"))?;
        let calories = input
            .calories
            .or_else(|| self.nutrition.estimate_calories(&item_name).map(|c| round(c * input.quantity, 1)));

        let entry = ConsumptionEntry {
            id: Uuid::new_v4(),
            member: input.member.trim().to_string(),
            item_name,
            inventory_id: input.inventory_id,
            quantity: input.quantity,
            unit: unit.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()).unwrap_or_else(|| "pcs".into()),
            meal_type: input.meal_type,
            calories,
            consumed_at: input.consumed_at.unwrap_or_else(Utc::now),
        };
        self.store.insert(entry.id, entry.clone()).await;
        info!(event = "consumption_logged", id = %entry.id, member = %entry.member, item = %entry.item_name);
        Ok(entry)
    }

    /// Newest first.
    pub async fn list(&self, filter: &ConsumptionFilter) -> Vec<ConsumptionEntry> {
        let mut entries: Vec<_> = self.store.list().await.into_iter().filter(|e| filter.matches(e)).collect();
        entries.sort_by(|a, b| b.consumed_at.cmp(&a.consumed_at));
        entries
    }

    pub async fn summary(&self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> ConsumptionSummary {
        let entries = self.list(&ConsumptionFilter { member: None, from, to }).await;
        let mut by_member: HashMap<String, Vec<&ConsumptionEntry>> = HashMap::new();
        for e in &entries {
            by_member.entry(e.member.clone()).or_default().push(e);
        }
        let mut members: Vec<MemberSummary> = by_member
            .into_iter()
            .map(|(member, list)| {
                let mut counts: HashMap<&str, usize> = HashMap::new();
                for e in &list {
                    *counts.entry(e.item_name.as_str()).or_default() += 1;
                }
                let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
                ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
                MemberSummary {
                    member,
                    entries: list.len(),
                    total_calories: round(list.iter().filter_map(|e| e.calories).sum(), 1),
                    top_items: ranked.into_iter().take(3).map(|(n, _)| n.to_string()).collect(),
                }
            })
            .collect();
        members.sort_by(|a, b| a.member.cmp(&b.member));
        ConsumptionSummary {
            from,
            to,
            total_entries: entries.len(),
            total_calories: round(members.iter().map(|m| m.total_calories).sum(), 1),
            members,
        }
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        if self.store.remove(&id).await {
            Ok(())
        } else {
            Err(ServiceError::not_found("consumption entry"))
        }
    }

    pub async fn count_since(&self, since: NaiveDate) -> usize {
        self.list(&ConsumptionFilter { member: None, from: Some(since), to: None }).await.len()
    }
}
