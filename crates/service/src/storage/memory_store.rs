use std::{collections::HashMap, hash::Hash, sync::Arc};
use tokio::sync::RwLock;

use crate::errors::ServiceError;

/// Generic in-process key-value map store.
///
/// Wraps a `HashMap<K, V>` behind an async `RwLock` and provides simple CRUD
/// helpers. Nothing is written to disk; contents live as long as the process.
#[derive(Clone)]
pub struct MemoryStore<K, V> {
    inner: Arc<RwLock<HashMap<K, V>>>,
}

impl<K, V> Default for MemoryStore<K, V> {
    fn default() -> Self {
        Self { inner: Arc::new(RwLock::new(HashMap::new())) }
    }
}

impl<K, V> MemoryStore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// List all values (unordered).
    pub async fn list(&self) -> Vec<V> {
        let map = self.inner.read().await;
        map.values().cloned().collect()
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        let map = self.inner.read().await;
        map.get(key).cloned()
    }

    /// Insert or replace a value by key.
    pub async fn insert(&self, key: K, value: V) {
        self.inner.write().await.insert(key, value);
    }

    /// Remove a key; returns whether it existed.
    pub async fn remove(&self, key: &K) -> bool {
        self.inner.write().await.remove(key).is_some()
    }

    /// Keep only entries matching the predicate; returns how many were dropped.
    pub async fn retain<F>(&self, mut keep: F) -> usize
    where
        F: FnMut(&K, &V) -> bool,
    {
        let mut map = self.inner.write().await;
        let before = map.len();
        map.retain(|k, v| keep(k, v));
        before - map.len()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Apply a mutation to the underlying map under a single write lock.
    pub async fn update_map<F, T>(&self, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&mut HashMap<K, V>) -> Result<T, ServiceError>,
    {
        let mut map = self.inner.write().await;
        f(&mut map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_crud() -> Result<(), anyhow::Error> {
        let store = MemoryStore::<String, String>::new();
        assert_eq!(store.len().await, 0);

        store.insert("a".into(), "1".into()).await;
        store.insert("b".into(), "2".into()).await;
        assert_eq!(store.len().await, 2);
        assert_eq!(store.get(&"a".into()).await.as_deref(), Some("1"));

        let old = store
            .update_map(|m| {
                let v = m.get_mut("a").ok_or_else(|| ServiceError::not_found("a"))?;
                Ok(std::mem::replace(v, "10".into()))
            })
            .await?;
        assert_eq!(old, "1");
        assert_eq!(store.get(&"a".into()).await.as_deref(), Some("10"));

        let missing = store.update_map(|m| m.get("zz").cloned().ok_or_else(|| ServiceError::not_found("zz"))).await;
        assert!(matches!(missing, Err(ServiceError::NotFound(_))));

        assert!(store.remove(&"b".into()).await);
        assert!(!store.remove(&"b".into()).await);

        store.insert("c".into(), "3".into()).await;
        let dropped = store.retain(|_, v| v != "3").await;
        assert_eq!(dropped, 1);
        assert_eq!(store.list().await, vec!["10".to_string()]);
        Ok(())
    }
}
