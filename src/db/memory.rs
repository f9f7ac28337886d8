//! In-process backend used when no database is configured, and by tests.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::RwLock;

use super::{
    filter::{Filter, Sort, Window},
    StoreError,
};

#[derive(Debug, Clone)]
struct StoredDoc {
    created_at: DateTime<Utc>,
    doc: Value,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<&'static str, HashMap<String, StoredDoc>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) async fn find(
        &self,
        collection: &'static str,
        filter: &Filter,
        sort: Sort,
        window: Window,
    ) -> Vec<Value> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Vec::new();
        };

        let mut matching: Vec<(&String, &StoredDoc)> = docs
            .iter()
            .filter(|(id, stored)| filter.matches(id, &stored.doc))
            .collect();

        match sort {
            Sort::NewestFirst => matching.sort_by(|(a_id, a), (b_id, b)| {
                b.created_at
                    .cmp(&a.created_at)
                    .then_with(|| b_id.cmp(a_id))
            }),
            Sort::NameAscending => matching.sort_by(|(a_id, a), (b_id, b)| {
                sort_name(&a.doc)
                    .cmp(&sort_name(&b.doc))
                    .then_with(|| a_id.cmp(b_id))
            }),
        }

        let skip = usize::try_from(window.skip).unwrap_or(usize::MAX);
        let take = window
            .limit
            .map(|limit| usize::try_from(limit).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);

        matching
            .into_iter()
            .skip(skip)
            .take(take)
            .map(|(_, stored)| stored.doc.clone())
            .collect()
    }

    pub(super) async fn count(&self, collection: &'static str, filter: &Filter) -> u64 {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(id, stored)| filter.matches(id, &stored.doc))
                    .count() as u64
            })
            .unwrap_or(0)
    }

    pub(super) async fn insert(
        &self,
        collection: &'static str,
        unique_fields: &[&'static str],
        id: &str,
        created_at: DateTime<Utc>,
        doc: Value,
    ) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();

        if docs.contains_key(id) || violates_unique(docs, unique_fields, id, &doc) {
            return Err(StoreError::Duplicate);
        }

        docs.insert(id.to_string(), StoredDoc { created_at, doc });
        Ok(())
    }

    pub(super) async fn update(
        &self,
        collection: &'static str,
        unique_fields: &[&'static str],
        id: &str,
        doc: Value,
    ) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(false);
        };

        if !docs.contains_key(id) {
            return Ok(false);
        }
        if violates_unique(docs, unique_fields, id, &doc) {
            return Err(StoreError::Duplicate);
        }

        if let Some(stored) = docs.get_mut(id) {
            stored.doc = doc;
        }
        Ok(true)
    }

    pub(super) async fn delete(&self, collection: &'static str, id: &str) -> bool {
        let mut collections = self.collections.write().await;
        collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .is_some()
    }
}

fn sort_name(doc: &Value) -> String {
    doc.get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_lowercase()
}

/// Mirrors the case-insensitive unique indexes of the Postgres schema.
fn violates_unique(
    docs: &HashMap<String, StoredDoc>,
    unique_fields: &[&'static str],
    id: &str,
    doc: &Value,
) -> bool {
    unique_fields.iter().any(|field| {
        let Some(value) = doc.get(*field).and_then(Value::as_str) else {
            return false;
        };
        let value = value.to_lowercase();
        docs.iter().any(|(other_id, other)| {
            other_id != id
                && other
                    .doc
                    .get(*field)
                    .and_then(Value::as_str)
                    .is_some_and(|v| v.to_lowercase() == value)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    const ITEMS: &str = "items";

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        let base = Utc::now();
        for (i, name) in ["vue", "Angular", "react"].iter().enumerate() {
            store
                .insert(
                    ITEMS,
                    &["name"],
                    &format!("id-{i}"),
                    base + Duration::seconds(i as i64),
                    json!({ "id": format!("id-{i}"), "name": name }),
                )
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_sort_by_name_is_case_insensitive() {
        let store = seeded().await;
        let docs = store
            .find(ITEMS, &Filter::all(), Sort::NameAscending, Window::all())
            .await;
        let names: Vec<&str> = docs.iter().map(|d| d["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["Angular", "react", "vue"]);
    }

    #[tokio::test]
    async fn test_newest_first_with_window() {
        let store = seeded().await;
        let docs = store
            .find(
                ITEMS,
                &Filter::all(),
                Sort::NewestFirst,
                Window {
                    skip: 1,
                    limit: Some(1),
                },
            )
            .await;
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["name"], "Angular");
    }

    #[tokio::test]
    async fn test_unique_field_rejects_case_variant() {
        let store = seeded().await;
        let result = store
            .insert(ITEMS, &["name"], "id-9", Utc::now(), json!({ "name": "REACT" }))
            .await;
        assert!(matches!(result, Err(StoreError::Duplicate)));
        assert_eq!(store.count(ITEMS, &Filter::all()).await, 3);
    }

    #[tokio::test]
    async fn test_update_may_keep_own_unique_value() {
        let store = seeded().await;
        let updated = store
            .update(ITEMS, &["name"], "id-2", json!({ "name": "React" }))
            .await
            .unwrap();
        assert!(updated);
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_document() {
        let store = seeded().await;
        let updated = store
            .update(ITEMS, &[], "missing", json!({}))
            .await
            .unwrap();
        assert!(!updated);
        assert!(!store.delete(ITEMS, "missing").await);
        assert!(store.delete(ITEMS, "id-0").await);
        assert_eq!(store.count(ITEMS, &Filter::all()).await, 2);
    }
}
