use crate::model::{ModelDefinition, Record};
use crate::observer::{EventKind, ObserverPipeline, RecordEvent};
use crate::store::{RecordStore, StoreError};

/// Soft-delete state transitions with observer notification
pub struct SoftDeleteService<'a> {
    store: &'a dyn RecordStore,
    observers: &'a ObserverPipeline,
}

impl<'a> SoftDeleteService<'a> {
    pub fn new(store: &'a dyn RecordStore, observers: &'a ObserverPipeline) -> Self {
        Self { store, observers }
    }

    /// Clear the marker of a trashed row. Active rows are returned untouched.
    pub async fn restore(&self, model: &ModelDefinition, record: Record) -> Result<Record, StoreError> {
        if !record.is_trashed() {
            tracing::debug!("{} {} is not trashed; restore is a no-op", model.name, record.id);
            return Ok(record);
        }

        let restored = self.store.restore(&model.table, record.id).await?;
        tracing::info!("Restored {} {}", model.name, restored.id);
        self.notify(EventKind::Restored, model, &restored).await;
        Ok(restored)
    }

    /// Set the marker on an active row of a soft-deletable model
    pub async fn trash(&self, model: &ModelDefinition, record: Record) -> Result<Record, StoreError> {
        if !model.soft_deletes || record.is_trashed() {
            return Ok(record);
        }

        let trashed = self.store.trash(&model.table, record.id).await?;
        tracing::info!("Trashed {} {}", model.name, trashed.id);
        self.notify(EventKind::Trashed, model, &trashed).await;
        Ok(trashed)
    }

    pub async fn force_delete(&self, model: &ModelDefinition, record: Record) -> Result<Record, StoreError> {
        let deleted = self.store.force_delete(&model.table, record.id).await?;
        tracing::info!("Permanently deleted {} {}", model.name, deleted.id);
        self.notify(EventKind::ForceDeleted, model, &deleted).await;
        Ok(deleted)
    }

    async fn notify(&self, kind: EventKind, model: &ModelDefinition, record: &Record) {
        if self.observers.is_empty() {
            return;
        }
        let report = self
            .observers
            .dispatch(&RecordEvent::new(kind, model.name.clone(), record.clone()))
            .await;
        if !report.errors.is_empty() {
            tracing::warn!(
                "{} observer(s) failed for {:?} on {} {}",
                report.errors.len(),
                kind,
                model.name,
                record.id
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SoftDeleteState;
    use crate::observer::{Observer, ObserverError};
    use crate::store::{MemoryStore, TrashedScope};
    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::{json, Map, Value};
    use std::sync::{Arc, Mutex};

    struct Recorder(Arc<Mutex<Vec<(EventKind, i64)>>>);

    #[async_trait]
    impl Observer for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        async fn handle(&self, event: &RecordEvent) -> Result<(), ObserverError> {
            self.0.lock().unwrap().push((event.kind, event.record.id));
            Ok(())
        }
    }

    fn attrs(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn restore_clears_marker_and_emits_event() {
        let store = MemoryStore::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut observers = ObserverPipeline::new();
        observers.register(Recorder(events.clone()));
        let model = ModelDefinition::new("categories").soft_deletes();

        let trashed = store
            .insert("categories", attrs(json!({"name": "News"})), Some(SoftDeleteState::Trashed { since: Utc::now() }))
            .await
            .unwrap();

        let service = SoftDeleteService::new(&store, &observers);
        let restored = service.restore(&model, trashed.clone()).await.unwrap();

        assert!(!restored.is_trashed());
        let stored = store.find("categories", trashed.id, TrashedScope::Exclude).await.unwrap();
        assert!(stored.is_some());
        assert_eq!(*events.lock().unwrap(), vec![(EventKind::Restored, trashed.id)]);

        // second restore is a silent no-op
        let again = service.restore(&model, restored.clone()).await.unwrap();
        assert_eq!(again, restored);
        assert_eq!(events.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn trash_ignores_models_without_soft_deletes() {
        let store = MemoryStore::new();
        let observers = ObserverPipeline::new();
        let model = ModelDefinition::new("users");
        let user = store.insert("users", attrs(json!({"name": "ann"})), None).await.unwrap();

        let out = SoftDeleteService::new(&store, &observers).trash(&model, user.clone()).await.unwrap();
        assert_eq!(out, user);
    }

    #[tokio::test]
    async fn force_delete_removes_row() {
        let store = MemoryStore::new();
        let observers = ObserverPipeline::new();
        let model = ModelDefinition::new("categories").soft_deletes();
        let cat = store
            .insert("categories", attrs(json!({"name": "News"})), Some(SoftDeleteState::Active))
            .await
            .unwrap();

        SoftDeleteService::new(&store, &observers).force_delete(&model, cat.clone()).await.unwrap();
        assert_eq!(store.count("categories").await, 0);
    }
}
