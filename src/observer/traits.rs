use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::Record;
use crate::observer::error::ObserverError;

/// Lifecycle events emitted after a soft-delete state change is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Restored,
    Trashed,
    ForceDeleted,
}

#[derive(Debug, Clone)]
pub struct RecordEvent {
    pub kind: EventKind,
    pub model: String,
    pub record: Record,
    pub occurred_at: DateTime<Utc>,
}

impl RecordEvent {
    pub fn new(kind: EventKind, model: impl Into<String>, record: Record) -> Self {
        Self {
            kind,
            model: model.into(),
            record,
            occurred_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait Observer: Send + Sync {
    /// Observer name for logging and debugging
    fn name(&self) -> &'static str;

    fn applies_to_model(&self, _model: &str) -> bool {
        true
    }

    fn applies_to_event(&self, _kind: EventKind) -> bool {
        true
    }

    /// Execution timeout (default 5 seconds)
    fn timeout(&self) -> Duration {
        Duration::from_secs(5)
    }

    async fn handle(&self, event: &RecordEvent) -> Result<(), ObserverError>;
}
