pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::model::{Record, RecordError, SoftDeleteState};

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Which rows a read may return with respect to the soft-delete marker.
/// Tables without a marker must be read with `Include`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrashedScope {
    Exclude,
    Include,
    Only,
}

impl TrashedScope {
    pub fn admits(&self, record: &Record) -> bool {
        match self {
            TrashedScope::Include => true,
            TrashedScope::Exclude => !record.is_trashed(),
            TrashedScope::Only => record.is_trashed(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Malformed row: {0}")]
    MalformedRow(#[from] RecordError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Persistence seam for every table the API exposes
#[async_trait]
pub trait RecordStore: Send + Sync {
    fn backend(&self) -> &'static str;

    async fn find(&self, table: &str, id: i64, scope: TrashedScope) -> Result<Option<Record>, StoreError>;

    /// Rows whose `column` equals `value`, ordered by id
    async fn find_by(
        &self,
        table: &str,
        column: &str,
        value: &Value,
        scope: TrashedScope,
    ) -> Result<Vec<Record>, StoreError>;

    /// Insert a row; `deletion` is `None` for tables without a soft-delete marker
    async fn insert(
        &self,
        table: &str,
        attributes: Map<String, Value>,
        deletion: Option<SoftDeleteState>,
    ) -> Result<Record, StoreError>;

    /// Clear the soft-delete marker and touch `updated_at`
    async fn restore(&self, table: &str, id: i64) -> Result<Record, StoreError>;

    /// Set the soft-delete marker to now
    async fn trash(&self, table: &str, id: i64) -> Result<Record, StoreError>;

    /// Remove the row permanently, returning its last state
    async fn force_delete(&self, table: &str, id: i64) -> Result<Record, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

/// Reject identifiers that could escape quoting
pub fn validate_identifier(name: &str) -> Result<(), StoreError> {
    let valid = !name.is_empty()
        && name.len() <= 63
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidIdentifier(name.to_string()))
    }
}
