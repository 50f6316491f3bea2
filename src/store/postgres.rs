use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::{postgres::PgArguments, postgres::PgPoolOptions, PgPool, Row};
use tracing::info;

use super::{validate_identifier, RecordStore, StoreError, TrashedScope};
use crate::config::DatabaseConfig;
use crate::model::{Record, SoftDeleteState, DELETED_AT};

/// PostgreSQL-backed store. Soft-deletable tables carry a nullable
/// `deleted_at timestamptz` column and an `updated_at` column.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let raw = config
            .url
            .as_deref()
            .ok_or(StoreError::ConfigMissing("DATABASE_URL"))?;
        let url = url::Url::parse(raw).map_err(|_| StoreError::InvalidDatabaseUrl)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url.as_str())
            .await?;

        info!(
            "Connected to PostgreSQL at {}{}",
            url.host_str().unwrap_or("localhost"),
            url.path()
        );
        Ok(Self { pool })
    }

    async fn fetch_optional(&self, sql: &str, params: &[Value]) -> Result<Option<Record>, StoreError> {
        let mut q = sqlx::query(sql);
        for p in params {
            q = bind_param(q, p);
        }
        match q.fetch_optional(&self.pool).await? {
            Some(row) => Ok(Some(decode_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn fetch_required(&self, sql: &str, params: &[Value], what: String) -> Result<Record, StoreError> {
        let record = self.fetch_optional(sql, params).await?;
        record.ok_or(StoreError::NotFound(what))
    }
}

fn quote(name: &str) -> Result<String, StoreError> {
    validate_identifier(name)?;
    Ok(format!("\"{}\"", name))
}

fn scope_sql(scope: TrashedScope) -> String {
    match scope {
        TrashedScope::Include => String::new(),
        TrashedScope::Exclude => format!(" AND \"{}\" IS NULL", DELETED_AT),
        TrashedScope::Only => format!(" AND \"{}\" IS NOT NULL", DELETED_AT),
    }
}

fn select_sql(table: &str, column: &str, scope: TrashedScope) -> Result<String, StoreError> {
    Ok(format!(
        "SELECT row_to_json(t) AS row FROM (SELECT * FROM {} WHERE {} = $1{} ORDER BY \"id\") t",
        quote(table)?,
        quote(column)?,
        scope_sql(scope)
    ))
}

/// INSERT statement plus its parameters. JSON nulls are written as SQL
/// `NULL` literals so they take the column's type instead of a bound text type.
fn insert_sql(table: &str, attributes: &Map<String, Value>) -> Result<(String, Vec<Value>), StoreError> {
    let table = quote(table)?;
    if attributes.is_empty() {
        return Ok((
            format!("INSERT INTO {} AS t DEFAULT VALUES RETURNING row_to_json(t) AS row", table),
            Vec::new(),
        ));
    }

    let mut names = Vec::with_capacity(attributes.len());
    let mut values = Vec::with_capacity(attributes.len());
    let mut params = Vec::new();
    for (column, value) in attributes {
        names.push(quote(column)?);
        if value.is_null() {
            values.push("NULL".to_string());
        } else {
            params.push(value.clone());
            values.push(format!("${}", params.len()));
        }
    }

    let sql = format!(
        "INSERT INTO {} AS t ({}) VALUES ({}) RETURNING row_to_json(t) AS row",
        table,
        names.join(", "),
        values.join(", ")
    );
    Ok((sql, params))
}

fn decode_row(row: &sqlx::postgres::PgRow) -> Result<Record, StoreError> {
    let value: Value = row.try_get("row")?;
    Ok(Record::from_row(value)?)
}

fn bind_param<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        // Builders inline nulls; a bound null is text-typed
        Value::Null => q.bind(Option::<String>::None),
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s.as_str()),
        Value::Array(_) | Value::Object(_) => q.bind(v.clone()), // JSONB
    }
}

#[async_trait]
impl RecordStore for PostgresStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn find(&self, table: &str, id: i64, scope: TrashedScope) -> Result<Option<Record>, StoreError> {
        let sql = select_sql(table, "id", scope)?;
        let record = self.fetch_optional(&sql, &[Value::from(id)]).await?;
        Ok(record)
    }

    async fn find_by(
        &self,
        table: &str,
        column: &str,
        value: &Value,
        scope: TrashedScope,
    ) -> Result<Vec<Record>, StoreError> {
        if value.is_null() {
            return Ok(Vec::new());
        }
        let sql = select_sql(table, column, scope)?;
        let rows = bind_param(sqlx::query(&sql), value).fetch_all(&self.pool).await?;
        rows.iter().map(decode_row).collect()
    }

    async fn insert(
        &self,
        table: &str,
        mut attributes: Map<String, Value>,
        deletion: Option<SoftDeleteState>,
    ) -> Result<Record, StoreError> {
        if let Some(SoftDeleteState::Trashed { since }) = deletion {
            attributes.insert(DELETED_AT.into(), Value::String(since.to_rfc3339()));
        }
        let (sql, params) = insert_sql(table, &attributes)?;

        let mut q = sqlx::query(&sql);
        for p in &params {
            q = bind_param(q, p);
        }
        let row = q.fetch_one(&self.pool).await?;
        decode_row(&row)
    }

    async fn restore(&self, table: &str, id: i64) -> Result<Record, StoreError> {
        let sql = format!(
            "UPDATE {} AS t SET \"{}\" = NULL, \"updated_at\" = NOW() WHERE \"id\" = $1 RETURNING row_to_json(t) AS row",
            quote(table)?,
            DELETED_AT
        );
        let record = self
            .fetch_required(&sql, &[Value::from(id)], format!("{} {} not found", table, id))
            .await?;
        Ok(record)
    }

    async fn trash(&self, table: &str, id: i64) -> Result<Record, StoreError> {
        let sql = format!(
            "UPDATE {} AS t SET \"{}\" = NOW(), \"updated_at\" = NOW() WHERE \"id\" = $1 RETURNING row_to_json(t) AS row",
            quote(table)?,
            DELETED_AT
        );
        let record = self
            .fetch_required(&sql, &[Value::from(id)], format!("{} {} not found", table, id))
            .await?;
        Ok(record)
    }

    async fn force_delete(&self, table: &str, id: i64) -> Result<Record, StoreError> {
        let sql = format!(
            "DELETE FROM {} AS t WHERE \"id\" = $1 RETURNING row_to_json(t) AS row",
            quote(table)?
        );
        let record = self
            .fetch_required(&sql, &[Value::from(id)], format!("{} {} not found", table, id))
            .await?;
        Ok(record)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
