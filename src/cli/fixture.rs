// Demo schema served by `relations-api serve`:
//   users, teams -> user, categories <-> posts, posts <-> tags via post_tag

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::{json, Map, Value};

use crate::api::{AppState, AppStateBuilder};
use crate::auth::Principal;
use crate::config::AppConfig;
use crate::model::{ModelDefinition, Record, RelationKind, SoftDeleteState};
use crate::observer::{Observer, ObserverError, RecordEvent};
use crate::policy::{Decision, Policy};
use crate::store::{RecordStore, StoreError};

/// Model definitions for the demo schema
pub fn demo_models() -> Vec<ModelDefinition> {
    vec![
        ModelDefinition::new("users").relation("teams", "teams", RelationKind::has_many("user_id")),
        ModelDefinition::new("teams").relation("user", "users", RelationKind::belongs_to("user_id")),
        ModelDefinition::new("categories")
            .soft_deletes()
            .relation("posts", "posts", RelationKind::has_many("category_id")),
        ModelDefinition::new("posts")
            .soft_deletes()
            .relation("category", "categories", RelationKind::belongs_to("category_id"))
            .relation("user", "users", RelationKind::belongs_to("user_id"))
            .relation("tags", "tags", RelationKind::belongs_to_many("post_tag", "post_id", "tag_id")),
        ModelDefinition::new("tags").soft_deletes(),
    ]
}

/// Demo state with every endpoint, policy and observer registered
pub fn demo_state(config: AppConfig, store: Arc<dyn RecordStore>) -> AppStateBuilder {
    let builder = demo_models()
        .into_iter()
        .fold(AppState::builder(config, store), |builder, model| builder.model(model));

    builder
        .resource("posts", "posts")
        .resource("categories", "categories")
        .belongs_to_resource("posts", "category")
        .belongs_to_resource("posts", "user")
        .relation_resource("posts", "tags")
        .relation_resource("categories", "posts")
        .belongs_to_resource("teams", "user")
        .policy("categories", EditorPolicy)
        .policy("posts", EditorPolicy)
        .observer(AuditLogObserver)
}

/// Anyone may view; signed-in callers may trash and restore; only principal 1 may purge
pub struct EditorPolicy;

impl Policy for EditorPolicy {
    fn view(&self, _principal: Option<&Principal>, _record: &Record) -> Decision {
        Decision::Allow
    }

    fn delete(&self, principal: Option<&Principal>, _record: &Record) -> Decision {
        principal.is_some().into()
    }

    fn restore(&self, principal: Option<&Principal>, _record: &Record) -> Decision {
        principal.is_some().into()
    }

    fn force_delete(&self, principal: Option<&Principal>, _record: &Record) -> Decision {
        match principal {
            Some(p) if p.id == 1 => Decision::Allow,
            _ => Decision::deny("Only the administrator may permanently delete records"),
        }
    }
}

/// Writes every soft-delete transition to the log
pub struct AuditLogObserver;

#[async_trait]
impl Observer for AuditLogObserver {
    fn name(&self) -> &'static str {
        "audit_log"
    }

    async fn handle(&self, event: &RecordEvent) -> Result<(), ObserverError> {
        tracing::info!(
            target: "audit",
            "{:?} {} {} at {}",
            event.kind,
            event.model,
            event.record.id,
            event.occurred_at.to_rfc3339()
        );
        Ok(())
    }
}

fn attrs(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Insert a small data set: two users, a team, two categories (one trashed),
/// three posts (one trashed) and a couple of tags.
pub async fn seed(store: &dyn RecordStore) -> Result<(), StoreError> {
    let active = Some(SoftDeleteState::Active);
    let trashed = Some(SoftDeleteState::Trashed {
        since: Utc::now() - Duration::days(1),
    });

    let admin = store.insert("users", attrs(json!({"name": "admin"})), None).await?;
    let editor = store.insert("users", attrs(json!({"name": "editor"})), None).await?;
    store
        .insert("teams", attrs(json!({"name": "core", "user_id": admin.id})), None)
        .await?;

    let news = store
        .insert("categories", attrs(json!({"name": "News", "slug": "news"})), trashed)
        .await?;
    let guides = store
        .insert("categories", attrs(json!({"name": "Guides", "slug": "guides"})), active)
        .await?;

    let launch = store
        .insert(
            "posts",
            attrs(json!({"title": "Launch day", "category_id": news.id, "user_id": admin.id})),
            active,
        )
        .await?;
    store
        .insert(
            "posts",
            attrs(json!({"title": "Getting started", "category_id": guides.id, "user_id": editor.id})),
            active,
        )
        .await?;
    store
        .insert(
            "posts",
            attrs(json!({"title": "Old announcement", "category_id": news.id, "user_id": editor.id})),
            trashed,
        )
        .await?;

    let rust = store.insert("tags", attrs(json!({"name": "rust"})), active).await?;
    let release = store.insert("tags", attrs(json!({"name": "release"})), trashed).await?;
    for tag in [&rust, &release] {
        store
            .insert("post_tag", attrs(json!({"post_id": launch.id, "tag_id": tag.id})), None)
            .await?;
    }

    tracing::info!("Seeded demo data into {} store", store.backend());
    Ok(())
}
