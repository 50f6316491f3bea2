#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header::AUTHORIZATION, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Map, Value};
use tower::ServiceExt;

use relations_api::api::{AppState, AppStateBuilder};
use relations_api::auth::{issue_token, Principal};
use relations_api::config::AppConfig;
use relations_api::model::{ModelDefinition, Record, RelationKind, SoftDeleteState};
use relations_api::observer::{EventKind, Observer, ObserverError, RecordEvent};
use relations_api::policy::{Decision, Policy};
use relations_api::store::{MemoryStore, RecordStore};

/// posts -> category, posts -> user, categories -> posts, teams -> user
pub fn models() -> Vec<ModelDefinition> {
    vec![
        ModelDefinition::new("posts")
            .soft_deletes()
            .relation("category", "categories", RelationKind::belongs_to("category_id"))
            .relation("user", "users", RelationKind::belongs_to("user_id")),
        ModelDefinition::new("categories")
            .soft_deletes()
            .relation("posts", "posts", RelationKind::has_many("category_id"))
            .hidden_relation("archived_posts", "posts", RelationKind::has_many("category_id")),
        ModelDefinition::new("users"),
        ModelDefinition::new("teams").relation("user", "users", RelationKind::belongs_to("user_id")),
    ]
}

pub fn config(require_authorization: bool) -> AppConfig {
    AppConfig::development().require_authorization(require_authorization)
}

/// A builder with every test model and endpoint registered but no policies
pub fn builder(config: AppConfig, store: Arc<MemoryStore>) -> AppStateBuilder {
    let store: Arc<dyn RecordStore> = store;
    models()
        .into_iter()
        .fold(AppState::builder(config, store), |b, model| b.model(model))
        .resource("posts", "posts")
        .resource("categories", "categories")
        .resource("users", "users")
        .belongs_to_resource("posts", "category")
        .belongs_to_resource("posts", "user")
        .belongs_to_resource("teams", "user")
        .relation_resource("categories", "posts")
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub config: AppConfig,
}

impl TestApp {
    pub fn new(state: AppState, store: Arc<MemoryStore>) -> Self {
        let config = (*state.config).clone();
        Self {
            router: relations_api::app(state),
            store,
            config,
        }
    }

    /// Enforcement on, CategoryPolicy registered for categories
    pub fn with_policy() -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = builder(config(true), store.clone())
            .policy("categories", CategoryPolicy)
            .build()
            .expect("test state");
        Self::new(state, store)
    }

    pub fn token(&self, id: i64, name: &str) -> String {
        let principal = Principal { id, name: name.to_string() };
        issue_token(&principal, &self.config.security.jwt_secret, 1).expect("token")
    }

    pub async fn send(&self, method: Method, uri: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        let response = self.router.clone().oneshot(request.body(Body::empty())?).await?;

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Ok((status, body))
    }

    pub async fn post(&self, uri: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.send(Method::POST, uri, token).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.send(Method::GET, uri, token).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.send(Method::DELETE, uri, token).await
    }
}

/// Views are public, restore needs any signed-in principal
pub struct CategoryPolicy;

impl Policy for CategoryPolicy {
    fn view(&self, _principal: Option<&Principal>, _record: &Record) -> Decision {
        Decision::Allow
    }

    fn delete(&self, principal: Option<&Principal>, _record: &Record) -> Decision {
        principal.is_some().into()
    }

    fn restore(&self, principal: Option<&Principal>, _record: &Record) -> Decision {
        principal.is_some().into()
    }
}

/// Refuses every ability with a message
pub struct LockedPolicy;

impl Policy for LockedPolicy {
    fn restore(&self, _principal: Option<&Principal>, _record: &Record) -> Decision {
        Decision::deny("Categories are locked")
    }
}

/// Collects every event it sees
#[derive(Clone, Default)]
pub struct EventLog(pub Arc<Mutex<Vec<(EventKind, String, i64)>>>);

impl EventLog {
    pub fn events(&self) -> Vec<(EventKind, String, i64)> {
        self.0.lock().unwrap().clone()
    }
}

#[async_trait]
impl Observer for EventLog {
    fn name(&self) -> &'static str {
        "event_log"
    }

    async fn handle(&self, event: &RecordEvent) -> Result<(), ObserverError> {
        self.0
            .lock()
            .unwrap()
            .push((event.kind, event.model.clone(), event.record.id));
        Ok(())
    }
}

fn attrs(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

fn trashed() -> Option<SoftDeleteState> {
    Some(SoftDeleteState::Trashed {
        since: Utc::now() - Duration::hours(2),
    })
}

pub async fn make_user(store: &MemoryStore, name: &str) -> Record {
    store
        .insert("users", attrs(json!({"name": name})), None)
        .await
        .expect("user")
}

pub async fn make_category(store: &MemoryStore, name: &str, is_trashed: bool) -> Record {
    let deletion = if is_trashed { trashed() } else { Some(SoftDeleteState::Active) };
    store
        .insert("categories", attrs(json!({"name": name})), deletion)
        .await
        .expect("category")
}

pub async fn make_post(store: &MemoryStore, title: &str, category: &Record, user: &Record) -> Record {
    store
        .insert(
            "posts",
            attrs(json!({"title": title, "category_id": category.id, "user_id": user.id})),
            Some(SoftDeleteState::Active),
        )
        .await
        .expect("post")
}

pub async fn make_team(store: &MemoryStore, name: &str, user: &Record) -> Record {
    store
        .insert("teams", attrs(json!({"name": name, "user_id": user.id})), None)
        .await
        .expect("team")
}

/// A user, a trashed category and a post linking them
pub async fn scenario(store: &MemoryStore) -> (Record, Record, Record) {
    let user = make_user(store, "ann").await;
    let category = make_category(store, "News", true).await;
    let post = make_post(store, "Hello", &category, &user).await;
    (user, category, post)
}
