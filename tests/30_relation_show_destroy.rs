mod common;

use std::sync::Arc;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::{builder, config, scenario, EventLog, TestApp};
use relations_api::observer::EventKind;
use relations_api::store::{MemoryStore, RecordStore, TrashedScope};

fn open_app() -> (TestApp, EventLog) {
    let store = Arc::new(MemoryStore::new());
    let events = EventLog::default();
    let state = builder(config(false), store.clone())
        .observer(events.clone())
        .build()
        .expect("test state");
    (TestApp::new(state, store), events)
}

#[tokio::test]
async fn show_hides_trashed_rows_unless_asked() -> Result<()> {
    let (app, _) = open_app();
    let (_, category, post) = scenario(&app.store).await;
    let uri = format!("/api/posts/{}/category/{}", post.id, category.id);

    let (status, _) = app.get(&uri, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.get(&format!("{}?with_trashed=true", uri), None).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(body["data"]["deleted_at"].is_string());
    Ok(())
}

#[tokio::test]
async fn malformed_flags_are_bad_requests() -> Result<()> {
    let (app, events) = open_app();
    let (_, category, post) = scenario(&app.store).await;
    let uri = format!("/api/posts/{}/category/{}", post.id, category.id);

    let (status, body) = app.get(&format!("{}?with_trashed=yes", uri), None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
    assert_eq!(body["code"], json!("BAD_REQUEST"));

    let (status, _) = app.delete(&format!("{}?force=always", uri), None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(events.events().is_empty());
    Ok(())
}

#[tokio::test]
async fn show_requires_a_principal_when_enforced() -> Result<()> {
    let app = TestApp::with_policy();
    let user = common::make_user(&app.store, "ann").await;
    let category = common::make_category(&app.store, "Live", false).await;
    let post = common::make_post(&app.store, "Hello", &category, &user).await;
    let uri = format!("/api/posts/{}/category/{}", post.id, category.id);

    let (status, _) = app.get(&uri, None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let token = app.token(user.id, "ann");
    let (status, body) = app.get(&uri, Some(&token)).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["name"], json!("Live"));
    Ok(())
}

#[tokio::test]
async fn show_embeds_singular_includes() -> Result<()> {
    let (app, _) = open_app();
    let user = common::make_user(&app.store, "ann").await;
    let live = common::make_category(&app.store, "Live", false).await;
    let post = common::make_post(&app.store, "First", &live, &user).await;

    let (status, body) = app
        .get(&format!("/api/categories/{}/posts/{}?include=category,user", live.id, post.id), None)
        .await?;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["title"], json!("First"));
    assert_eq!(body["data"]["category"], live.to_value());
    assert_eq!(body["data"]["user"], user.to_value());
    Ok(())
}

#[tokio::test]
async fn destroy_trashes_soft_deletable_targets() -> Result<()> {
    let (app, events) = open_app();
    let user = common::make_user(&app.store, "ann").await;
    let category = common::make_category(&app.store, "Live", false).await;
    let post = common::make_post(&app.store, "Hello", &category, &user).await;
    let uri = format!("/api/posts/{}/category/{}", post.id, category.id);

    let (status, body) = app.delete(&uri, None).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(body["data"]["deleted_at"].is_string());
    assert!(app.store.find("categories", category.id, TrashedScope::Only).await?.is_some());

    // already trashed rows are only reachable with force
    let (status, _) = app.delete(&uri, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(events.events(), vec![(EventKind::Trashed, "categories".to_string(), category.id)]);
    Ok(())
}

#[tokio::test]
async fn force_destroy_removes_trashed_rows() -> Result<()> {
    let (app, events) = open_app();
    let (_, category, post) = scenario(&app.store).await;

    let uri = format!("/api/posts/{}/category/{}?force=true", post.id, category.id);
    let (status, body) = app.delete(&uri, None).await?;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["id"], json!(category.id));
    assert_eq!(app.store.count("categories").await, 0);
    assert_eq!(
        events.events(),
        vec![(EventKind::ForceDeleted, "categories".to_string(), category.id)]
    );
    Ok(())
}

#[tokio::test]
async fn force_destroy_needs_its_own_ability() -> Result<()> {
    let app = TestApp::with_policy();
    let (user, category, post) = scenario(&app.store).await;
    let token = app.token(user.id, "ann");

    let uri = format!("/api/posts/{}/category/{}?force=true", post.id, category.id);
    let (status, _) = app.delete(&uri, Some(&token)).await?;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(app.store.count("categories").await, 1);
    Ok(())
}

#[tokio::test]
async fn destroy_removes_targets_without_soft_deletes() -> Result<()> {
    let (app, events) = open_app();
    let user = common::make_user(&app.store, "ann").await;
    let team = common::make_team(&app.store, "core", &user).await;

    let (status, body) = app
        .delete(&format!("/api/teams/{}/user/{}", team.id, user.id), None)
        .await?;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(body["data"].get("deleted_at").is_none());
    assert_eq!(app.store.count("users").await, 0);
    assert_eq!(events.events(), vec![(EventKind::ForceDeleted, "users".to_string(), user.id)]);
    Ok(())
}
