mod common;

use std::sync::Arc;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{builder, config, scenario, TestApp};
use relations_api::store::{MemoryStore, RecordStore, TrashedScope};

fn open_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let state = builder(config(false), store.clone()).build().expect("test state");
    TestApp::new(state, store)
}

#[tokio::test]
async fn show_resource_with_includes() -> Result<()> {
    let app = open_app();
    let (user, category, post) = scenario(&app.store).await;

    let (status, body) = app.get(&format!("/api/posts/{}?include=category,user", post.id), None).await?;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["title"], json!("Hello"));
    // the category is trashed, so the belongs-to include is empty
    assert_eq!(body["data"]["category"], Value::Null);
    assert_eq!(body["data"]["user"], user.to_value());

    let (status, _) = app.get(&format!("/api/categories/{}", category.id), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app
        .get(&format!("/api/categories/{}?with_trashed=true", category.id), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn restore_resource_clears_marker() -> Result<()> {
    let app = open_app();
    let (_, category, _) = scenario(&app.store).await;

    let (status, body) = app.post(&format!("/api/categories/{}/restore", category.id), None).await?;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["deleted_at"], Value::Null);
    assert!(app.store.find("categories", category.id, TrashedScope::Exclude).await?.is_some());
    Ok(())
}

#[tokio::test]
async fn restore_resource_requires_soft_deletes() -> Result<()> {
    let app = open_app();
    let user = common::make_user(&app.store, "ann").await;

    let (status, body) = app.post(&format!("/api/users/{}/restore", user.id), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND, "{}", body);
    Ok(())
}

#[tokio::test]
async fn unregistered_collections_are_not_found() -> Result<()> {
    let app = open_app();
    let user = common::make_user(&app.store, "ann").await;
    let team = common::make_team(&app.store, "core", &user).await;

    // teams only exposes its nested user relation
    let (status, _) = app.get(&format!("/api/teams/{}", team.id), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn root_and_health_are_public() -> Result<()> {
    let app = TestApp::with_policy();

    let (status, body) = app.get("/", None).await?;
    assert_eq!(status, StatusCode::OK);
    let relations = body["data"]["endpoints"]["relations"].as_array().cloned().unwrap_or_default();
    assert!(relations.contains(&json!("/api/posts/:id/category/:related")));

    let (status, body) = app.get("/health", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["store"], json!("memory"));
    Ok(())
}
