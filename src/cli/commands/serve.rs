use std::sync::Arc;

use anyhow::Context;
use clap::{Args, ValueEnum};

use crate::app::app;
use crate::cli::fixture;
use crate::config;
use crate::store::{MemoryStore, PostgresStore, RecordStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    Memory,
    Postgres,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[arg(long, help = "Port to listen on (defaults to $PORT or 3000)")]
    pub port: Option<u16>,

    #[arg(long, value_enum, default_value = "memory", help = "Record store backend")]
    pub store: StoreKind,

    #[arg(long, help = "Seed the demo data set into the memory store")]
    pub seed: bool,
}

pub async fn handle(args: ServeArgs) -> anyhow::Result<()> {
    let config = config::config().clone();
    tracing::info!("Starting Relations API in {:?} mode", config.environment);

    if crate::is_production!() && config.security.jwt_secret.is_empty() {
        tracing::warn!("SECURITY_JWT_SECRET is empty; bearer tokens cannot be validated");
    }

    let store: Arc<dyn RecordStore> = match args.store {
        StoreKind::Memory => {
            let store = MemoryStore::new();
            if args.seed {
                fixture::seed(&store).await.context("seeding memory store")?;
            }
            Arc::new(store)
        }
        StoreKind::Postgres => {
            if args.seed {
                tracing::warn!("--seed only applies to the memory store; ignoring");
            }
            let store = PostgresStore::connect(&config.database)
                .await
                .context("connecting to PostgreSQL")?;
            Arc::new(store)
        }
    };

    let state = fixture::demo_state(config, store).build()?;
    let router = app(state);

    let port = args
        .port
        .or_else(|| std::env::var("PORT").ok().and_then(|s| s.parse::<u16>().ok()))
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Relations API listening on http://{}", bind_addr);
    axum::serve(listener, router).await?;
    Ok(())
}
