mod auth;
mod config;
mod credits;
mod criteria;
mod db;
mod errors;
mod evaluation;
mod intake;
mod llm_client;
mod review;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::RedisSessionStore;
use crate::config::Config;
use crate::credits::postgres::PgCreditLedger;
use crate::criteria::source::load_criteria;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Committee API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (credit ledger)
    let db = create_pool(&config.database_url).await?;
    let ledger = Arc::new(PgCreditLedger::new(db, config.daily_credit_limit));
    info!(
        "Credit ledger ready (daily limit: {})",
        config.daily_credit_limit
    );

    // Initialize Redis (session lookup)
    let redis = redis::Client::open(config.redis_url.clone())?;
    let sessions = Arc::new(RedisSessionStore::new(redis));
    info!("Redis client initialized");

    // Load the school catalogue once; it is read-only from here on
    let criteria = load_criteria(&config.criteria_source, config.s3_endpoint.as_deref()).await?;

    // Initialize LLM client
    let llm = LlmClient::new(
        config.openrouter_api_key.clone(),
        config.openrouter_base_url.clone(),
    )?;
    info!(
        "LLM client initialized (gateway: {}, default model: {})",
        config.openrouter_base_url, config.default_model
    );

    let state = AppState {
        criteria: Arc::new(criteria),
        llm: Arc::new(llm),
        ledger,
        sessions,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
