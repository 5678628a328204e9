//! Process startup: tracing, env, shared state and the HTTP listener.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use diesel::QueryDsl;
use diesel_async::RunQueryDsl;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::{
    app_state::AppState,
    auth::{jwt, password},
    config::Config,
    db,
    models::CreateAdminEntity,
    otp::InMemoryOtpStore,
    relay::NotificationRelay,
    schema::admins,
};

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

pub fn init_env() {
    dotenvy::dotenv().ok();
}

/// Ensures one admin account exists, seeded from configuration.
async fn seed_admin(state: &AppState) -> Result<()> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let existing: i64 = admins::table
        .count()
        .get_result(conn)
        .await
        .context("Failed to count admins")?;
    if existing > 0 {
        return Ok(());
    }

    let password_hash = password::hash_password(&state.config.admin_password)
        .map_err(|e| anyhow::anyhow!("Failed to hash admin password: {e}"))?;

    diesel::insert_into(admins::table)
        .values(CreateAdminEntity {
            email: state.config.admin_email.clone(),
            password_hash,
        })
        .execute(conn)
        .await
        .context("Failed to seed admin account")?;

    tracing::info!(email = %state.config.admin_email, "Seeded admin account");
    Ok(())
}

/// Builds shared state, seeds the admin and serves the router until shutdown.
pub async fn bootstrap(service_name: &str, app: Router<AppState>, config: Config) -> Result<()> {
    jwt::init_secret(&config.jwt_secret);

    let db_pool = db::create_pool(&config.database_url).await?;
    let port = config.port;

    let state = AppState {
        db_pool,
        http_client: reqwest::Client::new(),
        otp_store: Arc::new(InMemoryOtpStore::new()),
        relay: NotificationRelay::new(),
        config: Arc::new(config),
    };

    seed_admin(&state).await?;

    let app = app.with_state(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;

    tracing::info!("{service_name} listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await.context("Server exited")?;

    Ok(())
}
