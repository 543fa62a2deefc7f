//! Service entry point.

use std::time::Duration;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use printops_pricing::{pricing, AppCache, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("printops_pricing=info,tower_http=info")),
        )
        .init();

    let database_url = std::env::var("DATABASE_URL")?;
    let db = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&database_url)
        .await?;
    info!("Connected to database");

    let state = AppState {
        db,
        cache: AppCache::new(),
    };

    let app = Router::new()
        .nest("/api/pricing", pricing::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8087".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Pricing engine listening on {}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
