use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use horology_service::metrics::ServiceMetrics;
use horology_service::payments::{PaymentGateway, StripeGateway, StubGateway};
use horology_service::store::{InMemoryStore, MarketStore, PgStore};
use horology_service::{build_router, AppState, ServiceConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServiceConfig::from_env()?;

    let store: Arc<dyn MarketStore> = match config.database_url.as_deref() {
        Some(url) => {
            let store = PgStore::connect(url, config.database_max_connections)
                .await
                .context("failed to connect to DATABASE_URL")?;
            store.migrate().await.context("failed to run migrations")?;
            info!(max_connections = config.database_max_connections, "Connected to Postgres");
            Arc::new(store)
        }
        None => {
            warn!("DATABASE_URL not set; using in-memory store (data is lost on restart)");
            Arc::new(InMemoryStore::new())
        }
    };

    let payments: Arc<dyn PaymentGateway> = match &config.stripe {
        Some(stripe) => Arc::new(StripeGateway::new(&stripe.api_base, &stripe.secret_key)),
        None => {
            warn!("STRIPE_SECRET_KEY not set; payment intents are stubbed");
            Arc::new(StubGateway::new())
        }
    };

    let metrics = Arc::new(ServiceMetrics::new().context("failed to register metrics")?);
    let addr = config.bind_addr();
    let state = AppState::new(config, store, payments, metrics);
    let app = build_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "starting horology-service");
    axum::serve(listener, app).await?;
    Ok(())
}
