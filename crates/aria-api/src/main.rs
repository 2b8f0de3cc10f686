// ARIA API server: chat WebSocket, notification inbox, usage dashboard.

mod auth;
mod common;
mod llm;
mod notifications;
mod usage;
mod ws;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{routing::get, Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use aria_core::{CircuitBreaker, CircuitBreakerConfig, CostGovernor, CostGovernorConfig, RetryPolicy};
use aria_storage::{Database, DbUsageStore};
use aria_worker::{ProactiveRouter, StreamHub};

use auth::{DevTokenAuthenticator, TokenAuthenticator};
use llm::Gateway;

/// Shared state every route handler sees.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub hub: Arc<StreamHub>,
    pub router: Arc<ProactiveRouter>,
    pub gateway: Arc<Gateway>,
    pub cost_governor: Arc<CostGovernor>,
    pub authenticator: Arc<dyn TokenAuthenticator>,
    pub chat_model: &'static str,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(OpenApi)]
#[openapi(
    paths(
        notifications::list_notifications,
        notifications::mark_read,
        usage::get_usage,
    ),
    components(schemas(
        aria_contracts::delivery::NotificationRecord,
        usage::UsageSummary,
    )),
    tags(
        (name = "notifications", description = "Notification inbox endpoints"),
        (name = "usage", description = "Cost Governor usage dashboard"),
    ),
    info(
        title = "ARIA API",
        version = "0.1.0",
        description = "Chat, notifications and usage dashboard for the ARIA agentic execution core",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aria_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("aria-api starting");

    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL environment variable required")?;
    let db = Database::from_url(&database_url)
        .await
        .context("failed to connect to database")?;
    tracing::info!("connected to database");

    let hub = StreamHub::new();
    let router = Arc::new(ProactiveRouter::new(db.clone(), hub.clone()));

    let usage_store = Arc::new(DbUsageStore::new(db.clone()));
    let cost_governor_config = CostGovernorConfig::from_env().context("invalid Cost Governor config")?;
    let cost_governor = Arc::new(CostGovernor::new(cost_governor_config, usage_store));
    let circuit_breaker = CircuitBreaker::new(CircuitBreakerConfig::default());
    let retry_policy = RetryPolicy::default();

    let provider = llm::provider_from_env().context("failed to configure LLM provider")?;
    let chat_model = llm::default_chat_model(&provider);
    let gateway = Arc::new(llm::new_gateway(
        provider,
        cost_governor.clone(),
        circuit_breaker,
        retry_policy,
    ));

    let authenticator: Arc<dyn TokenAuthenticator> = Arc::new(DevTokenAuthenticator);

    let state = AppState {
        db,
        hub,
        router,
        gateway,
        cost_governor,
        authenticator,
        chat_model,
    };

    let core_routes = Router::new()
        .route("/health", get(health))
        .route("/ws/:user_id", get(ws::chat_ws_handler))
        .with_state(state.clone());

    let app = core_routes
        .merge(notifications::routes(state.clone()))
        .merge(usage::routes(state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr = "0.0.0.0:9000";
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind to address")?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
