use anyhow::Context;
use axum::{extract::State, routing::get, Json, Router};
use std::sync::Arc;
use tokio::sync::mpsc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use herald::{
    BroadcastHub, ContentCache, DispatchQueue, FetchDedupCache, IdentifierCodec, InboundEvent,
    PlatformGateway, Topic,
};
use herald_integration_discord::{build_client, ContentMapper, DiscordIntegration};

mod adapters;
mod application;
mod config;
mod models;
mod routes;

use adapters::{AssetPolicy, HttpAssetFetcher};
use application::RelayService;
use config::RelayConfig;
use models::HealthCheck;

/// Inbound events buffered between the gateway and the relay
const INBOUND_BUFFER: usize = 1024;

/// Type aliases for application services with concrete adapter implementations
pub type AppRelayService = RelayService<dyn PlatformGateway>;
pub type AppAssetCache = FetchDedupCache<HttpAssetFetcher>;

/// Application state shared across all routes
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<AppRelayService>,
    pub assets: Arc<AppAssetCache>,
    pub asset_policy: Arc<AssetPolicy>,
}

/// Health check
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Relay status", body = HealthCheck)),
    tag = "Health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthCheck> {
    let hub = state.relay.hub();
    Json(HealthCheck {
        status: "ok".to_string(),
        message: "Herald is relaying".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        platform: state.relay.platform_name().map(str::to_string),
        platform_healthy: state.relay.platform_healthy().await,
        embed_subscribers: hub.subscriber_count(Topic::Embeds),
        message_subscribers: hub.subscriber_count(Topic::Messages),
        pending_dispatches: state.relay.pending_dispatches(),
    })
}

/// Build the router with shared state
pub fn app(state: AppState) -> Router {
    // OpenAPI documentation
    let openapi = routes::swagger::ApiDoc::openapi();

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
        .route("/health", get(health_check))
        .merge(routes::embeds::router())
        .merge(routes::controls::router())
        .merge(routes::messages::router())
        .merge(routes::ws::router())
        .merge(routes::assets::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,herald=debug")),
        )
        .init();

    tracing::info!("📣 Herald relay initializing...");

    let config = RelayConfig::from_env().context("Invalid configuration")?;

    // Relay core
    let cache = Arc::new(ContentCache::new(config.cache()));
    let hub = Arc::new(BroadcastHub::new(cache, config.hub()));
    hub.start_heartbeat();
    let dispatch = DispatchQueue::new(config.dispatch());
    let mapper = Arc::new(ContentMapper::new(config.rsvp_emojis.clone()));

    // Chat platform
    let mut inbound: Option<mpsc::Receiver<InboundEvent>> = None;
    let gateway: Option<Arc<dyn PlatformGateway>> = match config.discord() {
        Some(discord) => {
            let integration = DiscordIntegration::new(&discord, mapper.clone());
            let (events_tx, events_rx) = mpsc::channel(INBOUND_BUFFER);
            let mut client = build_client(discord, mapper.clone(), events_tx)
                .await
                .context("Failed to build Discord client")?;

            tokio::spawn(async move {
                if let Err(e) = client.start().await {
                    tracing::error!("❌ Discord gateway stopped: {}", e);
                }
            });

            tracing::info!("🤖 Discord gateway starting");
            inbound = Some(events_rx);
            Some(Arc::new(integration))
        }
        None => {
            tracing::warn!("⚠️  No DISCORD_TOKEN set - outbound routes disabled");
            None
        }
    };

    let relay = Arc::new(RelayService::new(
        hub,
        dispatch,
        gateway,
        IdentifierCodec::default(),
        mapper,
    ));

    if let Some(events) = inbound {
        tokio::spawn(relay.clone().run_inbound(events));
    }

    // Asset proxy
    let fetcher = HttpAssetFetcher::new(config.asset_timeout)?;
    let state = AppState {
        relay: relay.clone(),
        assets: Arc::new(FetchDedupCache::new(fetcher, config.fetch_cache())),
        asset_policy: Arc::new(AssetPolicy::new(config.asset_hosts.clone())),
    };

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;

    tracing::info!("📚 Swagger UI: /swagger-ui");
    tracing::info!("✅ Herald ready on {}", config.bind_addr);

    axum::serve(listener, app(state.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    relay.shutdown().await;
    state.assets.clear();
    tracing::info!("👋 Herald stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("🛑 Shutdown requested");
}

#[cfg(test)]
mod test_support {
    use super::*;
    use crate::application::testing::{service, FakeGateway};
    use axum::body::Body;
    use axum::http::{header, Request};
    use axum::response::Response;
    use herald::FetchCacheConfig;
    use serde::de::DeserializeOwned;
    use std::time::Duration;

    pub fn test_state(gateway: Option<Arc<FakeGateway>>) -> AppState {
        let gateway = gateway.map(|g| g as Arc<dyn PlatformGateway>);
        AppState {
            relay: Arc::new(service(gateway)),
            assets: Arc::new(FetchDedupCache::new(
                HttpAssetFetcher::new(Duration::from_secs(1)).unwrap(),
                FetchCacheConfig::default(),
            )),
            asset_policy: Arc::new(AssetPolicy::new(vec!["cdn.discordapp.com".into()])),
        }
    }

    pub fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub async fn read_json<T: DeserializeOwned>(response: Response) -> T {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}
