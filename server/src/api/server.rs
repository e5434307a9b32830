//! API server initialization

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use super::middleware::{self, AllowedOrigins};
use super::routes::{health, resources};
use crate::core::CoreApp;
use crate::core::constants::API_PREFIX;
use crate::data::QueryExecutor;
use crate::data::resources::ResourceRegistry;

pub struct ApiServer {
    app: CoreApp,
    allowed_origins: AllowedOrigins,
}

impl ApiServer {
    pub fn new(app: CoreApp) -> Self {
        let allowed_origins = AllowedOrigins::new(&app.config.server.host, app.config.server.port);
        Self {
            app,
            allowed_origins,
        }
    }

    /// Returns CoreApp for graceful shutdown
    pub async fn start(self) -> Result<CoreApp> {
        let Self {
            app,
            allowed_origins,
        } = self;

        let host = app.config.server.host.clone();
        let port = app.config.server.port;

        let executor: Arc<dyn QueryExecutor> = app.database.clone();
        let router = build_router(
            Arc::new(app.config.resources.clone()),
            executor,
            &allowed_origins,
        );

        let listener = TcpListener::bind((host.trim_matches(['[', ']']), port))
            .await
            .with_context(|| format!("Failed to bind {}:{}", host, port))?;
        tracing::debug!(addr = ?listener.local_addr().ok(), "API server listening");
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(app.shutdown.wait())
        .await?;

        Ok(app)
    }
}

/// Build the full application router
pub fn build_router(
    registry: Arc<ResourceRegistry>,
    executor: Arc<dyn QueryExecutor>,
    allowed_origins: &AllowedOrigins,
) -> Router {
    let health_path = format!("{}/health", API_PREFIX);

    Router::new()
        .route(&health_path, get(health::health))
        .nest(API_PREFIX, resources::routes(registry, executor))
        .fallback(middleware::handle_404)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(middleware::cors(allowed_origins))
}
