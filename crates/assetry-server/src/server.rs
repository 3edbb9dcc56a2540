use std::sync::Arc;

use assetry_pipeline::AssetService;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::AppState;
use crate::metadata::{InMemoryMetadataStore, MetadataStore};
use crate::router::build_router;

/// Assetry file server.
pub struct AssetServer {
    config: ServerConfig,
    metadata: Arc<dyn MetadataStore>,
}

impl AssetServer {
    /// A server keeping its records in memory.
    pub fn new(config: ServerConfig) -> Self {
        Self::with_metadata(config, Arc::new(InMemoryMetadataStore::new()))
    }

    pub fn with_metadata(config: ServerConfig, metadata: Arc<dyn MetadataStore>) -> Self {
        Self { config, metadata }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Open the asset store and build the router (useful for testing).
    pub async fn router(&self) -> ServerResult<axum::Router> {
        let assets = AssetService::open(self.config.asset_config()).await?;
        let state = AppState::new(Arc::new(assets), Arc::clone(&self.metadata));
        Ok(build_router(state, self.config.body_limit()))
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router().await?;
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(
            files_root = %self.config.files_root.display(),
            max_file_size = self.config.max_file_size,
            "Assetry server listening on {}",
            self.config.bind_addr
        );
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
