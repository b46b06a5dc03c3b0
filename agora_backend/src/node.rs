use crate::api;
use crate::bootstrap::{self, BootstrapResources};
use crate::config::AgoraConfig;
use crate::database::Database;
use anyhow::Result;

/// Bootstraps the backend once and hands out cloned handles to whichever
/// entrypoint needs them.
pub struct AgoraNode {
    config: AgoraConfig,
    bootstrap: BootstrapResources,
}

impl AgoraNode {
    pub fn start(config: AgoraConfig) -> Result<Self> {
        let bootstrap = bootstrap::initialize(&config)?;

        tracing::info!(
            directories_created = ?bootstrap.directories_created,
            database_initialized = bootstrap.database_initialized,
            db_path = %config.paths.db_path.display(),
            "agora node initialized"
        );

        Ok(Self { config, bootstrap })
    }

    pub fn snapshot(&self) -> NodeSnapshot {
        NodeSnapshot {
            config: self.config.clone(),
            database: self.bootstrap.database.clone(),
        }
    }

    /// Runs the REST API server until shutdown.
    pub async fn run_http_server(&self) -> Result<()> {
        let snapshot = self.snapshot();
        api::serve_http(snapshot.config, snapshot.database).await
    }

    pub fn config(&self) -> &AgoraConfig {
        &self.config
    }

    pub fn database(&self) -> Database {
        self.bootstrap.database.clone()
    }
}

#[derive(Clone)]
pub struct NodeSnapshot {
    pub config: AgoraConfig,
    pub database: Database,
}
