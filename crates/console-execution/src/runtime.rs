//! Composition root for a console process.

use crate::telemetry::init_tracing;
use anyhow::Context;
use console_application::{ActiveSequenceCatalog, DraftEditor, NotificationPoller};
use console_core::config::ConsoleConfig;
use console_infrastructure::ConfigService;
use console_interaction::ConsoleApiClient;
use std::sync::Arc;

/// Wires configuration, the backend client and the application services.
pub struct ConsoleRuntime {
    config: ConsoleConfig,
    client: Arc<ConsoleApiClient>,
    notifications: NotificationPoller,
    catalog: ActiveSequenceCatalog,
}

impl ConsoleRuntime {
    pub fn from_config(config: ConsoleConfig) -> Self {
        let client = Arc::new(ConsoleApiClient::from_config(&config));
        let notifications = NotificationPoller::from_config(client.clone(), &config);
        let catalog = ActiveSequenceCatalog::new(client.clone());
        Self {
            config,
            client,
            notifications,
            catalog,
        }
    }

    /// Loads the user configuration, installs tracing and builds the runtime.
    pub fn bootstrap() -> anyhow::Result<Self> {
        let config = ConfigService::new_default()
            .and_then(|service| service.load())
            .context("failed to load console configuration")?;
        init_tracing(&config)?;
        tracing::info!("Console backend: {}", config.api_base_url);
        Ok(Self::from_config(config))
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn notifications(&self) -> &NotificationPoller {
        &self.notifications
    }

    pub fn catalog(&self) -> &ActiveSequenceCatalog {
        &self.catalog
    }

    /// Opens a new draft editing session.
    pub fn open_editor(&self) -> DraftEditor {
        DraftEditor::from_config(self.client.clone(), &self.config)
    }

    /// Starts notification polling and loads the active sequence catalog.
    ///
    /// A failed catalog load is logged; the catalog stays empty.
    pub async fn start(&self) {
        self.notifications.start();
        if let Err(err) = self.catalog.refresh().await {
            tracing::warn!(target: "backend", "Failed to load active sequences: {}", err);
        }
    }

    pub async fn shutdown(&self) {
        self.notifications.stop().await;
    }
}
