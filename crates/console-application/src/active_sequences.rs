use console_core::Result;
use console_core::sequence::{ActiveSequence, SequenceService};
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory list of the sequences currently active on the server.
///
/// Backs the navigation badge and the handoff target picker.
pub struct ActiveSequenceCatalog {
    service: Arc<dyn SequenceService>,
    sequences: RwLock<Vec<ActiveSequence>>,
}

impl ActiveSequenceCatalog {
    /// Creates an empty catalog.
    pub fn new(service: Arc<dyn SequenceService>) -> Self {
        Self {
            service,
            sequences: RwLock::new(Vec::new()),
        }
    }

    /// Reloads the catalog from the server.
    ///
    /// On failure the previous contents are kept.
    ///
    /// # Returns
    ///
    /// The number of active sequences.
    pub async fn refresh(&self) -> Result<usize> {
        let mut loaded = self.service.list_active_sequences().await?;
        loaded.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        let count = loaded.len();
        *self.sequences.write().await = loaded;
        tracing::debug!(target: "backend", "Loaded {} active sequences", count);
        Ok(count)
    }

    /// Badge count.
    pub async fn count(&self) -> usize {
        self.sequences.read().await.len()
    }

    pub async fn all(&self) -> Vec<ActiveSequence> {
        self.sequences.read().await.clone()
    }

    /// Sequences a step can hand off to.
    ///
    /// # Arguments
    ///
    /// * `current_key` - Key of the sequence being edited, which is excluded
    pub async fn handoff_targets(&self, current_key: Option<&str>) -> Vec<ActiveSequence> {
        self.sequences
            .read()
            .await
            .iter()
            .filter(|sequence| Some(sequence.sequence_key.as_str()) != current_key)
            .cloned()
            .collect()
    }

    pub async fn contains(&self, sequence_key: &str) -> bool {
        self.sequences
            .read()
            .await
            .iter()
            .any(|sequence| sequence.sequence_key == sequence_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use console_core::ConsoleError;
    use console_core::sequence::{
        Category, GeneratedSequence, SavedSequence, SequencePayload, SequenceType,
    };
    use std::sync::Mutex;

    struct FakeCatalog {
        response: Mutex<Result<Vec<ActiveSequence>>>,
    }

    #[async_trait]
    impl SequenceService for FakeCatalog {
        async fn generate_sequence(&self, _ticket_id: &str) -> Result<GeneratedSequence> {
            Err(ConsoleError::internal("unused"))
        }

        async fn save_sequence(&self, _payload: &SequencePayload) -> Result<SavedSequence> {
            Err(ConsoleError::internal("unused"))
        }

        async fn list_active_sequences(&self) -> Result<Vec<ActiveSequence>> {
            self.response.lock().unwrap().clone()
        }
    }

    fn active(key: &str, name: &str) -> ActiveSequence {
        ActiveSequence {
            sequence_key: key.to_string(),
            display_name: name.to_string(),
            category: Category::Other,
            sequence_type: SequenceType::Troubleshooting,
        }
    }

    #[tokio::test]
    async fn test_refresh_and_handoff_targets() {
        let service = Arc::new(FakeCatalog {
            response: Mutex::new(Ok(vec![
                active("gas-leak", "Gas Leak"),
                active("dryer-not-heating", "Dryer Not Heating"),
            ])),
        });
        let catalog = ActiveSequenceCatalog::new(service);

        assert_eq!(catalog.refresh().await.unwrap(), 2);
        assert_eq!(catalog.count().await, 2);
        assert_eq!(catalog.all().await[0].sequence_key, "dryer-not-heating");
        assert!(catalog.contains("gas-leak").await);

        let targets = catalog.handoff_targets(Some("dryer-not-heating")).await;
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].sequence_key, "gas-leak");
        assert_eq!(catalog.handoff_targets(None).await.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_contents() {
        let service = Arc::new(FakeCatalog {
            response: Mutex::new(Ok(vec![active("gas-leak", "Gas Leak")])),
        });
        let catalog = ActiveSequenceCatalog::new(service.clone());
        catalog.refresh().await.unwrap();

        *service.response.lock().unwrap() = Err(ConsoleError::transport(None, "offline"));

        assert!(catalog.refresh().await.unwrap_err().is_transport());
        assert_eq!(catalog.count().await, 1);
    }
}
