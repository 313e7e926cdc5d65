//! Knowledge-base sync client for the RAG chatbot service.

use async_trait::async_trait;
use tracing::instrument;

use placement_core::model::{Assessment, Attempt};
use placement_core::traits::ChangeNotifier;

use crate::error::{check_status, http_client, NotifyError};

/// Tells the RAG service to re-index the question bank.
pub struct RagSyncClient {
    base_url: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl RagSyncClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, NotifyError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs,
            client: http_client(timeout_secs)?,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/sync-knowledge", self.base_url)
    }

    /// POST `{base_url}/sync-knowledge` once.
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    pub async fn sync_knowledge(&self) -> Result<(), NotifyError> {
        let endpoint = self.endpoint();
        let response = self
            .client
            .post(&endpoint)
            .send()
            .await
            .map_err(|e| NotifyError::from_reqwest(e, self.timeout_secs))?;
        check_status(response, &endpoint).await?;
        tracing::debug!("knowledge sync requested");
        Ok(())
    }
}

#[async_trait]
impl ChangeNotifier for RagSyncClient {
    fn name(&self) -> &str {
        "rag"
    }

    async fn assessment_changed(&self, _assessment_id: &str) -> anyhow::Result<()> {
        Ok(self.sync_knowledge().await?)
    }

    async fn result_published(&self, _: &Attempt, _: &Assessment) -> anyhow::Result<()> {
        Ok(())
    }
}
