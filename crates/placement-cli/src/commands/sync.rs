//! The `placement sync` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use placement_notify::{load_config_from, RagSyncClient};

pub async fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    anyhow::ensure!(config.rag.enabled, "RAG sync is disabled in config");

    let client = RagSyncClient::new(&config.rag.base_url, config.rag.timeout_secs)?;
    client
        .sync_knowledge()
        .await
        .with_context(|| format!("knowledge sync failed: {}", client.endpoint()))?;

    println!("Knowledge base synced via {}", client.endpoint());
    Ok(())
}
