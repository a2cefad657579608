use std::sync::Arc;

use crate::config::Config;
use crate::gateway::answer::ChatModel;
use crate::gateway::retrieval::SearchIndex;
use crate::gateway::storage::BlobStore;

/// Shared application state. There is no cross-request mutable state — all
/// durable state lives in the external backends, so this is just the config,
/// a shared HTTP client, and the three gateways.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub storage: Arc<BlobStore>,
    pub retrieval: Arc<SearchIndex>,
    pub answer: Arc<ChatModel>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .timeout(std::time::Duration::from_secs(120))
            .build()?;

        // All gateways validate their configuration here, uniformly: a missing
        // required setting fails startup instead of surfacing mid-request.
        let storage = BlobStore::new(http_client.clone(), &config.storage)?;
        let retrieval = SearchIndex::new(http_client.clone(), &config.search)?;
        let answer = ChatModel::new(http_client, &config.ai)?;

        Ok(Self {
            config,
            storage: Arc::new(storage),
            retrieval: Arc::new(retrieval),
            answer: Arc::new(answer),
        })
    }
}
