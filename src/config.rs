use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address
    pub bind_addr: String,
    /// Hard ceiling on uploaded file size, in bytes
    pub max_upload_bytes: usize,
    /// Blob storage configuration
    pub storage: StorageConfig,
    /// Search index configuration
    pub search: SearchConfig,
    /// Chat-completion configuration
    pub ai: AiConfig,
}

/// Configuration for the blob storage backend. The connection string carries
/// the account name, account key and optionally an explicit blob endpoint
/// (semicolon-separated `Key=Value` pairs).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    pub container_name: Option<String>,
    pub connection_string: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Base URL of the search service (e.g. "https://acme.search.windows.net")
    pub endpoint: Option<String>,
    pub index_name: Option<String>,
    pub api_key: Option<String>,
    /// REST api-version query parameter
    pub api_version: String,
    /// Maximum chunks returned per query
    pub max_results: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Base URL of the chat-completion service
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    /// Deployment (model) name addressed by the completion call
    pub deployment: String,
    pub api_version: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            max_upload_bytes: 50 * 1024 * 1024,
            storage: StorageConfig::default(),
            search: SearchConfig::default(),
            ai: AiConfig::default(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            index_name: None,
            api_key: None,
            api_version: "2023-11-01".to_string(),
            max_results: 1,
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            deployment: "gpt-4o".to_string(),
            api_version: "2024-02-01".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("DOC_CHAT_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(val) = std::env::var("DOC_CHAT_MAX_UPLOAD_MB") {
            if let Ok(mb) = val.parse::<usize>() {
                config.max_upload_bytes = mb * 1024 * 1024;
            }
        }

        if let Ok(name) = std::env::var("STORAGE_CONTAINER") {
            config.storage.container_name = Some(name);
        }
        if let Ok(cs) = std::env::var("STORAGE_CONNECTION_STRING") {
            config.storage.connection_string = Some(cs);
        }

        if let Ok(url) = std::env::var("SEARCH_ENDPOINT") {
            config.search.endpoint = Some(url);
        }
        if let Ok(name) = std::env::var("SEARCH_INDEX") {
            config.search.index_name = Some(name);
        }
        if let Ok(key) = std::env::var("SEARCH_API_KEY") {
            config.search.api_key = Some(key);
        }
        if let Ok(ver) = std::env::var("SEARCH_API_VERSION") {
            config.search.api_version = ver;
        }
        if let Ok(val) = std::env::var("SEARCH_MAX_RESULTS") {
            if let Ok(n) = val.parse() {
                config.search.max_results = n;
            }
        }

        if let Ok(url) = std::env::var("AI_ENDPOINT") {
            config.ai.endpoint = Some(url);
        }
        if let Ok(key) = std::env::var("AI_API_KEY") {
            config.ai.api_key = Some(key);
        }
        if let Ok(name) = std::env::var("AI_DEPLOYMENT") {
            config.ai.deployment = name;
        }
        if let Ok(ver) = std::env::var("AI_API_VERSION") {
            config.ai.api_version = ver;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_max_results_is_one() {
        assert_eq!(SearchConfig::default().max_results, 1);
    }

    #[test]
    fn test_default_upload_ceiling_is_50_mb() {
        assert_eq!(Config::default().max_upload_bytes, 50 * 1024 * 1024);
    }

    #[test]
    fn test_default_backends_unconfigured() {
        let config = Config::default();
        assert!(config.storage.container_name.is_none());
        assert!(config.storage.connection_string.is_none());
        assert!(config.search.endpoint.is_none());
        assert!(config.ai.endpoint.is_none());
    }
}
