//! Search index gateway.
//!
//! Issues a free-text query against the managed index's `docs/search`
//! operation and returns the `content` field of the top hits in backend rank
//! order. No re-ranking, filtering, or deduplication happens here.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::SearchConfig;
use crate::error::GatewayError;

#[derive(Debug)]
pub struct SearchIndex {
    client: reqwest::Client,
    endpoint: String,
    index_name: String,
    api_key: String,
    api_version: String,
    max_results: usize,
}

#[derive(Serialize)]
struct SearchBody<'a> {
    search: &'a str,
    top: usize,
    select: &'a str,
}

#[derive(Deserialize)]
struct SearchResults {
    value: Vec<Value>,
}

impl SearchIndex {
    pub fn new(client: reqwest::Client, config: &SearchConfig) -> Result<Self, GatewayError> {
        let endpoint = require(&config.endpoint, "search endpoint")?;
        let index_name = require(&config.index_name, "search index name")?;
        let api_key = require(&config.api_key, "search api key")?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            index_name,
            api_key,
            api_version: config.api_version.clone(),
            max_results: config.max_results,
        })
    }

    /// Query the index and return at most `max_results` content chunks. Hits
    /// without a string `content` field are skipped, not errors.
    pub async fn search(&self, query: &str) -> Result<Vec<String>, GatewayError> {
        let url = format!(
            "{}/indexes/{}/docs/search?api-version={}",
            self.endpoint, self.index_name, self.api_version
        );

        let body = SearchBody {
            search: query,
            top: self.max_results,
            select: "content",
        };

        let resp = self
            .client
            .post(&url)
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Backend(format!(
                "search returned {status}: {body}"
            )));
        }

        let results: SearchResults = resp
            .json()
            .await
            .map_err(|e| GatewayError::Backend(format!("unreadable search response: {e}")))?;

        Ok(extract_content(results.value, self.max_results))
    }
}

fn require(value: &Option<String>, what: &str) -> Result<String, GatewayError> {
    value
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| GatewayError::Configuration(format!("{what} is not set")))
}

/// Pull the `content` string out of each hit, preserving backend order and
/// capping at `limit` even if the service over-returns.
fn extract_content(hits: Vec<Value>, limit: usize) -> Vec<String> {
    hits.into_iter()
        .filter_map(|hit| {
            hit.get("content")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_config() -> SearchConfig {
        SearchConfig {
            endpoint: Some("https://acme.search.windows.net".to_string()),
            index_name: Some("docs-index".to_string()),
            api_key: Some("secret".to_string()),
            api_version: "2023-11-01".to_string(),
            max_results: 3,
        }
    }

    #[test]
    fn test_new_requires_endpoint_index_and_key() {
        for missing in ["endpoint", "index", "key"] {
            let mut config = valid_config();
            match missing {
                "endpoint" => config.endpoint = None,
                "index" => config.index_name = None,
                _ => config.api_key = None,
            }
            let err = SearchIndex::new(reqwest::Client::new(), &config).unwrap_err();
            assert!(matches!(err, GatewayError::Configuration(_)));
        }
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let mut config = valid_config();
        config.endpoint = Some("https://acme.search.windows.net/".to_string());
        let index = SearchIndex::new(reqwest::Client::new(), &config).unwrap();
        assert_eq!(index.endpoint, "https://acme.search.windows.net");
    }

    #[test]
    fn test_extract_content_preserves_order() {
        let hits = vec![
            json!({"@search.score": 2.0, "content": "first"}),
            json!({"@search.score": 1.5, "content": "second"}),
        ];
        assert_eq!(extract_content(hits, 5), vec!["first", "second"]);
    }

    #[test]
    fn test_extract_content_skips_hits_without_field() {
        let hits = vec![
            json!({"content": "keep"}),
            json!({"title": "no content field"}),
            json!({"content": 42}),
            json!({"content": "also keep"}),
        ];
        assert_eq!(extract_content(hits, 5), vec!["keep", "also keep"]);
    }

    #[test]
    fn test_extract_content_caps_at_limit() {
        let hits = vec![
            json!({"content": "a"}),
            json!({"content": "b"}),
            json!({"content": "c"}),
        ];
        assert_eq!(extract_content(hits, 2).len(), 2);
    }

    #[test]
    fn test_extract_content_empty() {
        assert!(extract_content(vec![], 1).is_empty());
    }
}
