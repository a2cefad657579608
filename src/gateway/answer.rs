//! Chat-completion gateway.
//!
//! Sends the retrieved context and the user's question to the managed chat
//! deployment and returns the completion text. The context is capped at a
//! hard 6000 characters before sending; that is a safety bound against
//! oversized prompts, not a chunking strategy.

use serde::{Deserialize, Serialize};

use crate::config::AiConfig;
use crate::error::GatewayError;

/// Hard ceiling on the context block sent with each question.
const MAX_CONTEXT_CHARS: usize = 6000;

const SYSTEM_PROMPT: &str =
    "You are an AI assistant. Use the provided document context to answer the user's question.";

// Fixed generation parameters for every call.
const TEMPERATURE: f64 = 0.7;
const TOP_P: f64 = 0.95;
const MAX_OUTPUT_TOKENS: u32 = 800;

#[derive(Debug)]
pub struct ChatModel {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    deployment: String,
    api_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Serialize)]
struct CompletionRequest {
    messages: Vec<ChatMessage>,
    temperature: f64,
    top_p: f64,
    frequency_penalty: f64,
    presence_penalty: f64,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl ChatModel {
    pub fn new(client: reqwest::Client, config: &AiConfig) -> Result<Self, GatewayError> {
        let endpoint = config
            .endpoint
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| GatewayError::Configuration("AI endpoint is not set".to_string()))?;
        let api_key = config
            .api_key
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| GatewayError::Configuration("AI api key is not set".to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            deployment: config.deployment.clone(),
            api_version: config.api_version.clone(),
        })
    }

    /// Ask the model a question grounded in `context`. Returns the completion
    /// text, or a typed backend error — never an error sentence disguised as
    /// an answer.
    pub async fn ask(&self, context: &str, question: &str) -> Result<String, GatewayError> {
        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, self.deployment, self.api_version
        );

        let body = CompletionRequest {
            messages: build_messages(context, question),
            temperature: TEMPERATURE,
            top_p: TOP_P,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            max_tokens: MAX_OUTPUT_TOKENS,
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
                "chat completion returned {status}: {body}"
            )));
        }

        let completion: CompletionResponse = resp
            .json()
            .await
            .map_err(|e| GatewayError::Backend(format!("unreadable completion response: {e}")))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| GatewayError::Backend("completion contained no text".to_string()))
    }
}

/// System instruction, then the (capped) context, then the question — two
/// user turns so the model sees the document text before the ask.
fn build_messages(context: &str, question: &str) -> Vec<ChatMessage> {
    let context = truncate_to_char_boundary(context, MAX_CONTEXT_CHARS);
    vec![
        ChatMessage {
            role: "system".to_string(),
            content: SYSTEM_PROMPT.to_string(),
        },
        ChatMessage {
            role: "user".to_string(),
            content: format!("Document Content:\n{context}"),
        },
        ChatMessage {
            role: "user".to_string(),
            content: question.to_string(),
        },
    ]
}

fn truncate_to_char_boundary(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    s.char_indices()
        .take_while(|(i, _)| *i < max_len)
        .map(|(_, c)| c)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AiConfig {
        AiConfig {
            endpoint: Some("https://acme.openai.azure.com".to_string()),
            api_key: Some("secret".to_string()),
            deployment: "gpt-4o".to_string(),
            api_version: "2024-02-01".to_string(),
        }
    }

    #[test]
    fn test_new_requires_endpoint() {
        let mut config = valid_config();
        config.endpoint = None;
        let err = ChatModel::new(reqwest::Client::new(), &config).unwrap_err();
        assert!(matches!(err, GatewayError::Configuration(_)));
    }

    #[test]
    fn test_new_requires_api_key() {
        let mut config = valid_config();
        config.api_key = Some("   ".to_string());
        let err = ChatModel::new(reqwest::Client::new(), &config).unwrap_err();
        assert!(matches!(err, GatewayError::Configuration(_)));
    }

    // ─── Context truncation ──────────────────────────────

    #[test]
    fn test_truncate_short_string() {
        assert_eq!(truncate_to_char_boundary("hello", 6000), "hello");
    }

    #[test]
    fn test_truncate_caps_at_exactly_6000() {
        let long = "a".repeat(10_000);
        let result = truncate_to_char_boundary(&long, MAX_CONTEXT_CHARS);
        assert_eq!(result.len(), 6000);
    }

    #[test]
    fn test_truncate_unicode_safe() {
        // 4-byte emoji must not be split in the middle
        let s = "🌍".repeat(2000);
        let result = truncate_to_char_boundary(&s, MAX_CONTEXT_CHARS);
        assert!(result.is_char_boundary(result.len()));
        assert!(result.len() <= MAX_CONTEXT_CHARS);
    }

    // ─── Message assembly ────────────────────────────────

    #[test]
    fn test_messages_shape() {
        let msgs = build_messages("some context", "what is this?");
        assert_eq!(msgs.len(), 3);
        assert_eq!(msgs[0].role, "system");
        assert_eq!(msgs[1].role, "user");
        assert!(msgs[1].content.starts_with("Document Content:\n"));
        assert!(msgs[1].content.contains("some context"));
        assert_eq!(msgs[2].role, "user");
        assert_eq!(msgs[2].content, "what is this?");
    }

    #[test]
    fn test_messages_cap_context_before_sending() {
        let long = "x".repeat(10_000);
        let msgs = build_messages(&long, "q");
        let context_part = msgs[1].content.strip_prefix("Document Content:\n").unwrap();
        assert_eq!(context_part.len(), 6000);
    }

    #[test]
    fn test_request_body_carries_fixed_parameters() {
        let body = CompletionRequest {
            messages: build_messages("ctx", "q"),
            temperature: TEMPERATURE,
            top_p: TOP_P,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            max_tokens: MAX_OUTPUT_TOKENS,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["temperature"], 0.7);
        assert_eq!(json["top_p"], 0.95);
        assert_eq!(json["frequency_penalty"], 0.0);
        assert_eq!(json["presence_penalty"], 0.0);
        assert_eq!(json["max_tokens"], 800);
    }

    #[test]
    fn test_completion_response_parsing() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"Paris."}}]}"#;
        let parsed: CompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("Paris.")
        );
    }

    #[test]
    fn test_completion_response_null_content() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        let parsed: CompletionResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }
}
