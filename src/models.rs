use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A blob stored in the container. Identity is the opaque blob name; there is
/// no update operation — documents are immutable once stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredDocument {
    pub name: String,
    pub size_bytes: u64,
    pub format: String,
    pub uploaded_on: Option<DateTime<Utc>>,
}

/// Upload response body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub blob_name: String,
    pub blob_uri: String,
}

/// Chat request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    /// Document names the client has selected. Carried for transcript
    /// labelling only — the retrieval index is populated out-of-band and is
    /// not partitioned per blob, so the search query is not scoped by these.
    #[serde(default)]
    pub document_names: Option<Vec<String>>,
}

/// Chat response: the question as understood, the generated answer, and the
/// raw retrieval chunks the answer was grounded on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub question: String,
    pub answer: String,
    pub context: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_document_serializes_camel_case() {
        let doc = StoredDocument {
            name: "abc123-report.pdf".to_string(),
            size_bytes: 2048,
            format: "application/pdf".to_string(),
            uploaded_on: None,
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["name"], "abc123-report.pdf");
        assert_eq!(json["sizeBytes"], 2048);
        assert_eq!(json["format"], "application/pdf");
        assert!(json.get("size_bytes").is_none());
    }

    #[test]
    fn test_upload_response_field_names() {
        let resp = UploadResponse {
            blob_name: "x".to_string(),
            blob_uri: "https://example/x".to_string(),
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("blobName").is_some());
        assert!(json.get("blobUri").is_some());
    }

    #[test]
    fn test_chat_request_document_names_optional() {
        let req: ChatRequest = serde_json::from_str(r#"{"message":"hi"}"#).unwrap();
        assert_eq!(req.message, "hi");
        assert!(req.document_names.is_none());
    }

    #[test]
    fn test_chat_response_round_trips() {
        let resp = ChatResponse {
            question: "q".to_string(),
            answer: "a".to_string(),
            context: vec!["chunk".to_string()],
        };
        let json = serde_json::to_string(&resp).unwrap();
        let back: ChatResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(back.context.len(), 1);
    }
}
