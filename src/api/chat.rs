use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::models::{ChatRequest, ChatResponse};
use crate::state::AppState;

/// POST /api/chat - Grounded question answering:
///   1. Validate the question.
///   2. Retrieve the top-K matching chunks from the search index.
///   3. Join them into one context block and ask the chat model.
/// The two backend calls run in sequence; the first failure propagates.
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, String)> {
    let question = req.message.trim().to_string();
    if question.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Question is required.".to_string(),
        ));
    }

    // The client's selected documents arrive in `req.document_names`, but the
    // retrieval index is populated out-of-band and is not partitioned per
    // blob, so the query cannot be scoped by them. They label the transcript
    // only.
    let chunks = state.retrieval.search(&question).await.map_err(|e| {
        tracing::error!("Retrieval failed: {e}");
        e.into_response_parts()
    })?;

    let context = build_context_block(&chunks);
    let answer = state.answer.ask(&context, &question).await.map_err(|e| {
        tracing::error!("Answer generation failed: {e}");
        e.into_response_parts()
    })?;

    tracing::info!(
        "Answered question with {} context chunk(s)",
        chunks.len()
    );

    Ok(Json(ChatResponse {
        question,
        answer,
        context: chunks,
    }))
}

/// Join retrieval chunks into the single context block the answer gateway
/// receives. Blank-line separated so chunk boundaries stay visible.
fn build_context_block(chunks: &[String]) -> String {
    chunks.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_block_empty() {
        assert_eq!(build_context_block(&[]), "");
    }

    #[test]
    fn test_context_block_single_chunk() {
        let chunks = vec!["only chunk".to_string()];
        assert_eq!(build_context_block(&chunks), "only chunk");
    }

    #[test]
    fn test_context_block_separates_with_blank_line() {
        let chunks = vec!["first".to_string(), "second".to_string()];
        assert_eq!(build_context_block(&chunks), "first\n\nsecond");
    }
}
