//! Message router: a single typed dispatch point for UI-originated requests.
//!
//! Requests arrive as `{"type": "...", "payload": {...}}` messages. Each
//! variant maps to exactly one backend operation and every response goes out
//! through the same uniform envelope, so callers never see a raw error.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::client::{BackendApi, ChatTurn, SummaryFormat};
use crate::library::SaveItemRequest;
use crate::transcript::TranscriptSegment;

fn default_languages() -> Vec<String> {
    vec!["en".to_string()]
}

fn default_language() -> String {
    "en".to_string()
}

/// A request from the UI layer.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouterRequest {
    GetTranscript {
        video_id: String,
        #[serde(default = "default_languages")]
        languages: Vec<String>,
    },
    GetLanguages {
        video_id: String,
    },
    RequestTranslation {
        video_id: String,
        source_language: String,
    },
    GenerateSummary {
        video_id: String,
        transcript: Vec<TranscriptSegment>,
        format: SummaryFormat,
        #[serde(default = "default_language")]
        language: String,
    },
    SuggestedQuestions {
        video_id: String,
        transcript_text: String,
        #[serde(default = "default_language")]
        language: String,
    },
    ChatMessage {
        video_id: String,
        transcript_text: String,
        question: String,
        #[serde(default)]
        history: Vec<ChatTurn>,
        #[serde(default = "default_language")]
        language: String,
    },
    SaveItem {
        video_id: String,
        item_type: String,
        content: Value,
        #[serde(default)]
        source: Option<String>,
    },
    ListSavedItems {
        #[serde(default)]
        item_type: Option<String>,
    },
    DeleteSavedItem {
        video_id: String,
        item_type: String,
    },
}

impl RouterRequest {
    fn name(&self) -> &'static str {
        match self {
            Self::GetTranscript { .. } => "GET_TRANSCRIPT",
            Self::GetLanguages { .. } => "GET_LANGUAGES",
            Self::RequestTranslation { .. } => "REQUEST_TRANSLATION",
            Self::GenerateSummary { .. } => "GENERATE_SUMMARY",
            Self::SuggestedQuestions { .. } => "SUGGESTED_QUESTIONS",
            Self::ChatMessage { .. } => "CHAT_MESSAGE",
            Self::SaveItem { .. } => "SAVE_ITEM",
            Self::ListSavedItems { .. } => "LIST_SAVED_ITEMS",
            Self::DeleteSavedItem { .. } => "DELETE_SAVED_ITEM",
        }
    }
}

/// Uniform response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct RouterResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RouterResponse {
    pub fn ok(data: Value) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(message.into()) }
    }
}

/// Dispatch a typed request. Errors become failure envelopes, never panics.
pub async fn dispatch(backend: &dyn BackendApi, request: RouterRequest) -> RouterResponse {
    debug!("📨 Routing {}", request.name());

    let result = match request {
        RouterRequest::GetTranscript { video_id, languages } => backend
            .fetch_transcript(&video_id, &languages)
            .await
            .and_then(|r| Ok(serde_json::to_value(r)?)),

        RouterRequest::GetLanguages { video_id } => backend
            .available_languages(&video_id)
            .await
            .and_then(|r| Ok(serde_json::to_value(r)?)),

        RouterRequest::RequestTranslation { video_id, source_language } => backend
            .request_translation(&video_id, &source_language)
            .await
            .map(|_| json!({"requested": true})),

        RouterRequest::GenerateSummary { video_id, transcript, format, language } => backend
            .generate_summary(&video_id, &transcript, format, &language)
            .await
            .and_then(|r| Ok(serde_json::to_value(r)?)),

        RouterRequest::SuggestedQuestions { video_id, transcript_text, language } => backend
            .suggested_questions(&video_id, &transcript_text, &language)
            .await
            .map(|questions| json!({ "questions": questions })),

        RouterRequest::ChatMessage {
            video_id,
            transcript_text,
            question,
            history,
            language,
        } => backend
            .chat_message(&video_id, &transcript_text, &question, &history, &language)
            .await
            .map(|response| json!({ "response": response })),

        RouterRequest::SaveItem { video_id, item_type, content, source } => backend
            .save_item(&SaveItemRequest { video_id, item_type, content, source })
            .await
            .map(|_| json!({"saved": true})),

        RouterRequest::ListSavedItems { item_type } => backend
            .list_saved_items(item_type.as_deref())
            .await
            .and_then(|items| Ok(serde_json::to_value(items)?)),

        RouterRequest::DeleteSavedItem { video_id, item_type } => backend
            .delete_saved_item(&video_id, &item_type)
            .await
            .map(|_| json!({"deleted": true})),
    };

    match result {
        Ok(data) => RouterResponse::ok(data),
        Err(e) => RouterResponse::err(e.to_string()),
    }
}

/// Dispatch a raw JSON message. Malformed or unknown message types yield a
/// failure envelope instead of an error.
pub async fn dispatch_json(backend: &dyn BackendApi, message: Value) -> RouterResponse {
    match serde_json::from_value::<RouterRequest>(message) {
        Ok(request) => dispatch(backend, request).await,
        Err(e) => RouterResponse::err(format!("Unknown message: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{language, transcript, MockBackend};
    use std::collections::HashMap;

    const VIDEO: &str = "dQw4w9WgXcQ";

    fn backend() -> MockBackend {
        let mut transcripts = HashMap::new();
        transcripts.insert("en".to_string(), transcript(VIDEO, "en", &["hello", "world"]));
        MockBackend {
            transcripts,
            languages: vec![language("en", false)],
            chat_reply: Some("an answer".to_string()),
            questions: vec!["What is covered?".to_string()],
            ..MockBackend::default()
        }
    }

    #[tokio::test]
    async fn test_get_transcript_routes_and_wraps() {
        let backend = backend();
        let response = dispatch(
            &backend,
            RouterRequest::GetTranscript {
                video_id: VIDEO.to_string(),
                languages: vec!["en".to_string()],
            },
        )
        .await;

        assert!(response.success);
        let data = response.data.unwrap();
        assert_eq!(data["language"], "en");
        assert_eq!(data["transcript"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_backend_error_becomes_failure_envelope() {
        let backend = MockBackend::default(); // no transcripts
        let response = dispatch(
            &backend,
            RouterRequest::GetTranscript {
                video_id: VIDEO.to_string(),
                languages: vec!["en".to_string()],
            },
        )
        .await;

        assert!(!response.success);
        assert!(response.data.is_none());
        assert!(response.error.unwrap().contains("captions"));
    }

    #[tokio::test]
    async fn test_chat_message_envelope() {
        let backend = backend();
        let message = json!({
            "type": "CHAT_MESSAGE",
            "payload": {
                "video_id": VIDEO,
                "transcript_text": "hello world",
                "question": "what is this?"
            }
        });

        let response = dispatch_json(&backend, message).await;
        assert!(response.success);
        assert_eq!(response.data.unwrap()["response"], "an answer");
        assert_eq!(backend.call_count("chat_message"), 1);
    }

    #[tokio::test]
    async fn test_unknown_message_type_is_rejected() {
        let backend = backend();
        let message = json!({"type": "REWIND_TAPE", "payload": {}});

        let response = dispatch_json(&backend, message).await;
        assert!(!response.success);
        assert!(response.error.unwrap().contains("Unknown message"));
        assert_eq!(backend.calls.lock().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_delete_saved_item_routes() {
        let backend = backend();
        let response = dispatch(
            &backend,
            RouterRequest::DeleteSavedItem {
                video_id: VIDEO.to_string(),
                item_type: "summary".to_string(),
            },
        )
        .await;

        assert!(response.success);
        assert_eq!(response.data.unwrap()["deleted"], true);
        assert_eq!(backend.call_count("delete_saved_item"), 1);
    }
}
