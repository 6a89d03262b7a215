//! REST client for the transcript/summarization backend.
//!
//! Thin fetch wrappers: no retry, no backoff. Every endpoint answers with a
//! `{success, ...}` envelope; failures carry a display string. The
//! [`BackendApi`] trait fronts the concrete client so the router and session
//! logic can be exercised against a mock.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::auth::TokenResponse;
use crate::error::ExtractionError;
use crate::library::{SaveItemRequest, SavedItem};
use crate::transcript::{AvailableLanguage, TranscriptResult, TranscriptSegment};

/// Summary style requested from the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryFormat {
    Short,
    Topic,
    Qa,
}

impl SummaryFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Topic => "topic",
            Self::Qa => "qa",
        }
    }

    pub fn all() -> [SummaryFormat; 3] {
        [Self::Short, Self::Topic, Self::Qa]
    }
}

impl fmt::Display for SummaryFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SummaryFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "short" => Ok(Self::Short),
            "topic" => Ok(Self::Topic),
            "qa" => Ok(Self::Qa),
            other => Err(anyhow!("Format must be 'short', 'topic' or 'qa', got '{}'", other)),
        }
    }
}

/// One chat exchange half ("user" or "assistant").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: "assistant".to_string(), content: content.into() }
    }
}

/// Result of a summary generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryOutcome {
    pub summary: String,
    /// True when the summary carries clickable timestamp links
    pub is_structured: bool,
    /// True when the backend answered from its own cache
    pub cached: bool,
}

/// Operations the backend exposes to this client.
#[async_trait]
pub trait BackendApi: Send + Sync {
    async fn fetch_transcript(
        &self,
        video_id: &str,
        languages: &[String],
    ) -> Result<TranscriptResult>;

    async fn available_languages(&self, video_id: &str) -> Result<Vec<AvailableLanguage>>;

    /// Language list that also advertises AI-translated tracks once the
    /// backend has produced them.
    async fn languages_with_translation(&self, video_id: &str)
        -> Result<Vec<AvailableLanguage>>;

    /// Ask the backend to translate a transcript to English in the
    /// background. Completion is observed through
    /// [`Self::languages_with_translation`].
    async fn request_translation(&self, video_id: &str, source_language: &str) -> Result<()>;

    async fn generate_summary(
        &self,
        video_id: &str,
        transcript: &[TranscriptSegment],
        format: SummaryFormat,
        language: &str,
    ) -> Result<SummaryOutcome>;

    async fn suggested_questions(
        &self,
        video_id: &str,
        transcript_text: &str,
        language: &str,
    ) -> Result<Vec<String>>;

    async fn chat_message(
        &self,
        video_id: &str,
        transcript_text: &str,
        question: &str,
        history: &[ChatTurn],
        language: &str,
    ) -> Result<String>;

    async fn save_item(&self, request: &SaveItemRequest) -> Result<()>;

    async fn list_saved_items(&self, item_type: Option<&str>) -> Result<Vec<SavedItem>>;

    async fn delete_saved_item(&self, video_id: &str, item_type: &str) -> Result<()>;

    async fn refresh_tokens(&self, refresh_token: &str) -> Result<TokenResponse>;
}

/// Concrete HTTP client for the backend.
pub struct BackendClient {
    base_url: String,
    client: reqwest::Client,
    bearer_token: Option<String>,
}

#[derive(Serialize)]
struct TranscriptRequest<'a> {
    video_id: &'a str,
    languages: &'a [String],
}

#[derive(Deserialize)]
struct TranscriptEnvelope {
    success: bool,
    #[serde(default)]
    video_id: String,
    #[serde(default)]
    language: String,
    #[serde(default)]
    is_generated: bool,
    #[serde(default)]
    transcript: Vec<TranscriptSegment>,
    #[serde(default)]
    full_text: String,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct LanguagesEnvelope {
    success: bool,
    #[serde(default)]
    languages: Vec<AvailableLanguage>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    video_id: &'a str,
    source_language: &'a str,
}

#[derive(Serialize)]
struct SummaryRequest<'a> {
    video_id: &'a str,
    /// JSON-encoded segment array; the backend detects the structured form
    /// and produces clickable timestamps from it.
    transcript: String,
    format: &'a str,
    language: &'a str,
}

#[derive(Deserialize)]
struct SummaryEnvelope {
    success: bool,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    cached: bool,
    #[serde(default)]
    is_structured: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Serialize)]
struct QuestionsRequest<'a> {
    video_id: &'a str,
    transcript: &'a str,
    language: &'a str,
}

#[derive(Deserialize)]
struct QuestionsEnvelope {
    success: bool,
    #[serde(default)]
    questions: Vec<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    video_id: &'a str,
    transcript: &'a str,
    question: &'a str,
    chat_history: &'a [ChatTurn],
    language: &'a str,
}

#[derive(Deserialize)]
struct ChatEnvelope {
    success: bool,
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct SavedItemsEnvelope {
    success: bool,
    #[serde(default)]
    items: Vec<SavedItem>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct StatusEnvelope {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, timeout_seconds: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            bearer_token: None,
        })
    }

    /// Attach a bearer token for authenticated routes (saved items).
    pub fn set_bearer_token(&mut self, token: Option<String>) {
        self.bearer_token = token;
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.bearer_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Backend API error {}: {}", status, text));
        }
        Ok(response)
    }

    /// Fetch the video title from the YouTube oEmbed endpoint.
    ///
    /// This is the one call that goes to YouTube directly instead of the
    /// backend; failures are non-fatal for every caller.
    pub async fn video_title(&self, video_id: &str) -> Option<String> {
        let watch_url = format!("https://www.youtube.com/watch?v={}", video_id);
        let oembed_url = format!(
            "https://www.youtube.com/oembed?url={}&format=json",
            urlencoding::encode(&watch_url)
        );

        #[derive(Deserialize)]
        struct OEmbed {
            title: Option<String>,
        }

        match self.client.get(&oembed_url).send().await {
            Ok(response) if response.status().is_success() => {
                response.json::<OEmbed>().await.ok().and_then(|o| o.title)
            }
            _ => None,
        }
    }
}

#[async_trait]
impl BackendApi for BackendClient {
    async fn fetch_transcript(
        &self,
        video_id: &str,
        languages: &[String],
    ) -> Result<TranscriptResult> {
        debug!("Fetching transcript for {}", video_id);
        let request = TranscriptRequest { video_id, languages };
        let response = self
            .client
            .post(self.url("/api/transcript/extract"))
            .json(&request)
            .send()
            .await?;
        let envelope: TranscriptEnvelope = Self::check_status(response).await?.json().await?;

        if !envelope.success {
            let code = envelope.error.unwrap_or_default();
            let message = envelope.message.unwrap_or_default();
            return Err(ExtractionError::from_code(&code, &message).into());
        }

        Ok(TranscriptResult {
            video_id: envelope.video_id,
            language: envelope.language,
            is_generated: envelope.is_generated,
            transcript: envelope.transcript,
            full_text: envelope.full_text,
        })
    }

    async fn available_languages(&self, video_id: &str) -> Result<Vec<AvailableLanguage>> {
        let response = self
            .client
            .get(self.url(&format!("/api/transcript/languages/{}", video_id)))
            .send()
            .await?;
        let envelope: LanguagesEnvelope = Self::check_status(response).await?.json().await?;

        if !envelope.success {
            return Err(anyhow!(envelope.error.unwrap_or_else(|| "Failed to list languages".into())));
        }
        Ok(envelope.languages)
    }

    async fn languages_with_translation(
        &self,
        video_id: &str,
    ) -> Result<Vec<AvailableLanguage>> {
        let response = self
            .client
            .get(self.url(&format!(
                "/api/transcript/languages-with-translation/{}",
                video_id
            )))
            .send()
            .await?;
        let envelope: LanguagesEnvelope = Self::check_status(response).await?.json().await?;

        if !envelope.success {
            return Err(anyhow!(envelope.error.unwrap_or_else(|| "Failed to list languages".into())));
        }
        Ok(envelope.languages)
    }

    async fn request_translation(&self, video_id: &str, source_language: &str) -> Result<()> {
        debug!("Requesting translation of {} from {}", video_id, source_language);
        let request = TranslateRequest { video_id, source_language };
        let response = self
            .client
            .post(self.url("/api/transcript/translate"))
            .json(&request)
            .send()
            .await?;
        let envelope: StatusEnvelope = Self::check_status(response).await?.json().await?;

        if !envelope.success {
            return Err(anyhow!(envelope.error.unwrap_or_else(|| "Translation request failed".into())));
        }
        Ok(())
    }

    async fn generate_summary(
        &self,
        video_id: &str,
        transcript: &[TranscriptSegment],
        format: SummaryFormat,
        language: &str,
    ) -> Result<SummaryOutcome> {
        let request = SummaryRequest {
            video_id,
            transcript: serde_json::to_string(transcript)?,
            format: format.as_str(),
            language,
        };
        let response = self
            .client
            .post(self.url("/api/summary/generate"))
            .json(&request)
            .send()
            .await?;
        let envelope: SummaryEnvelope = Self::check_status(response).await?.json().await?;

        if !envelope.success {
            return Err(anyhow!(envelope.error.unwrap_or_else(|| "Summary generation failed".into())));
        }

        let summary = envelope
            .summary
            .ok_or_else(|| anyhow!("Backend returned success without a summary"))?;

        Ok(SummaryOutcome {
            summary,
            is_structured: envelope.is_structured,
            cached: envelope.cached,
        })
    }

    async fn suggested_questions(
        &self,
        video_id: &str,
        transcript_text: &str,
        language: &str,
    ) -> Result<Vec<String>> {
        let request = QuestionsRequest {
            video_id,
            transcript: transcript_text,
            language,
        };
        let response = self
            .client
            .post(self.url("/api/chat/suggested-questions"))
            .json(&request)
            .send()
            .await?;
        let envelope: QuestionsEnvelope = Self::check_status(response).await?.json().await?;

        if !envelope.success {
            return Err(anyhow!(envelope.error.unwrap_or_else(|| "Question generation failed".into())));
        }
        Ok(envelope.questions)
    }

    async fn chat_message(
        &self,
        video_id: &str,
        transcript_text: &str,
        question: &str,
        history: &[ChatTurn],
        language: &str,
    ) -> Result<String> {
        let request = ChatRequest {
            video_id,
            transcript: transcript_text,
            question,
            chat_history: history,
            language,
        };
        let response = self
            .client
            .post(self.url("/api/chat/message"))
            .json(&request)
            .send()
            .await?;
        let envelope: ChatEnvelope = Self::check_status(response).await?.json().await?;

        if !envelope.success {
            return Err(anyhow!(envelope.error.unwrap_or_else(|| "Chat request failed".into())));
        }
        envelope
            .response
            .ok_or_else(|| anyhow!("Backend returned success without a response"))
    }

    async fn save_item(&self, request: &SaveItemRequest) -> Result<()> {
        let response = self
            .authorized(self.client.post(self.url("/api/saved-items/save")))
            .json(request)
            .send()
            .await?;
        let envelope: StatusEnvelope = Self::check_status(response).await?.json().await?;

        if !envelope.success {
            return Err(anyhow!(envelope.error.unwrap_or_else(|| "Failed to save item".into())));
        }
        Ok(())
    }

    async fn list_saved_items(&self, item_type: Option<&str>) -> Result<Vec<SavedItem>> {
        let mut builder = self
            .authorized(self.client.get(self.url("/api/saved-items/list")));
        if let Some(kind) = item_type {
            builder = builder.query(&[("item_type", kind)]);
        }
        let response = builder.send().await?;
        let envelope: SavedItemsEnvelope = Self::check_status(response).await?.json().await?;

        if !envelope.success {
            return Err(anyhow!(envelope.error.unwrap_or_else(|| "Failed to list saved items".into())));
        }
        Ok(envelope.items)
    }

    async fn delete_saved_item(&self, video_id: &str, item_type: &str) -> Result<()> {
        let response = self
            .authorized(
                self.client
                    .delete(self.url(&format!("/api/saved-items/{}/{}", video_id, item_type))),
            )
            .send()
            .await?;
        let envelope: StatusEnvelope = Self::check_status(response).await?.json().await?;

        if !envelope.success {
            return Err(anyhow!(envelope.error.unwrap_or_else(|| "Failed to delete item".into())));
        }
        Ok(())
    }

    async fn refresh_tokens(&self, refresh_token: &str) -> Result<TokenResponse> {
        let request = RefreshRequest { refresh_token };
        let response = self
            .client
            .post(self.url("/api/auth/refresh"))
            .json(&request)
            .send()
            .await?;
        let tokens: TokenResponse = Self::check_status(response).await?.json().await?;
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parsing() {
        assert_eq!("short".parse::<SummaryFormat>().unwrap(), SummaryFormat::Short);
        assert_eq!("topic".parse::<SummaryFormat>().unwrap(), SummaryFormat::Topic);
        assert_eq!("qa".parse::<SummaryFormat>().unwrap(), SummaryFormat::Qa);
        assert!("long".parse::<SummaryFormat>().is_err());
    }

    #[test]
    fn test_format_serde_lowercase() {
        let json = serde_json::to_string(&SummaryFormat::Qa).unwrap();
        assert_eq!(json, "\"qa\"");
        let parsed: SummaryFormat = serde_json::from_str("\"topic\"").unwrap();
        assert_eq!(parsed, SummaryFormat::Topic);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = BackendClient::new("http://localhost:8000/", 30).unwrap();
        assert_eq!(client.url("/api/health"), "http://localhost:8000/api/health");
    }

    #[test]
    fn test_chat_turn_roles() {
        assert_eq!(ChatTurn::user("hi").role, "user");
        assert_eq!(ChatTurn::assistant("hello").role, "assistant");
    }
}
