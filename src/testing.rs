//! Shared test double for the backend API.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::auth::TokenResponse;
use crate::client::{BackendApi, ChatTurn, SummaryFormat, SummaryOutcome};
use crate::error::ExtractionError;
use crate::library::{SaveItemRequest, SavedItem};
use crate::transcript::{AvailableLanguage, TranscriptResult, TranscriptSegment};

pub fn language(code: &str, generated: bool) -> AvailableLanguage {
    AvailableLanguage {
        code: code.to_string(),
        name: code.to_string(),
        is_generated: generated,
        is_translatable: true,
    }
}

pub fn transcript(video_id: &str, lang: &str, texts: &[&str]) -> TranscriptResult {
    let segments: Vec<TranscriptSegment> = texts
        .iter()
        .enumerate()
        .map(|(i, text)| TranscriptSegment::new(i as f64 * 2.0, 1.5, *text))
        .collect();
    let full_text = TranscriptResult::join_text(&segments);
    TranscriptResult {
        video_id: video_id.to_string(),
        language: lang.to_string(),
        is_generated: false,
        transcript: segments,
        full_text,
    }
}

/// Configurable in-memory backend. Every call is logged by method name so
/// tests can assert on call counts.
#[derive(Default)]
pub struct MockBackend {
    /// Transcripts keyed by language code
    pub transcripts: HashMap<String, TranscriptResult>,
    /// Language served when no requested language matches
    pub default_language: Option<String>,
    pub languages: Vec<AvailableLanguage>,
    /// Successive responses for `languages_with_translation`; once drained,
    /// the last response (or `languages`) repeats
    pub translation_polls: Mutex<VecDeque<Vec<AvailableLanguage>>>,
    pub summary: Option<SummaryOutcome>,
    pub questions: Vec<String>,
    pub chat_reply: Option<String>,
    pub saved: Vec<SavedItem>,
    pub refresh: Option<TokenResponse>,
    pub calls: Mutex<Vec<&'static str>>,
}

impl MockBackend {
    fn log(&self, name: &'static str) {
        self.calls.lock().unwrap().push(name);
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == name).count()
    }
}

#[async_trait]
impl BackendApi for MockBackend {
    async fn fetch_transcript(
        &self,
        _video_id: &str,
        languages: &[String],
    ) -> Result<TranscriptResult> {
        self.log("fetch_transcript");
        for lang in languages {
            if let Some(result) = self.transcripts.get(lang) {
                return Ok(result.clone());
            }
        }
        self.default_language
            .as_ref()
            .and_then(|lang| self.transcripts.get(lang))
            .cloned()
            .ok_or_else(|| ExtractionError::NoCaptions.into())
    }

    async fn available_languages(&self, _video_id: &str) -> Result<Vec<AvailableLanguage>> {
        self.log("available_languages");
        Ok(self.languages.clone())
    }

    async fn languages_with_translation(
        &self,
        _video_id: &str,
    ) -> Result<Vec<AvailableLanguage>> {
        self.log("languages_with_translation");
        let mut polls = self.translation_polls.lock().unwrap();
        if polls.len() > 1 {
            return Ok(polls.pop_front().unwrap());
        }
        Ok(polls.front().cloned().unwrap_or_else(|| self.languages.clone()))
    }

    async fn request_translation(&self, _video_id: &str, _source_language: &str) -> Result<()> {
        self.log("request_translation");
        Ok(())
    }

    async fn generate_summary(
        &self,
        _video_id: &str,
        _transcript: &[TranscriptSegment],
        _format: SummaryFormat,
        _language: &str,
    ) -> Result<SummaryOutcome> {
        self.log("generate_summary");
        self.summary
            .clone()
            .ok_or_else(|| anyhow!("Failed to generate summary."))
    }

    async fn suggested_questions(
        &self,
        _video_id: &str,
        _transcript_text: &str,
        _language: &str,
    ) -> Result<Vec<String>> {
        self.log("suggested_questions");
        Ok(self.questions.clone())
    }

    async fn chat_message(
        &self,
        _video_id: &str,
        _transcript_text: &str,
        _question: &str,
        _history: &[ChatTurn],
        _language: &str,
    ) -> Result<String> {
        self.log("chat_message");
        self.chat_reply
            .clone()
            .ok_or_else(|| anyhow!("Failed to generate response."))
    }

    async fn save_item(&self, _request: &SaveItemRequest) -> Result<()> {
        self.log("save_item");
        Ok(())
    }

    async fn list_saved_items(&self, item_type: Option<&str>) -> Result<Vec<SavedItem>> {
        self.log("list_saved_items");
        let items = match item_type {
            Some(kind) => self
                .saved
                .iter()
                .filter(|item| item.item_type == kind)
                .cloned()
                .collect(),
            None => self.saved.clone(),
        };
        Ok(items)
    }

    async fn delete_saved_item(&self, _video_id: &str, _item_type: &str) -> Result<()> {
        self.log("delete_saved_item");
        Ok(())
    }

    async fn refresh_tokens(&self, _refresh_token: &str) -> Result<TokenResponse> {
        self.log("refresh_tokens");
        self.refresh
            .clone()
            .ok_or_else(|| anyhow!("Invalid refresh token"))
    }
}
