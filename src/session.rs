//! Per-video session state machine.
//!
//! Owns everything the sidebar shows for the active video: the per-language
//! transcript cache, the background-translation polling loop, per-format
//! summary records with per-format in-flight tracking, and the chat history.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::cache::VideoRecord;
use crate::client::{BackendApi, ChatTurn, SummaryFormat};
use crate::transcript::{
    group_segments, AvailableLanguage, GroupedSegment, TranscriptResult, TranscriptSegment,
};

/// Fixed delay between translation polls.
pub const TRANSLATION_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Fixed poll budget; together with the interval this caps waiting at ~15s.
pub const TRANSLATION_MAX_ATTEMPTS: u32 = 30;

/// How many prior turns accompany each chat request.
const CHAT_HISTORY_WINDOW: usize = 6;

/// Transcript loading axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptState {
    NotLoaded,
    Loading,
    Loaded,
}

/// Background-translation axis, orthogonal to transcript loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationState {
    Idle,
    Translating { attempts: u32 },
    Translated,
    TimedOut,
}

/// One generated summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryRecord {
    pub text: String,
    /// True when the text carries clickable timestamp links
    pub is_structured: bool,
}

/// State for one video being read.
pub struct VideoSession {
    video_id: String,
    backend: Arc<dyn BackendApi>,

    pub transcript_state: TranscriptState,
    pub translation: TranslationState,

    current_language: String,
    /// Language code -> segments; AI translations cached under "en"
    transcripts: HashMap<String, Vec<TranscriptSegment>>,
    available: Vec<AvailableLanguage>,

    summaries: HashMap<SummaryFormat, SummaryRecord>,
    /// Formats with a generation call in flight. Per-format rather than a
    /// single flag: a loading format must never hide another format's
    /// cached summary.
    in_flight: HashSet<SummaryFormat>,

    chat_history: Vec<ChatTurn>,
    /// question-hash:language -> cached answer
    chat_memo: HashMap<String, String>,
    suggested: Option<Vec<String>>,

    last_error: Option<String>,

    poll_interval: Duration,
    max_poll_attempts: u32,
}

impl VideoSession {
    pub fn new(video_id: impl Into<String>, backend: Arc<dyn BackendApi>) -> Self {
        Self {
            video_id: video_id.into(),
            backend,
            transcript_state: TranscriptState::NotLoaded,
            translation: TranslationState::Idle,
            current_language: "en".to_string(),
            transcripts: HashMap::new(),
            available: Vec::new(),
            summaries: HashMap::new(),
            in_flight: HashSet::new(),
            chat_history: Vec::new(),
            chat_memo: HashMap::new(),
            suggested: None,
            last_error: None,
            poll_interval: TRANSLATION_POLL_INTERVAL,
            max_poll_attempts: TRANSLATION_MAX_ATTEMPTS,
        }
    }

    /// Override the polling cadence (tests use a short interval).
    pub fn with_polling(mut self, poll_interval: Duration, max_poll_attempts: u32) -> Self {
        self.poll_interval = poll_interval;
        self.max_poll_attempts = max_poll_attempts;
        self
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn current_language(&self) -> &str {
        &self.current_language
    }

    pub fn available_languages(&self) -> &[AvailableLanguage] {
        &self.available
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Segments for the language currently being read.
    pub fn segments(&self) -> Option<&Vec<TranscriptSegment>> {
        self.transcripts.get(&self.current_language)
    }

    /// Readable paragraphs, recomputed from the current segments.
    pub fn paragraphs(&self) -> Vec<GroupedSegment> {
        self.segments()
            .map(|segments| group_segments(segments))
            .unwrap_or_default()
    }

    /// Switch to a language that is already cached.
    pub fn set_language(&mut self, language: &str) -> bool {
        if self.transcripts.contains_key(language) {
            self.current_language = language.to_string();
            true
        } else {
            false
        }
    }

    /// Fetch available captions and the default-language transcript.
    pub async fn load(&mut self, preferred_language: Option<&str>) -> Result<()> {
        self.transcript_state = TranscriptState::Loading;
        self.last_error = None;

        match self.load_inner(preferred_language).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.transcript_state = TranscriptState::NotLoaded;
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    async fn load_inner(&mut self, preferred_language: Option<&str>) -> Result<()> {
        self.available = self.backend.available_languages(&self.video_id).await?;

        let preferred = vec![preferred_language.unwrap_or("en").to_string()];
        let result = self
            .backend
            .fetch_transcript(&self.video_id, &preferred)
            .await?;

        info!(
            "📜 Loaded {} segments ({}) for {}",
            result.transcript.len(),
            result.language,
            self.video_id
        );

        self.current_language = result.language.clone();
        self.transcripts.insert(result.language, result.transcript);
        self.transcript_state = TranscriptState::Loaded;
        Ok(())
    }

    fn has_native_english(&self) -> bool {
        self.available.iter().any(|track| track.code == "en")
    }

    /// True when an English transcript can only come from AI translation.
    pub fn needs_translation(&self) -> bool {
        self.current_language != "en"
            && !self.has_native_english()
            && !self.transcripts.contains_key("en")
    }

    /// Make an English transcript available, translating if necessary.
    ///
    /// Native English tracks are fetched directly. Otherwise a background
    /// translation is requested and polled at a fixed interval with a fixed
    /// attempt budget; on success the translation is cached under "en" and
    /// the session auto-switches to it if still reading a non-English
    /// language. The `cancel` signal stops the poll loop early, e.g. when
    /// the viewer navigates away.
    pub async fn ensure_english(
        &mut self,
        cancel: &mut watch::Receiver<bool>,
    ) -> Result<TranslationState> {
        if self.current_language == "en" || self.transcripts.contains_key("en") {
            self.translation = TranslationState::Translated;
            return Ok(self.translation);
        }

        if self.has_native_english() {
            let result = self
                .backend
                .fetch_transcript(&self.video_id, &["en".to_string()])
                .await?;
            self.transcripts.insert("en".to_string(), result.transcript);
            self.translation = TranslationState::Translated;
            return Ok(self.translation);
        }

        let source = self.current_language.clone();
        self.translation = TranslationState::Translating { attempts: 0 };
        self.backend
            .request_translation(&self.video_id, &source)
            .await?;
        info!(
            "🌐 Requested translation of {} from {}, polling for completion",
            self.video_id, source
        );

        let mut ticker = interval(self.poll_interval);
        let mut attempts = 0;
        while attempts < self.max_poll_attempts {
            tokio::select! {
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        debug!("Translation poll cancelled for {}", self.video_id);
                        self.translation = TranslationState::Idle;
                        return Ok(self.translation);
                    }
                }
                _ = ticker.tick() => {
                    attempts += 1;
                    self.translation = TranslationState::Translating { attempts };

                    let tracks = self
                        .backend
                        .languages_with_translation(&self.video_id)
                        .await?;
                    if tracks.iter().any(|track| track.code == "en") {
                        let result = self
                            .backend
                            .fetch_transcript(&self.video_id, &["en".to_string()])
                            .await?;
                        self.transcripts.insert("en".to_string(), result.transcript);
                        if self.current_language != "en" {
                            info!("🔁 Switching {} to translated English", self.video_id);
                            self.current_language = "en".to_string();
                        }
                        self.translation = TranslationState::Translated;
                        return Ok(self.translation);
                    }
                }
            }
        }

        warn!(
            "⏳ No translation for {} after {} polls, giving up",
            self.video_id, self.max_poll_attempts
        );
        self.translation = TranslationState::TimedOut;
        Ok(self.translation)
    }

    /// A format renders its summary only when a record exists AND that
    /// specific format is not being regenerated. A loading `topic` must not
    /// blank an already-cached `short`.
    pub fn is_summary_visible(&self, format: SummaryFormat) -> bool {
        self.summaries.contains_key(&format) && !self.in_flight.contains(&format)
    }

    pub fn is_generating(&self, format: SummaryFormat) -> bool {
        self.in_flight.contains(&format)
    }

    pub fn summary(&self, format: SummaryFormat) -> Option<&SummaryRecord> {
        self.summaries.get(&format)
    }

    /// Mark a format as in flight. Returns false when already generating.
    pub fn begin_summary(&mut self, format: SummaryFormat) -> bool {
        self.in_flight.insert(format)
    }

    pub fn complete_summary(&mut self, format: SummaryFormat, record: SummaryRecord) {
        self.summaries.insert(format, record);
        self.in_flight.remove(&format);
    }

    pub fn fail_summary(&mut self, format: SummaryFormat, error: String) {
        self.in_flight.remove(&format);
        self.last_error = Some(error);
    }

    /// Generate (or return the cached) summary for one format.
    pub async fn generate_summary(&mut self, format: SummaryFormat) -> Result<SummaryRecord> {
        if let Some(existing) = self.summaries.get(&format) {
            debug!("Summary cache hit for {} ({})", self.video_id, format);
            return Ok(existing.clone());
        }

        let segments = self
            .segments()
            .ok_or_else(|| anyhow!("No transcript loaded"))?
            .clone();

        if !self.begin_summary(format) {
            return Err(anyhow!("A {} summary is already being generated", format));
        }

        match self
            .backend
            .generate_summary(&self.video_id, &segments, format, &self.current_language)
            .await
        {
            Ok(outcome) => {
                let record = SummaryRecord {
                    text: outcome.summary,
                    is_structured: outcome.is_structured,
                };
                self.complete_summary(format, record.clone());
                Ok(record)
            }
            Err(e) => {
                self.fail_summary(format, e.to_string());
                Err(e)
            }
        }
    }

    pub fn chat_history(&self) -> &[ChatTurn] {
        &self.chat_history
    }

    /// Ask a question about the video. Answers are memoized per question
    /// and language; a repeated question replays without a backend call.
    pub async fn ask(&mut self, question: &str) -> Result<String> {
        let question = question.trim();
        if question.is_empty() {
            return Err(anyhow!("Question cannot be empty"));
        }

        let segments = self
            .segments()
            .ok_or_else(|| anyhow!("No transcript loaded"))?;
        let transcript_text = TranscriptResult::join_text(segments);

        let digest = format!("{:x}", md5::compute(question));
        let memo_key = format!("{}:{}", &digest[..16], self.current_language);

        if let Some(answer) = self.chat_memo.get(&memo_key).cloned() {
            debug!("Chat memo hit for {}", self.video_id);
            self.chat_history.push(ChatTurn::user(question));
            self.chat_history.push(ChatTurn::assistant(answer.clone()));
            return Ok(answer);
        }

        let window_start = self.chat_history.len().saturating_sub(CHAT_HISTORY_WINDOW);
        let history = self.chat_history[window_start..].to_vec();

        let answer = self
            .backend
            .chat_message(
                &self.video_id,
                &transcript_text,
                question,
                &history,
                &self.current_language,
            )
            .await?;

        self.chat_history.push(ChatTurn::user(question));
        self.chat_history.push(ChatTurn::assistant(answer.clone()));
        self.chat_memo.insert(memo_key, answer.clone());
        Ok(answer)
    }

    /// Suggested questions for this video, fetched once.
    pub async fn suggested_questions(&mut self) -> Result<Vec<String>> {
        if let Some(questions) = &self.suggested {
            return Ok(questions.clone());
        }

        let segments = self
            .segments()
            .ok_or_else(|| anyhow!("No transcript loaded"))?;
        let transcript_text = TranscriptResult::join_text(segments);

        let questions = self
            .backend
            .suggested_questions(&self.video_id, &transcript_text, &self.current_language)
            .await?;
        self.suggested = Some(questions.clone());
        Ok(questions)
    }

    /// Capture the session for the persisted per-video cache.
    pub fn snapshot(&self) -> VideoRecord {
        let mut record = VideoRecord::new(self.video_id.as_str(), self.current_language.as_str());
        record.transcripts = self.transcripts.clone();
        record.summaries = self.summaries.clone();
        record.chat_history = self.chat_history.clone();
        record
    }

    /// Restore state from a cached record.
    pub fn hydrate(&mut self, record: VideoRecord) {
        self.current_language = record.language;
        self.transcripts = record.transcripts;
        self.summaries = record.summaries;
        self.chat_history = record.chat_history;
        if self.transcripts.contains_key(&self.current_language) {
            self.transcript_state = TranscriptState::Loaded;
        }
        if self.transcripts.contains_key("en") {
            self.translation = TranslationState::Translated;
        }
    }
}
