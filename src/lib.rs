/// TubeScribe - Rust Implementation
///
/// Client core for YouTube transcript extraction, AI summaries and video chat.
/// Talks to an external transcript/summarization backend over REST and owns the
/// per-video session state, caching and saved-items library logic.

pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod library;
pub mod router;
pub mod session;
pub mod transcript;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types for easy access
pub use crate::auth::{AuthManager, AuthState, TokenResponse};
pub use crate::cache::{VideoCacheStore, VideoRecord};
pub use crate::client::{BackendApi, BackendClient, SummaryFormat, SummaryOutcome, ChatTurn};
pub use crate::config::Config;
pub use crate::error::ExtractionError;
pub use crate::library::{LibraryCard, SavedContent, SavedItem, merge_saved_items};
pub use crate::router::{dispatch, dispatch_json, RouterRequest, RouterResponse};
pub use crate::session::{SummaryRecord, TranslationState, TranscriptState, VideoSession};
pub use crate::transcript::{
    AvailableLanguage, GroupedSegment, TranscriptResult, TranscriptSegment,
};
