pub mod grouping;
pub mod url;

use serde::{Deserialize, Serialize};

pub use grouping::group_segments;
pub use url::{extract_video_id, is_valid_video_id, parse_video_urls, validate_batch_input};

/// One caption unit as returned by the backend. Immutable once fetched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptSegment {
    /// Display timestamp ("MM:SS" or "HH:MM:SS")
    pub timestamp: String,

    /// Start offset in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_seconds: Option<f64>,

    /// Segment duration in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    /// Caption text
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(start_seconds: f64, duration: f64, text: impl Into<String>) -> Self {
        Self {
            timestamp: format_timestamp(start_seconds),
            start_seconds: Some(start_seconds),
            duration: Some(duration),
            text: text.into(),
        }
    }
}

/// A readable paragraph derived from consecutive caption segments.
///
/// Recomputed from the raw segments on every transcript or language change;
/// never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupedSegment {
    pub timestamp: String,
    pub start_seconds: f64,
    pub text: String,
}

/// A full transcript for one video in one language.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptResult {
    pub video_id: String,
    pub language: String,
    /// True for auto-generated or AI-translated tracks
    pub is_generated: bool,
    pub transcript: Vec<TranscriptSegment>,
    pub full_text: String,
}

impl TranscriptResult {
    /// Rebuild the joined plain-text form from the segments.
    pub fn join_text(segments: &[TranscriptSegment]) -> String {
        segments
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// One caption track advertised by the video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableLanguage {
    pub code: String,
    pub name: String,
    pub is_generated: bool,
    pub is_translatable: bool,
}

/// Format seconds as "MM:SS", or "HH:MM:SS" once the hour mark is passed.
pub fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}
