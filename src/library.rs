//! Saved-items library: backend rows and the client-side merge into
//! per-video display cards.
//!
//! The `content` column went through three historical shapes (direct fields,
//! a `summaries` object, a nested `formats` object). They are modeled as an
//! explicit tagged union so every reader goes through one migration point
//! instead of cascading shape checks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::client::SummaryFormat;
use crate::transcript::TranscriptSegment;

/// Item kinds the backend stores.
pub const ITEM_TYPE_TRANSCRIPT: &str = "transcript";
pub const ITEM_TYPE_SUMMARY: &str = "summary";
pub const ITEM_TYPE_CHAT: &str = "chat";

/// A summary as stored inside the newest (`formats`) content shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavedSummary {
    pub summary: String,
    #[serde(default)]
    pub is_structured: bool,
}

/// Content payload of a saved item, covering all historical shapes.
///
/// Variant order matters: serde tries them top to bottom and `Direct`
/// accepts any object, so it must come last.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SavedContent {
    /// Current shape: summaries nested under a `formats` object
    Formats {
        formats: HashMap<SummaryFormat, SavedSummary>,
    },

    /// Intermediate shape: a flat `summaries` map of format to text
    Summaries {
        summaries: HashMap<SummaryFormat, String>,
    },

    /// Oldest shape: fields stored directly on the content object
    Direct(DirectContent),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DirectContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<SummaryFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<Vec<TranscriptSegment>>,
}

impl SavedContent {
    /// Summary formats present in this content, regardless of shape.
    pub fn summary_formats(&self) -> Vec<SummaryFormat> {
        match self {
            Self::Formats { formats } => {
                let mut present: Vec<_> = SummaryFormat::all()
                    .into_iter()
                    .filter(|f| formats.contains_key(f))
                    .collect();
                present.dedup();
                present
            }
            Self::Summaries { summaries } => SummaryFormat::all()
                .into_iter()
                .filter(|f| summaries.contains_key(f))
                .collect(),
            Self::Direct(direct) => {
                if direct.summary.is_some() {
                    vec![direct.format.unwrap_or(SummaryFormat::Short)]
                } else {
                    Vec::new()
                }
            }
        }
    }

    /// Summary text for one format, if present.
    pub fn summary_text(&self, format: SummaryFormat) -> Option<&str> {
        match self {
            Self::Formats { formats } => formats.get(&format).map(|s| s.summary.as_str()),
            Self::Summaries { summaries } => summaries.get(&format).map(String::as_str),
            Self::Direct(direct) => {
                if direct.format.unwrap_or(SummaryFormat::Short) == format {
                    direct.summary.as_deref()
                } else {
                    None
                }
            }
        }
    }

    /// Transcript segments, when this content holds a transcript.
    pub fn transcript_segments(&self) -> Option<&[TranscriptSegment]> {
        match self {
            Self::Direct(direct) => direct.transcript.as_deref(),
            _ => None,
        }
    }
}

/// One backend row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedItem {
    #[serde(default)]
    pub id: Option<String>,
    pub video_id: String,
    pub item_type: String,
    #[serde(default)]
    pub format: Option<String>,
    pub content: SavedContent,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub source: Option<String>,
}

impl SavedItem {
    /// Fold the legacy `summary_short|summary_topic|summary_qa` item types
    /// into `summary` plus a format column.
    pub fn normalize(&mut self) {
        if let Some(suffix) = self.item_type.strip_prefix("summary_") {
            self.format = Some(suffix.to_string());
            self.item_type = ITEM_TYPE_SUMMARY.to_string();
        }
    }
}

/// Save payload sent to the backend.
#[derive(Debug, Clone, Serialize)]
pub struct SaveItemRequest {
    pub video_id: String,
    pub item_type: String,
    pub content: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// One display card per video, merged from that video's saved rows.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LibraryCard {
    pub video_id: String,
    pub has_transcript: bool,
    pub has_summary: bool,
    pub has_chat: bool,
    pub summary_formats: Vec<SummaryFormat>,
    pub item_count: usize,
    pub latest: Option<DateTime<Utc>>,
    pub source: Option<String>,
}

/// Merge heterogeneous saved rows into one card per video.
///
/// Rows sharing a `video_id` collapse into a single card exposing one badge
/// per item type present. Cards are ordered newest first.
pub fn merge_saved_items(mut items: Vec<SavedItem>) -> Vec<LibraryCard> {
    let mut order: Vec<String> = Vec::new();
    let mut cards: HashMap<String, LibraryCard> = HashMap::new();

    for item in items.iter_mut() {
        item.normalize();

        let card = cards
            .entry(item.video_id.clone())
            .or_insert_with(|| {
                order.push(item.video_id.clone());
                LibraryCard {
                    video_id: item.video_id.clone(),
                    has_transcript: false,
                    has_summary: false,
                    has_chat: false,
                    summary_formats: Vec::new(),
                    item_count: 0,
                    latest: None,
                    source: None,
                }
            });

        card.item_count += 1;
        match item.item_type.as_str() {
            ITEM_TYPE_TRANSCRIPT => card.has_transcript = true,
            ITEM_TYPE_SUMMARY => {
                card.has_summary = true;
                let mut formats = item.content.summary_formats();
                if formats.is_empty() {
                    if let Some(format) = item.format.as_deref().and_then(|f| f.parse().ok()) {
                        formats.push(format);
                    }
                }
                for format in formats {
                    if !card.summary_formats.contains(&format) {
                        card.summary_formats.push(format);
                    }
                }
            }
            ITEM_TYPE_CHAT => card.has_chat = true,
            other => {
                tracing::debug!("Ignoring saved item with unknown type '{}'", other);
            }
        }

        if item.created_at > card.latest {
            card.latest = item.created_at;
        }
        if card.source.is_none() {
            card.source = item.source.clone();
        }
    }

    let mut merged: Vec<LibraryCard> = order
        .into_iter()
        .filter_map(|video_id| cards.remove(&video_id))
        .collect();
    merged.sort_by(|a, b| b.latest.cmp(&a.latest));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> Option<DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(2025, 6, 1, hour, 0, 0).unwrap())
    }

    fn transcript_row(video_id: &str, hour: u32) -> SavedItem {
        SavedItem {
            id: Some(format!("t-{}", video_id)),
            video_id: video_id.to_string(),
            item_type: ITEM_TYPE_TRANSCRIPT.to_string(),
            format: Some("transcript".to_string()),
            content: SavedContent::Direct(DirectContent {
                transcript: Some(vec![TranscriptSegment::new(0.0, 1.0, "hello")]),
                ..DirectContent::default()
            }),
            created_at: at(hour),
            source: Some("extension".to_string()),
        }
    }

    fn summary_row(video_id: &str, hour: u32) -> SavedItem {
        let mut formats = HashMap::new();
        formats.insert(
            SummaryFormat::Short,
            SavedSummary { summary: "short one".to_string(), is_structured: true },
        );
        SavedItem {
            id: Some(format!("s-{}", video_id)),
            video_id: video_id.to_string(),
            item_type: ITEM_TYPE_SUMMARY.to_string(),
            format: Some("short".to_string()),
            content: SavedContent::Formats { formats },
            created_at: at(hour),
            source: Some("extension".to_string()),
        }
    }

    /// Two rows for one video merge into a single card with both badges.
    #[test]
    fn test_merge_transcript_and_summary_into_one_card() {
        let cards = merge_saved_items(vec![
            transcript_row("dQw4w9WgXcQ", 10),
            summary_row("dQw4w9WgXcQ", 11),
        ]);

        assert_eq!(cards.len(), 1);
        let card = &cards[0];
        assert!(card.has_transcript);
        assert!(card.has_summary);
        assert!(!card.has_chat);
        assert_eq!(card.summary_formats, vec![SummaryFormat::Short]);
        assert_eq!(card.item_count, 2);
        assert_eq!(card.latest, at(11));
    }

    #[test]
    fn test_merge_orders_cards_newest_first() {
        let cards = merge_saved_items(vec![
            transcript_row("aaaaaaaaaaa", 8),
            transcript_row("bbbbbbbbbbb", 12),
        ]);

        assert_eq!(cards[0].video_id, "bbbbbbbbbbb");
        assert_eq!(cards[1].video_id, "aaaaaaaaaaa");
    }

    #[test]
    fn test_legacy_item_type_normalizes_to_summary() {
        let mut item = summary_row("ccccccccccc", 9);
        item.item_type = "summary_topic".to_string();
        item.format = None;
        item.content = SavedContent::Direct(DirectContent {
            summary: Some("topic text".to_string()),
            format: Some(SummaryFormat::Topic),
            ..DirectContent::default()
        });

        let cards = merge_saved_items(vec![item]);
        assert!(cards[0].has_summary);
        assert_eq!(cards[0].summary_formats, vec![SummaryFormat::Topic]);
    }

    #[test]
    fn test_content_shape_formats() {
        let json = r#"{"formats": {"short": {"summary": "s", "is_structured": true}, "qa": {"summary": "q"}}}"#;
        let content: SavedContent = serde_json::from_str(json).unwrap();
        assert_eq!(
            content.summary_formats(),
            vec![SummaryFormat::Short, SummaryFormat::Qa]
        );
        assert_eq!(content.summary_text(SummaryFormat::Qa), Some("q"));
        assert_eq!(content.summary_text(SummaryFormat::Topic), None);
    }

    #[test]
    fn test_content_shape_summaries() {
        let json = r#"{"summaries": {"topic": "by topic"}}"#;
        let content: SavedContent = serde_json::from_str(json).unwrap();
        assert_eq!(content.summary_formats(), vec![SummaryFormat::Topic]);
        assert_eq!(content.summary_text(SummaryFormat::Topic), Some("by topic"));
    }

    #[test]
    fn test_content_shape_direct() {
        let json = r#"{"summary": "plain", "format": "short"}"#;
        let content: SavedContent = serde_json::from_str(json).unwrap();
        assert_eq!(content.summary_formats(), vec![SummaryFormat::Short]);
        assert_eq!(content.summary_text(SummaryFormat::Short), Some("plain"));
    }

    #[test]
    fn test_direct_transcript_content() {
        let json = r#"{"transcript": [{"timestamp": "00:00", "text": "hi"}]}"#;
        let content: SavedContent = serde_json::from_str(json).unwrap();
        let segments = content.transcript_segments().unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "hi");
    }
}
