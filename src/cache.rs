//! Persisted per-video cache.
//!
//! One JSON file per video (`video_{id}.json`) holding the per-language
//! transcript cache, generated summaries and chat history. The TTL is
//! enforced at read time: an expired record is discarded wholesale and its
//! file removed, never partially reused.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

use crate::client::{ChatTurn, SummaryFormat};
use crate::session::SummaryRecord;
use crate::transcript::TranscriptSegment;

/// Default record lifetime.
pub const DEFAULT_TTL_HOURS: u64 = 24;

/// Everything cached for one video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRecord {
    pub video_id: String,

    /// Unix timestamp (seconds) of the last write
    pub saved_at: u64,

    /// Language the viewer was last reading
    pub language: String,

    /// Per-language transcript cache; AI translations land under "en"
    pub transcripts: HashMap<String, Vec<TranscriptSegment>>,

    /// Generated summaries keyed by format
    pub summaries: HashMap<SummaryFormat, SummaryRecord>,

    pub chat_history: Vec<ChatTurn>,
}

impl VideoRecord {
    pub fn new(video_id: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            saved_at: unix_now(),
            language: language.into(),
            transcripts: HashMap::new(),
            summaries: HashMap::new(),
            chat_history: Vec::new(),
        }
    }

    /// Stamp the record with the current time before writing.
    pub fn touch(&mut self) {
        self.saved_at = unix_now();
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Cache statistics.
#[derive(Debug, Default, Clone, Serialize)]
pub struct CacheStats {
    pub total_files: usize,
    pub valid_files: usize,
    pub expired_files: usize,
}

/// Manages the on-disk video cache.
#[derive(Debug, Clone)]
pub struct VideoCacheStore {
    cache_dir: PathBuf,
    ttl_hours: u64,
}

impl VideoCacheStore {
    pub fn new(cache_dir: PathBuf, ttl_hours: u64) -> Self {
        Self { cache_dir, ttl_hours }
    }

    /// Create the cache directory.
    pub async fn initialize(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.cache_dir).await?;
        debug!("📁 Video cache directory ready: {}", self.cache_dir.display());
        Ok(())
    }

    fn record_path(&self, video_id: &str) -> PathBuf {
        self.cache_dir.join(format!("video_{}.json", video_id))
    }

    fn is_valid(&self, record: &VideoRecord) -> bool {
        let age_hours = unix_now().saturating_sub(record.saved_at) / 3600;
        age_hours < self.ttl_hours
    }

    /// Load the cached record for a video if present and within its TTL.
    ///
    /// Expired records are removed and `None` is returned; a stale record is
    /// never partially reused.
    pub async fn load(&self, video_id: &str) -> Option<VideoRecord> {
        let path = self.record_path(video_id);
        if !path.exists() {
            debug!("Cache miss for video {}", video_id);
            return None;
        }

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read cache file {}: {}", path.display(), e);
                return None;
            }
        };

        match serde_json::from_str::<VideoRecord>(&content) {
            Ok(record) => {
                if self.is_valid(&record) {
                    debug!("📋 Cache hit for video {}", video_id);
                    Some(record)
                } else {
                    info!("⏰ Cache expired for video {}", video_id);
                    let _ = tokio::fs::remove_file(&path).await;
                    None
                }
            }
            Err(e) => {
                warn!("Failed to parse cache file {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Write a record, stamping it with the current time.
    pub async fn save(&self, record: &mut VideoRecord) -> Result<()> {
        record.touch();
        let path = self.record_path(&record.video_id);
        let content = serde_json::to_string_pretty(record)?;
        tokio::fs::write(&path, content).await?;
        debug!("💾 Cached video {}", record.video_id);
        Ok(())
    }

    /// Remove a single video's record.
    pub async fn invalidate(&self, video_id: &str) -> Result<bool> {
        let path = self.record_path(video_id);
        if path.exists() {
            tokio::fs::remove_file(&path).await?;
            info!("🗑️ Invalidated cache for video {}", video_id);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Remove every expired record. Returns how many were removed.
    pub async fn cleanup_expired(&self) -> Result<usize> {
        let mut removed = 0;
        let mut entries = tokio::fs::read_dir(&self.cache_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !path.extension().map_or(false, |ext| ext == "json") {
                continue;
            }
            if let Ok(content) = tokio::fs::read_to_string(&path).await {
                if let Ok(record) = serde_json::from_str::<VideoRecord>(&content) {
                    if !self.is_valid(&record) && tokio::fs::remove_file(&path).await.is_ok() {
                        removed += 1;
                    }
                }
            }
        }

        if removed > 0 {
            info!("🧹 Cleaned up {} expired video records", removed);
        }
        Ok(removed)
    }

    /// Count valid and expired records.
    pub async fn stats(&self) -> Result<CacheStats> {
        let mut stats = CacheStats::default();
        let mut entries = tokio::fs::read_dir(&self.cache_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !path.extension().map_or(false, |ext| ext == "json") {
                continue;
            }
            stats.total_files += 1;
            if let Ok(content) = tokio::fs::read_to_string(&path).await {
                if let Ok(record) = serde_json::from_str::<VideoRecord>(&content) {
                    if self.is_valid(&record) {
                        stats.valid_files += 1;
                    } else {
                        stats.expired_files += 1;
                    }
                }
            }
        }

        Ok(stats)
    }

    /// Remove every record regardless of age. Returns how many were removed.
    pub async fn clear_all(&self) -> Result<usize> {
        let mut removed = 0;
        let mut entries = tokio::fs::read_dir(&self.cache_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json")
                && tokio::fs::remove_file(&path).await.is_ok()
            {
                removed += 1;
            }
        }

        if removed > 0 {
            info!("🧹 Cleared {} video records", removed);
        }
        Ok(removed)
    }
}
