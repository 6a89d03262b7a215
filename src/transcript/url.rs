//! YouTube URL / video-ID parsing and batch input validation.

use anyhow::{anyhow, Result};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use url::Url;

/// Default cap on batch size for free-tier users.
pub const DEFAULT_BATCH_LIMIT: usize = 5;

fn video_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("static regex"))
}

/// Validate video ID format: exactly 11 characters of `[A-Za-z0-9_-]`.
pub fn is_valid_video_id(video_id: &str) -> bool {
    video_id_regex().is_match(video_id)
}

fn is_shorts_url(input: &str) -> bool {
    input.to_lowercase().contains("/shorts/")
}

/// Extract a video ID from a YouTube URL or validate a direct video ID.
///
/// Supported forms: `youtube.com/watch?v=ID`, `youtu.be/ID`,
/// `youtube.com/embed/ID`, `m.youtube.com/watch?v=ID` and the bare ID.
/// Shorts URLs are rejected outright.
pub fn extract_video_id(url_or_id: &str) -> Result<Option<String>> {
    let input = url_or_id.trim();

    if is_shorts_url(input) {
        return Err(anyhow!(
            "YouTube Shorts are not supported. Please paste a regular YouTube video URL."
        ));
    }

    if is_valid_video_id(input) {
        return Ok(Some(input.to_string()));
    }

    if input.contains("youtu.be/") {
        if let Ok(parsed) = Url::parse(input) {
            let candidate = parsed.path().trim_start_matches('/');
            if is_valid_video_id(candidate) {
                return Ok(Some(candidate.to_string()));
            }
        }
    } else if input.contains("youtube.com/") {
        if let Ok(parsed) = Url::parse(input) {
            if parsed.path().contains("/watch") {
                let candidate = parsed
                    .query_pairs()
                    .find(|(key, _)| key == "v")
                    .map(|(_, value)| value.into_owned());
                if let Some(id) = candidate {
                    if is_valid_video_id(&id) {
                        return Ok(Some(id));
                    }
                }
            } else if let Some(tail) = parsed.path().split("/embed/").nth(1) {
                if is_valid_video_id(tail) {
                    return Ok(Some(tail.to_string()));
                }
            }
        }
    }

    Ok(None)
}

/// Parse video IDs from multi-line input, one URL or ID per line.
///
/// Invalid lines are skipped; duplicates are removed with order preserved.
pub fn parse_video_urls(input: &str) -> Vec<String> {
    let mut ids = Vec::new();
    let mut seen = HashSet::new();

    for line in input.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Ok(Some(id)) = extract_video_id(line) {
            if seen.insert(id.clone()) {
                ids.push(id);
            }
        }
    }

    ids
}

/// Validation summary for batch input.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchValidation {
    pub video_ids: Vec<String>,
    pub total_valid: usize,
    pub total_invalid: usize,
    pub exceeds_limit: bool,
    pub error: Option<String>,
}

/// Validate multi-line batch input against a maximum video count.
pub fn validate_batch_input(input: &str, max_videos: Option<usize>) -> BatchValidation {
    if input.trim().is_empty() {
        return BatchValidation {
            video_ids: Vec::new(),
            total_valid: 0,
            total_invalid: 0,
            exceeds_limit: false,
            error: Some("No input provided".to_string()),
        };
    }

    let total_lines = input.lines().filter(|l| !l.trim().is_empty()).count();
    let video_ids = parse_video_urls(input);
    let total_valid = video_ids.len();
    let total_invalid = total_lines - total_valid;

    let limit = max_videos.unwrap_or(DEFAULT_BATCH_LIMIT);
    let exceeds_limit = total_valid > limit;
    let error = exceeds_limit.then(|| {
        format!(
            "Too many videos: {} detected, but limit is {}",
            total_valid, limit
        )
    });

    BatchValidation {
        video_ids,
        total_valid,
        total_invalid,
        exceeds_limit,
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_url() {
        let id = extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap();
        assert_eq!(id.as_deref(), Some("dQw4w9WgXcQ"));
    }

    #[test]
    fn test_short_url() {
        let id = extract_video_id("https://youtu.be/jNQXAC9IVRw").unwrap();
        assert_eq!(id.as_deref(), Some("jNQXAC9IVRw"));
    }

    #[test]
    fn test_embed_url() {
        let id = extract_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ").unwrap();
        assert_eq!(id.as_deref(), Some("dQw4w9WgXcQ"));
    }

    #[test]
    fn test_mobile_watch_url() {
        let id = extract_video_id("https://m.youtube.com/watch?v=dQw4w9WgXcQ&t=42s").unwrap();
        assert_eq!(id.as_deref(), Some("dQw4w9WgXcQ"));
    }

    #[test]
    fn test_direct_id() {
        let id = extract_video_id("dQw4w9WgXcQ").unwrap();
        assert_eq!(id.as_deref(), Some("dQw4w9WgXcQ"));
    }

    #[test]
    fn test_invalid_input() {
        assert_eq!(extract_video_id("not a url").unwrap(), None);
        assert_eq!(extract_video_id("dQw4w9WgXcQ123").unwrap(), None);
    }

    #[test]
    fn test_shorts_rejected() {
        assert!(extract_video_id("https://www.youtube.com/shorts/dQw4w9WgXcQ").is_err());
    }

    #[test]
    fn test_id_validation() {
        assert!(is_valid_video_id("dQw4w9WgXcQ"));
        assert!(!is_valid_video_id("invalid"));
        assert!(!is_valid_video_id("dQw4w9WgXcQ1"));
        assert!(!is_valid_video_id("dQw4w9WgXc!"));
    }

    #[test]
    fn test_multiline_parse_dedupes_and_preserves_order() {
        let input = "https://www.youtube.com/watch?v=dQw4w9WgXcQ\n\nhttps://youtu.be/jNQXAC9IVRw\ndQw4w9WgXcQ\nnot-a-video\n";
        let ids = parse_video_urls(input);
        assert_eq!(ids, vec!["dQw4w9WgXcQ", "jNQXAC9IVRw"]);
    }

    #[test]
    fn test_batch_validation_counts() {
        let input = "dQw4w9WgXcQ\ninvalid_line\njNQXAC9IVRw";
        let result = validate_batch_input(input, Some(5));
        assert_eq!(result.total_valid, 2);
        assert_eq!(result.total_invalid, 1);
        assert!(!result.exceeds_limit);
        assert!(result.error.is_none());
    }

    #[test]
    fn test_batch_validation_limit() {
        let ids = [
            "aaaaaaaaaaa",
            "bbbbbbbbbbb",
            "ccccccccccc",
            "ddddddddddd",
            "eeeeeeeeeee",
            "fffffffffff",
        ];
        let input = ids.join("\n");
        let result = validate_batch_input(&input, Some(5));
        assert!(result.exceeds_limit);
        assert!(result.error.unwrap().contains("limit is 5"));
    }

    #[test]
    fn test_batch_validation_empty_input() {
        let result = validate_batch_input("   \n  ", Some(5));
        assert_eq!(result.total_valid, 0);
        assert_eq!(result.error.as_deref(), Some("No input provided"));
    }
}
