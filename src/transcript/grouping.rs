//! Paragraph grouping heuristic
//!
//! Converts flat caption segments into readable paragraphs using pause
//! duration and punctuation. Pure function, re-run on every transcript or
//! language change.

use super::{GroupedSegment, TranscriptSegment};

/// Silence longer than this always starts a new paragraph.
const HARD_GAP_SECONDS: f64 = 2.0;

/// Silence after a sentence-ending segment that starts a new paragraph.
const SENTENCE_GAP_SECONDS: f64 = 1.0;

/// Maximum number of segments accumulated into one paragraph.
const MAX_GROUP_SEGMENTS: usize = 8;

/// Segments shorter than this with very few words never force a break.
const FILLER_MAX_DURATION: f64 = 0.5;
const FILLER_MAX_WORDS: usize = 2;

/// Group ordered caption segments into paragraphs.
///
/// A new paragraph starts when the silence before a segment exceeds 2s, when
/// the previous segment ended a sentence and the silence exceeds 1s, or when
/// the current paragraph already holds 8 segments. Short fillers ("mm-hmm",
/// "yeah") never trigger a break on their own. The first word of the
/// transcript and the first word after a sentence-ending break are
/// capitalized.
pub fn group_segments(segments: &[TranscriptSegment]) -> Vec<GroupedSegment> {
    let mut groups: Vec<GroupedSegment> = Vec::new();
    let mut current: Option<GroupBuilder> = None;
    let mut capitalize_next = true;

    for seg in segments {
        let text = seg.text.trim();
        if text.is_empty() {
            continue;
        }
        let start = seg.start_seconds.unwrap_or(0.0);

        if let Some(builder) = current.as_mut() {
            let gap = start - builder.last_end;
            let sentence_end = ends_sentence(&builder.last_text);

            let mut should_break = gap > HARD_GAP_SECONDS
                || (sentence_end && gap > SENTENCE_GAP_SECONDS)
                || builder.count >= MAX_GROUP_SEGMENTS;

            if should_break && is_filler(seg, text) {
                should_break = false;
            }

            if should_break {
                let finished = current.take().map(GroupBuilder::finish);
                groups.extend(finished);
                capitalize_next = sentence_end;
            }
        }

        let rendered = if capitalize_next {
            capitalize_first(text)
        } else {
            text.to_string()
        };
        capitalize_next = false;

        match current.as_mut() {
            Some(builder) => builder.push(seg, start, text, rendered),
            None => current = Some(GroupBuilder::start(seg, start, text, rendered)),
        }
    }

    if let Some(builder) = current {
        groups.push(builder.finish());
    }

    groups
}

struct GroupBuilder {
    timestamp: String,
    start_seconds: f64,
    parts: Vec<String>,
    count: usize,
    last_end: f64,
    last_text: String,
}

impl GroupBuilder {
    fn start(seg: &TranscriptSegment, start: f64, text: &str, rendered: String) -> Self {
        Self {
            timestamp: seg.timestamp.clone(),
            start_seconds: start,
            parts: vec![rendered],
            count: 1,
            last_end: start + seg.duration.unwrap_or(0.0),
            last_text: text.to_string(),
        }
    }

    fn push(&mut self, seg: &TranscriptSegment, start: f64, text: &str, rendered: String) {
        self.parts.push(rendered);
        self.count += 1;
        self.last_end = start + seg.duration.unwrap_or(0.0);
        self.last_text = text.to_string();
    }

    fn finish(self) -> GroupedSegment {
        GroupedSegment {
            timestamp: self.timestamp,
            start_seconds: self.start_seconds,
            text: self.parts.join(" "),
        }
    }
}

fn ends_sentence(text: &str) -> bool {
    matches!(text.trim_end().chars().last(), Some('.') | Some('!') | Some('?'))
}

fn is_filler(seg: &TranscriptSegment, text: &str) -> bool {
    seg.duration.map_or(false, |d| d < FILLER_MAX_DURATION)
        && text.split_whitespace().count() <= FILLER_MAX_WORDS
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(start: f64, duration: f64, text: &str) -> TranscriptSegment {
        TranscriptSegment::new(start, duration, text)
    }

    /// Contiguous segments, no punctuation: consecutive runs of at most 8.
    #[test]
    fn test_no_gaps_no_punctuation_groups_of_at_most_eight() {
        let segments: Vec<_> = (0..20)
            .map(|i| seg(i as f64, 1.0, "more words here"))
            .collect();

        let groups = group_segments(&segments);
        assert_eq!(groups.len(), 3);
        for group in &groups {
            let words = group.text.split_whitespace().count();
            assert!(words <= 8 * 3, "group too large: {}", group.text);
        }
        // 8 + 8 + 4 segments
        assert_eq!(groups[0].text.split_whitespace().count(), 24);
        assert_eq!(groups[2].text.split_whitespace().count(), 12);
    }

    #[test]
    fn test_sentence_end_with_gap_starts_capitalized_group() {
        let segments = vec![
            seg(0.0, 1.0, "that wraps it up."),
            seg(2.5, 1.0, "next topic starts here"),
        ];

        let groups = group_segments(&segments);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].text, "That wraps it up.");
        assert_eq!(groups[1].text, "Next topic starts here");
        assert_eq!(groups[1].start_seconds, 2.5);
    }

    #[test]
    fn test_sentence_end_with_short_gap_stays_in_group() {
        let segments = vec![
            seg(0.0, 1.0, "short sentence."),
            seg(1.5, 1.0, "continues right away"),
        ];

        let groups = group_segments(&segments);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].text, "Short sentence. continues right away");
    }

    #[test]
    fn test_hard_gap_breaks_without_capitalizing() {
        let segments = vec![
            seg(0.0, 1.0, "no punctuation here"),
            seg(4.0, 1.0, "still lowercase after pause"),
        ];

        let groups = group_segments(&segments);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1].text, "still lowercase after pause");
    }

    #[test]
    fn test_filler_suppresses_count_break() {
        let mut segments: Vec<_> = (0..8)
            .map(|i| seg(i as f64, 1.0, "steady talking continues"))
            .collect();
        // Ninth segment would normally break at the 8-segment cap, but it is
        // a short filler.
        segments.push(seg(8.0, 0.3, "mm hmm"));
        segments.push(seg(8.3, 1.0, "and now a real segment"));

        let groups = group_segments(&segments);
        assert_eq!(groups.len(), 2);
        assert!(groups[0].text.ends_with("mm hmm"));
        assert_eq!(groups[1].text, "and now a real segment");
    }

    #[test]
    fn test_empty_transcript() {
        assert!(group_segments(&[]).is_empty());
    }

    #[test]
    fn test_single_segment() {
        let groups = group_segments(&[seg(12.0, 3.0, "just one line")]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].text, "Just one line");
        assert_eq!(groups[0].timestamp, "00:12");
    }

    #[test]
    fn test_blank_segments_are_skipped() {
        let segments = vec![seg(0.0, 1.0, "  "), seg(1.0, 1.0, "real text")];
        let groups = group_segments(&segments);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].text, "Real text");
    }
}
