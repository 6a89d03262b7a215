//! Markdown rendering for transcripts and summaries.

use crate::client::SummaryFormat;
use crate::session::SummaryRecord;
use crate::transcript::{group_segments, TranscriptSegment};

/// Render a transcript as Markdown, one grouped paragraph per entry.
pub fn transcript_to_markdown(
    title: &str,
    language: &str,
    segments: &[TranscriptSegment],
) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}\n\n", title));
    out.push_str(&format!("*Language: {}*\n\n", language));

    for paragraph in group_segments(segments) {
        out.push_str(&format!("**[{}]** {}\n\n", paragraph.timestamp, paragraph.text));
    }

    out
}

/// Render one generated summary as Markdown.
pub fn summary_to_markdown(title: &str, format: SummaryFormat, record: &SummaryRecord) -> String {
    let heading = match format {
        SummaryFormat::Short => "Summary",
        SummaryFormat::Topic => "Summary by Topic",
        SummaryFormat::Qa => "Q&A Summary",
    };

    format!("# {}\n\n## {}\n\n{}\n", title, heading, record.text)
}
