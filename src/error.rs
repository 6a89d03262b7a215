use thiserror::Error;

/// Failure taxonomy reported by the backend's transcript extraction endpoint.
///
/// The backend tags every extraction failure with a machine-readable code;
/// everything else in the system carries plain display strings.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("This video does not have captions available.")]
    NoCaptions,

    #[error("Transcripts are disabled for this video.")]
    TranscriptsDisabled,

    #[error("This video is unavailable or does not exist.")]
    VideoUnavailable,

    #[error("YouTube is temporarily blocking requests from this IP. Please wait a few minutes and try again.")]
    IpBlocked,

    #[error("Failed to parse the caption response. Try a different video.")]
    ParseError,

    #[error("Failed to extract transcript: {0}")]
    ExtractionFailed(String),
}

impl ExtractionError {
    /// Map a backend error code (plus its display message) to a typed error.
    pub fn from_code(code: &str, message: &str) -> Self {
        match code {
            "no_captions" => Self::NoCaptions,
            "transcripts_disabled" => Self::TranscriptsDisabled,
            "video_unavailable" => Self::VideoUnavailable,
            "ip_blocked" => Self::IpBlocked,
            "parse_error" => Self::ParseError,
            _ => Self::ExtractionFailed(message.to_string()),
        }
    }

    /// The backend's wire code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoCaptions => "no_captions",
            Self::TranscriptsDisabled => "transcripts_disabled",
            Self::VideoUnavailable => "video_unavailable",
            Self::IpBlocked => "ip_blocked",
            Self::ParseError => "parse_error",
            Self::ExtractionFailed(_) => "extraction_failed",
        }
    }
}
