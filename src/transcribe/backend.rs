use anyhow::Result;
use serde::{Deserialize, Serialize};

/// One recognized stretch of speech. Times are seconds from the start of the audio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<f64>,
}

impl Segment {
    pub fn untimed(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            start: None,
            end: None,
        }
    }
}

/// Ordered transcript of a lecture. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Audio file (or text file) the transcript came from.
    pub source: String,
    pub segments: Vec<Segment>,
}

impl Transcript {
    pub fn new(source: impl Into<String>, segments: Vec<Segment>) -> Self {
        Self {
            source: source.into(),
            segments,
        }
    }

    /// Wrap plain lecture text as a single untimed segment.
    pub fn from_text(source: impl Into<String>, text: &str) -> Self {
        Self::new(source, vec![Segment::untimed(text.trim())])
    }

    /// Segment texts in order, trimmed and joined by single spaces.
    pub fn text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(|s| s.text.trim().is_empty())
    }

    /// End time of the last timed segment, if any.
    pub fn duration_secs(&self) -> Option<f64> {
        self.segments.iter().filter_map(|s| s.end).reduce(f64::max)
    }
}

pub trait TranscriptionBackend {
    fn name(&self) -> &str;
    fn transcribe(&self, file_name: &str, audio: &[u8]) -> Result<Transcript>;
}
