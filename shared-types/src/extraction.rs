use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Core trait that all extractors must implement
pub trait Extractor {
    /// Extract structured message attributes from input. Pattern misses are
    /// not errors: the corresponding fields are simply left unset.
    fn extract(&self, input: &InputRecord) -> ExtractionResult;

    /// Get extractor version for tracking
    fn version(&self) -> String {
        "1.0.0".to_string()
    }
}

/// Extraction error types
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Where the text of an input originally came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum InputModality {
    #[default]
    Text,
    Image,
    Audio,
}

impl std::str::FromStr for InputModality {
    type Err = ExtractionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "image" => Ok(Self::Image),
            "audio" => Ok(Self::Audio),
            other => Err(ExtractionError::InvalidInput(format!(
                "unknown input modality '{}'",
                other
            ))),
        }
    }
}

/// Input provided to extractors. The content is already plain text: OCR
/// output for images, a transcript for audio.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InputRecord {
    pub content: String,
    pub modality: InputModality,
    pub captured_at: i64, // Unix timestamp
}

impl InputRecord {
    pub fn new(content: impl Into<String>, modality: InputModality) -> Self {
        Self {
            content: content.into(),
            modality,
            captured_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::new(content, InputModality::Text)
    }
}

/// Message priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

/// Which of the two mutually exclusive extraction paths produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionPath {
    Event,
    General,
}

/// A matched value after best-effort normalization.
///
/// `Normalized` carries the reformatted text; `Raw` carries the cleaned
/// match unchanged because it could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum NormalizedValue {
    Normalized(String),
    Raw(String),
}

impl NormalizedValue {
    pub fn as_str(&self) -> &str {
        match self {
            NormalizedValue::Normalized(value) | NormalizedValue::Raw(value) => value,
        }
    }

    pub fn is_normalized(&self) -> bool {
        matches!(self, NormalizedValue::Normalized(_))
    }

    pub fn into_string(self) -> String {
        match self {
            NormalizedValue::Normalized(value) | NormalizedValue::Raw(value) => value,
        }
    }
}

impl std::fmt::Display for NormalizedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured attributes extracted from one message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExtractionResult {
    pub path: ExtractionPath,
    pub subject: Option<String>,

    // Event fields, only set on the event path
    pub event_title: Option<String>,
    pub event_date: Option<NormalizedValue>,
    pub event_time: Option<NormalizedValue>,
    pub event_duration: Option<String>,
    pub location: Option<String>,

    pub attendees: Vec<String>,
    pub priority: Priority,
    pub description: Option<String>,
    pub action_required: bool,
    pub is_confirmed: bool,
    pub sender: Option<String>,
}

impl ExtractionResult {
    /// The floor every extraction starts from: nothing found, low priority,
    /// no action, not confirmed.
    pub fn empty(path: ExtractionPath) -> Self {
        Self {
            path,
            subject: None,
            event_title: None,
            event_date: None,
            event_time: None,
            event_duration: None,
            location: None,
            attendees: Vec::new(),
            priority: Priority::Low,
            description: None,
            action_required: false,
            is_confirmed: false,
            sender: None,
        }
    }

    pub fn is_event(&self) -> bool {
        self.path == ExtractionPath::Event
    }
}
