use std::fmt;
use serde::Serialize;

pub mod analyzers;
pub mod audio;
pub mod cli;
pub mod pipeline;
pub mod utils;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Sad,
    Angry,
    Calm,
    Energetic,
    Surprised,
    Neutral,
}

impl Mood {
    pub fn all() -> &'static [Mood] {
        &[
            Mood::Happy,
            Mood::Sad,
            Mood::Angry,
            Mood::Calm,
            Mood::Energetic,
            Mood::Surprised,
            Mood::Neutral,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Sad => "sad",
            Mood::Angry => "angry",
            Mood::Calm => "calm",
            Mood::Energetic => "energetic",
            Mood::Surprised => "surprised",
            Mood::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MoodError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
    #[error("Inference error: {0}")]
    Inference(String),
}

pub type Result<T> = std::result::Result<T, MoodError>;

// Re-exports for convenience
pub use analyzers::heuristic::{AudioFeatures, HeuristicAnalyzer};
pub use audio::decode::{decode_excerpt, DecodedAudio};
pub use pipeline::{classify, TagModelCapability};
