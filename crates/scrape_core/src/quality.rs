use std::fmt;

use serde::Serialize;

use crate::text::word_count;

pub const DEFAULT_MIN_WORDS: usize = 50;
pub const DEFAULT_HIGH_QUALITY_WORDS: usize = 500;

/// Coarse confidence in an extraction, derived from its volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    High,
    Medium,
}

impl Quality {
    pub fn as_str(self) -> &'static str {
        match self {
            Quality::High => "high",
            Quality::Medium => "medium",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    pub text: String,
    pub word_count: usize,
    pub quality: Quality,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assessment {
    Accepted(ExtractionResult),
    TooShort { word_count: usize },
}

/// Word-count gates applied to every extraction, regardless of source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityThresholds {
    /// Fewer words than this fails the job.
    pub min_words: usize,
    /// Strictly more words than this is `High`.
    pub high_words: usize,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            min_words: DEFAULT_MIN_WORDS,
            high_words: DEFAULT_HIGH_QUALITY_WORDS,
        }
    }
}

impl QualityThresholds {
    pub fn classify(&self, word_count: usize) -> Quality {
        if word_count > self.high_words {
            Quality::High
        } else {
            Quality::Medium
        }
    }

    pub fn assess(&self, text: String) -> Assessment {
        let word_count = word_count(&text);
        if word_count < self.min_words {
            return Assessment::TooShort { word_count };
        }
        Assessment::Accepted(ExtractionResult {
            quality: self.classify(word_count),
            word_count,
            text,
        })
    }
}

pub fn too_short_message(word_count: usize) -> String {
    format!("Extraction too short: {word_count} words")
}
