//! Scrape core: pure job, text and scheduling rules. No IO lives here.
mod backoff;
mod job;
mod quality;
mod text;

pub use backoff::{IdleBackoff, IDLE_STEP_POLLS, MAX_IDLE_SLEEP};
pub use job::{is_pdf_url, Job, JobId, TargetKind, NO_URL_MESSAGE};
pub use quality::{
    too_short_message, Assessment, ExtractionResult, Quality, QualityThresholds,
    DEFAULT_HIGH_QUALITY_WORDS, DEFAULT_MIN_WORDS,
};
pub use text::{drop_short_lines, truncate_chars, word_count, MIN_LINE_CHARS};
