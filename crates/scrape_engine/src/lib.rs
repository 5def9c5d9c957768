//! Scrape engine: queue transport, extractors and per-job processing.
mod pdf;
mod processor;
mod queue;
mod render;
mod types;

pub use pdf::{extract_pdf_text, PdfExtractor, PdfSettings, PdfText, PDF_USER_AGENT};
pub use processor::{JobProcessor, JobReport};
pub use queue::{
    HttpJobQueue, JobQueue, QueueError, QueueSettings, ReportStatus, EDGE_FUNCTION_PATH,
    MAX_ERROR_CHARS, MAX_EXTRACTED_TEXT_CHARS,
};
pub use render::{
    clean_page_text, default_consent_matchers, visible_text, ChromiumLauncher, ConsentMatcher,
    PageDriver, PageRenderer, ParseConsentMatcherError, RenderSettings, SessionLauncher,
    WaitUntil, DEFAULT_LOCALE, DESKTOP_USER_AGENT,
};
pub use types::{ExtractError, FailureKind, TextExtractor};
