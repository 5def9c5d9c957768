use std::fmt;

/// Why an extraction did not produce text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    PdfParse,
    Browser,
    Navigation,
    ProcessingError,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::PdfParse => write!(f, "pdf parse error"),
            FailureKind::Browser => write!(f, "browser error"),
            FailureKind::Navigation => write!(f, "navigation failed"),
            FailureKind::ProcessingError => write!(f, "processing error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ExtractError {
    pub kind: FailureKind,
    pub message: String,
}

impl ExtractError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Turns a URL into plain text. One implementation per extraction path.
#[async_trait::async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, url: &str) -> Result<String, ExtractError>;
}
