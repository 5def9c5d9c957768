use std::time::Duration;

use futures_util::StreamExt;
use lopdf::Document;
use scrape_core::word_count;
use worker_logging::worker_info;

use crate::{ExtractError, FailureKind, TextExtractor};

pub const PDF_USER_AGENT: &str = "JarvisRAG-Worker/1.0";

#[derive(Debug, Clone)]
pub struct PdfSettings {
    pub download_timeout: Duration,
    pub max_bytes: u64,
    pub user_agent: String,
}

impl Default for PdfSettings {
    fn default() -> Self {
        Self {
            download_timeout: Duration::from_secs(60),
            max_bytes: 100 * 1024 * 1024,
            user_agent: PDF_USER_AGENT.to_string(),
        }
    }
}

/// Text of a parsed document, one entry per page in page order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfText {
    pub pages: Vec<String>,
}

impl PdfText {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Pages joined with newlines, trimmed.
    pub fn joined(&self) -> String {
        self.pages.join("\n").trim().to_string()
    }
}

/// Parses a whole document. Any unreadable page fails the document.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<PdfText, ExtractError> {
    let document = Document::load_mem(bytes)
        .map_err(|err| ExtractError::new(FailureKind::PdfParse, err.to_string()))?;

    let mut pages = Vec::new();
    for page_number in document.get_pages().into_keys() {
        let text = document.extract_text(&[page_number]).map_err(|err| {
            ExtractError::new(
                FailureKind::PdfParse,
                format!("page {page_number}: {err}"),
            )
        })?;
        pages.push(text);
    }
    Ok(PdfText { pages })
}

/// Downloads a PDF over HTTP and extracts its text.
#[derive(Debug, Clone)]
pub struct PdfExtractor {
    settings: PdfSettings,
    client: reqwest::Client,
}

impl PdfExtractor {
    pub fn new(settings: PdfSettings) -> Result<Self, ExtractError> {
        let client = reqwest::Client::builder()
            .timeout(settings.download_timeout)
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|err| ExtractError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    pub async fn download(&self, url: &str) -> Result<Vec<u8>, ExtractError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| ExtractError::new(FailureKind::InvalidUrl, err.to_string()))?;

        let response = self.client.get(parsed).send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::new(
                FailureKind::HttpStatus(status.as_u16()),
                format!("{status} for url: {url}"),
            ));
        }

        let max_bytes = self.settings.max_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(too_large(max_bytes, content_len));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(too_large(max_bytes, next_len));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }
}

#[async_trait::async_trait]
impl TextExtractor for PdfExtractor {
    async fn extract(&self, url: &str) -> Result<String, ExtractError> {
        worker_info!("Downloading PDF: {}", url);
        let bytes = self.download(url).await?;

        // Parsing is CPU bound; keep it off the runtime thread.
        let parsed = tokio::task::spawn_blocking(move || extract_pdf_text(&bytes))
            .await
            .map_err(|err| ExtractError::new(FailureKind::ProcessingError, err.to_string()))??;

        let text = parsed.joined();
        worker_info!(
            "PDF extracted: {} words from {} pages",
            word_count(&text),
            parsed.page_count()
        );
        Ok(text)
    }
}

fn too_large(max_bytes: u64, actual: u64) -> ExtractError {
    ExtractError::new(
        FailureKind::TooLarge {
            max_bytes,
            actual: Some(actual),
        },
        "response too large",
    )
}

fn map_reqwest_error(err: reqwest::Error) -> ExtractError {
    if err.is_timeout() {
        return ExtractError::new(FailureKind::Timeout, err.to_string());
    }
    ExtractError::new(FailureKind::Network, err.to_string())
}
