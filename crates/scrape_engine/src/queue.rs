//! Client for the remote job queue.
//!
//! Every call is best-effort: transport and protocol failures are logged and
//! absorbed here so that the poll loop never sees them. A lost report is
//! recoverable on the queue side; a crashed worker is not.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use scrape_core::{truncate_chars, Job, Quality};
use serde::{Deserialize, Serialize};
use worker_logging::{worker_info, worker_warn};

/// Path of the queue edge function below the configured base URL.
pub const EDGE_FUNCTION_PATH: &str = "/functions/v1/rag-architect";
pub const MAX_EXTRACTED_TEXT_CHARS: usize = 200_000;
pub const MAX_ERROR_CHARS: usize = 2_000;

/// Characters of a failure reason echoed into the log.
const LOGGED_ERROR_CHARS: usize = 100;

#[derive(Debug, Clone)]
pub struct QueueSettings {
    pub endpoint: String,
    pub service_role_key: String,
    pub anon_key: String,
    pub poll_timeout: Duration,
    pub complete_timeout: Duration,
    pub fail_timeout: Duration,
}

impl QueueSettings {
    pub fn new(
        base_url: &str,
        service_role_key: impl Into<String>,
        anon_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), EDGE_FUNCTION_PATH),
            service_role_key: service_role_key.into(),
            anon_key: anon_key.into(),
            poll_timeout: Duration::from_secs(15),
            complete_timeout: Duration::from_secs(30),
            fail_timeout: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("invalid credential header: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {0}")]
    HttpStatus(u16),
}

/// Outcome of a report call, for logging and tests. Never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStatus {
    /// The queue answered; the status code is whatever it returned.
    Answered(u16),
    /// The request never got an answer.
    Lost,
}

#[derive(Debug, Serialize)]
#[serde(tag = "action")]
enum QueueRequest<'a> {
    #[serde(rename = "external-worker-poll", rename_all = "camelCase")]
    Poll { worker_id: &'a str },
    #[serde(rename = "external-worker-complete", rename_all = "camelCase")]
    Complete {
        job_id: &'a str,
        extracted_text: &'a str,
        quality: Quality,
    },
    #[serde(rename = "external-worker-fail", rename_all = "camelCase")]
    Fail { job_id: &'a str, error: &'a str },
}

#[derive(Debug, Deserialize)]
struct PollResponse {
    #[serde(default)]
    job: Option<Job>,
}

#[async_trait::async_trait]
pub trait JobQueue: Send + Sync {
    /// Next job, or `None` when the queue is empty or unreachable.
    async fn poll(&self, worker_id: &str) -> Option<Job>;
    /// Reports success; `text` is cut to [`MAX_EXTRACTED_TEXT_CHARS`].
    async fn complete(&self, job_id: &str, text: &str, quality: Quality) -> ReportStatus;
    /// Reports failure; `error` is cut to [`MAX_ERROR_CHARS`].
    async fn fail(&self, job_id: &str, error: &str) -> ReportStatus;
}

#[derive(Debug, Clone)]
pub struct HttpJobQueue {
    settings: QueueSettings,
    client: reqwest::Client,
}

impl HttpJobQueue {
    pub fn new(settings: QueueSettings) -> Result<Self, QueueError> {
        let mut headers = HeaderMap::new();
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", settings.service_role_key))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);
        let mut api_key = HeaderValue::from_str(&settings.anon_key)?;
        api_key.set_sensitive(true);
        headers.insert("apikey", api_key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;
        Ok(Self { settings, client })
    }

    pub fn endpoint(&self) -> &str {
        &self.settings.endpoint
    }

    async fn send(
        &self,
        request: &QueueRequest<'_>,
        timeout: Duration,
    ) -> Result<reqwest::Response, QueueError> {
        Ok(self
            .client
            .post(&self.settings.endpoint)
            .timeout(timeout)
            .json(request)
            .send()
            .await?)
    }

    async fn try_poll(&self, worker_id: &str) -> Result<Option<Job>, QueueError> {
        let response = self
            .send(&QueueRequest::Poll { worker_id }, self.settings.poll_timeout)
            .await?;
        if response.status() != StatusCode::OK {
            return Err(QueueError::HttpStatus(response.status().as_u16()));
        }
        let body: PollResponse = response.json().await?;
        Ok(body.job)
    }
}

#[async_trait::async_trait]
impl JobQueue for HttpJobQueue {
    async fn poll(&self, worker_id: &str) -> Option<Job> {
        match self.try_poll(worker_id).await {
            Ok(job) => job,
            Err(QueueError::HttpStatus(status)) => {
                worker_warn!("Poll error: HTTP {}", status);
                None
            }
            Err(err) => {
                worker_warn!("Poll exception: {}", err);
                None
            }
        }
    }

    async fn complete(&self, job_id: &str, text: &str, quality: Quality) -> ReportStatus {
        let request = QueueRequest::Complete {
            job_id,
            extracted_text: truncate_chars(text, MAX_EXTRACTED_TEXT_CHARS),
            quality,
        };
        match self.send(&request, self.settings.complete_timeout).await {
            Ok(response) => {
                let status = response.status().as_u16();
                worker_info!("Complete job {}: HTTP {}", job_id, status);
                ReportStatus::Answered(status)
            }
            Err(err) => {
                worker_warn!("Complete error for job {}: {}", job_id, err);
                ReportStatus::Lost
            }
        }
    }

    async fn fail(&self, job_id: &str, error: &str) -> ReportStatus {
        let request = QueueRequest::Fail {
            job_id,
            error: truncate_chars(error, MAX_ERROR_CHARS),
        };
        match self.send(&request, self.settings.fail_timeout).await {
            Ok(response) => {
                worker_info!(
                    "Failed job {}: {}",
                    job_id,
                    truncate_chars(error, LOGGED_ERROR_CHARS)
                );
                ReportStatus::Answered(response.status().as_u16())
            }
            Err(err) => {
                worker_warn!("Fail report error for job {}: {}", job_id, err);
                ReportStatus::Lost
            }
        }
    }
}
