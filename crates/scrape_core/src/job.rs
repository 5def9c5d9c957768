use serde::{Deserialize, Deserializer};
use serde_json::Value;
use url::Url;

pub type JobId = String;

/// Failure reported for a job that carries no usable URL.
pub const NO_URL_MESSAGE: &str = "No URL in job payload";

/// A unit of work handed out by the queue. Read-only once received.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Job {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: JobId,
    #[serde(default, deserialize_with = "url_if_string")]
    pub url: Option<String>,
    #[serde(default)]
    pub payload: Option<Value>,
}

impl Job {
    pub fn new(id: impl Into<JobId>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: Some(url.into()),
            payload: None,
        }
    }

    /// The URL to extract: the top-level field, else `payload.url`.
    /// Blank strings count as absent.
    pub fn target_url(&self) -> Option<&str> {
        self.url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .or_else(|| {
                self.payload
                    .as_ref()?
                    .get("url")?
                    .as_str()
                    .filter(|url| !url.trim().is_empty())
            })
            .map(str::trim)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Pdf,
    Page,
}

impl TargetKind {
    pub fn of(url: &str) -> Self {
        if is_pdf_url(url) {
            TargetKind::Pdf
        } else {
            TargetKind::Page
        }
    }
}

/// True when the URL path (not query or fragment) ends in `.pdf`, ignoring case.
pub fn is_pdf_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => parsed.path().to_ascii_lowercase().ends_with(".pdf"),
        Err(_) => {
            let path = url.split(['?', '#']).next().unwrap_or(url);
            path.to_ascii_lowercase().ends_with(".pdf")
        }
    }
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<JobId, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "job id must be a string or number, got {other}"
        ))),
    }
}

/// Anything but a string (a number, an object) leaves the URL unset so the job
/// still reaches a terminal report instead of failing the whole poll.
fn url_if_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(url) => Ok(Some(url)),
        _ => Ok(None),
    }
}
