//! Fixtures shared by the engine integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use scrape_core::{Job, Quality};
use scrape_engine::{ExtractError, JobQueue, ReportStatus, TextExtractor};

/// A document with one text run per page, in the given order.
pub fn pdf_with_pages(pages: &[String]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![50.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(text.as_str())]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

pub fn words(prefix: &str, n: usize) -> String {
    (0..n)
        .map(|i| format!("{prefix}{i}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Complete {
        job_id: String,
        text: String,
        quality: Quality,
    },
    Fail {
        job_id: String,
        error: String,
    },
}

/// Queue double that records reports and hands out pre-loaded jobs.
#[derive(Default, Clone)]
pub struct RecordingQueue {
    pub jobs: Arc<Mutex<Vec<Job>>>,
    pub sent: Arc<Mutex<Vec<Sent>>>,
}

impl RecordingQueue {
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl JobQueue for RecordingQueue {
    async fn poll(&self, _worker_id: &str) -> Option<Job> {
        let mut jobs = self.jobs.lock().unwrap();
        if jobs.is_empty() {
            None
        } else {
            Some(jobs.remove(0))
        }
    }

    async fn complete(&self, job_id: &str, text: &str, quality: Quality) -> ReportStatus {
        self.sent.lock().unwrap().push(Sent::Complete {
            job_id: job_id.to_string(),
            text: text.to_string(),
            quality,
        });
        ReportStatus::Answered(200)
    }

    async fn fail(&self, job_id: &str, error: &str) -> ReportStatus {
        self.sent.lock().unwrap().push(Sent::Fail {
            job_id: job_id.to_string(),
            error: error.to_string(),
        });
        ReportStatus::Answered(200)
    }
}

/// Extractor double returning a canned outcome and counting calls.
#[derive(Clone)]
pub struct CannedExtractor {
    outcome: Result<String, ExtractError>,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl CannedExtractor {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            outcome: Ok(text.into()),
            calls: Arc::default(),
        }
    }

    pub fn err(error: ExtractError) -> Self {
        Self {
            outcome: Err(error),
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl TextExtractor for CannedExtractor {
    async fn extract(&self, url: &str) -> Result<String, ExtractError> {
        self.calls.lock().unwrap().push(url.to_string());
        self.outcome.clone()
    }
}
