use scrape_core::{
    too_short_message, Assessment, ExtractionResult, Job, QualityThresholds, TargetKind,
    NO_URL_MESSAGE,
};
use worker_logging::{worker_info, worker_warn};

use crate::{JobQueue, TextExtractor};

/// The single terminal report sent for a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobReport {
    Completed(ExtractionResult),
    Failed { reason: String },
}

/// Routes a job to the PDF or rendered-page extractor, gates the result on
/// volume, and reports exactly once.
pub struct JobProcessor {
    pdf: Box<dyn TextExtractor>,
    page: Box<dyn TextExtractor>,
    thresholds: QualityThresholds,
}

impl JobProcessor {
    pub fn new(
        pdf: Box<dyn TextExtractor>,
        page: Box<dyn TextExtractor>,
        thresholds: QualityThresholds,
    ) -> Self {
        Self {
            pdf,
            page,
            thresholds,
        }
    }

    pub async fn process(&self, queue: &dyn JobQueue, job: &Job) -> JobReport {
        let report = self.evaluate(job).await;
        match &report {
            JobReport::Completed(result) => {
                queue.complete(&job.id, &result.text, result.quality).await;
                worker_info!(
                    "Job {} completed: {} words ({})",
                    job.id,
                    result.word_count,
                    result.quality
                );
            }
            JobReport::Failed { reason } => {
                queue.fail(&job.id, reason).await;
                worker_warn!("Job {} failed: {}", job.id, reason);
            }
        }
        report
    }

    /// Decides the outcome without talking to the queue.
    pub async fn evaluate(&self, job: &Job) -> JobReport {
        let Some(url) = job.target_url() else {
            return JobReport::Failed {
                reason: NO_URL_MESSAGE.to_string(),
            };
        };

        worker_info!("Processing job {}: {}", job.id, url);
        let extractor = match TargetKind::of(url) {
            TargetKind::Pdf => &self.pdf,
            TargetKind::Page => &self.page,
        };

        match extractor.extract(url).await {
            Ok(text) => match self.thresholds.assess(text) {
                Assessment::Accepted(result) => JobReport::Completed(result),
                Assessment::TooShort { word_count } => JobReport::Failed {
                    reason: too_short_message(word_count),
                },
            },
            Err(err) => JobReport::Failed {
                reason: err.to_string(),
            },
        }
    }
}
