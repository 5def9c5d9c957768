//! The worker's top-level loop: poll, process, back off when idle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use scrape_core::IdleBackoff;
use scrape_engine::{JobProcessor, JobQueue, JobReport};
use tokio::sync::Notify;
use worker_logging::{worker_debug, worker_error, worker_info, worker_warn};

use crate::WorkerConfig;

/// What one pass of the loop did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Iteration {
    Processed { job_id: String, report: JobReport },
    /// The queue had nothing; sleep this long before polling again.
    Idle { sleep: Duration },
}

/// Shared stop request. Cloning gives another handle to the same signal.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    requested: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl ShutdownSignal {
    pub fn trigger(&self) {
        self.requested.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_triggered(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Sleeps for `duration` unless shutdown is triggered first.
    /// Returns `true` when the sleep was cut short.
    pub async fn sleep(&self, duration: Duration) -> bool {
        let notified = self.notify.notified();
        tokio::pin!(notified);
        // Register before checking the flag so a trigger in between is not lost.
        notified.as_mut().enable();
        if self.is_triggered() {
            return true;
        }
        tokio::select! {
            _ = notified => true,
            _ = tokio::time::sleep(duration) => false,
        }
    }
}

/// Sequential poll loop. One job runs start to finish before the next poll.
pub struct PollLoop<'a> {
    config: &'a WorkerConfig,
    queue: &'a dyn JobQueue,
    processor: &'a JobProcessor,
    backoff: IdleBackoff,
    shutdown: ShutdownSignal,
}

impl<'a> PollLoop<'a> {
    pub fn new(
        config: &'a WorkerConfig,
        queue: &'a dyn JobQueue,
        processor: &'a JobProcessor,
    ) -> Self {
        Self {
            config,
            queue,
            processor,
            backoff: IdleBackoff::new(config.poll_interval),
            shutdown: ShutdownSignal::default(),
        }
    }

    /// Get a handle to signal shutdown
    pub fn shutdown_handle(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    pub fn idle_polls(&self) -> u32 {
        self.backoff.idle_polls()
    }

    /// Polls once and processes the job if there is one. Never sleeps.
    pub async fn poll_once(&mut self) -> Iteration {
        match self.queue.poll(&self.config.worker_id).await {
            Some(job) => {
                self.backoff.on_job();
                let report = self.processor.process(self.queue, &job).await;
                Iteration::Processed {
                    job_id: job.id,
                    report,
                }
            }
            None => Iteration::Idle {
                sleep: self.backoff.on_empty_poll(),
            },
        }
    }

    /// Runs until shutdown is signaled. A job in progress always finishes;
    /// an idle sleep ends as soon as the signal arrives.
    pub async fn run(&mut self) {
        worker_info!("External worker started");
        worker_info!("   Queue: {}", self.config.supabase_url);
        worker_info!("   Poll interval: {:?}", self.config.poll_interval);

        while !self.shutdown.is_triggered() {
            match self.poll_once().await {
                Iteration::Processed { job_id, .. } => {
                    worker_debug!("Job {} finished, polling again", job_id);
                }
                Iteration::Idle { sleep } => {
                    worker_debug!(
                        "No job ({} empty polls), sleeping {:?}",
                        self.backoff.idle_polls(),
                        sleep
                    );
                    self.shutdown.sleep(sleep).await;
                }
            }
        }

        worker_info!("Worker stopped");
    }
}

/// Setup signal handlers for graceful shutdown. The first Ctrl+C lets the
/// current job finish; a second one exits immediately.
pub fn setup_signal_handler(shutdown: ShutdownSignal) {
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            worker_error!("Failed to listen for Ctrl+C: {}", err);
            return;
        }
        worker_info!("Received Ctrl+C, finishing current work before exit...");
        shutdown.trigger();

        if tokio::signal::ctrl_c().await.is_ok() {
            worker_warn!("Received second Ctrl+C, exiting now");
            std::process::exit(130);
        }
    });
}
