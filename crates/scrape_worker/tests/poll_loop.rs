use std::collections::VecDeque;
use std::sync::{Mutex, Once};
use std::time::Duration;

use pretty_assertions::assert_eq;
use scrape_core::{Job, Quality, QualityThresholds};
use scrape_engine::{ExtractError, JobProcessor, JobQueue, JobReport, ReportStatus, TextExtractor};
use scrape_worker::{Iteration, PollLoop, ShutdownSignal, WorkerConfig};
use tokio::time::Instant;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(worker_logging::initialize_for_tests);
}

/// Queue double: scripted poll answers, recorded reports.
#[derive(Default)]
struct ScriptedQueue {
    polls: Mutex<VecDeque<Option<Job>>>,
    pollers: Mutex<Vec<String>>,
    reports: Mutex<Vec<String>>,
}

impl ScriptedQueue {
    fn with_polls(polls: Vec<Option<Job>>) -> Self {
        Self {
            polls: Mutex::new(polls.into()),
            ..Self::default()
        }
    }

    fn reports(&self) -> Vec<String> {
        self.reports.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl JobQueue for ScriptedQueue {
    async fn poll(&self, worker_id: &str) -> Option<Job> {
        self.pollers.lock().unwrap().push(worker_id.to_string());
        self.polls.lock().unwrap().pop_front().flatten()
    }

    async fn complete(&self, job_id: &str, _text: &str, quality: Quality) -> ReportStatus {
        self.reports
            .lock()
            .unwrap()
            .push(format!("complete {job_id} {quality}"));
        ReportStatus::Answered(200)
    }

    async fn fail(&self, job_id: &str, error: &str) -> ReportStatus {
        self.reports
            .lock()
            .unwrap()
            .push(format!("fail {job_id} {error}"));
        ReportStatus::Answered(200)
    }
}

struct FixedText(String);

#[async_trait::async_trait]
impl TextExtractor for FixedText {
    async fn extract(&self, _url: &str) -> Result<String, ExtractError> {
        Ok(self.0.clone())
    }
}

fn words(n: usize) -> String {
    vec!["palabra"; n].join(" ")
}

fn config() -> WorkerConfig {
    WorkerConfig {
        supabase_url: "https://q.example".to_string(),
        service_role_key: "k".to_string(),
        anon_key: String::new(),
        worker_id: "worker-test".to_string(),
        poll_interval: Duration::from_secs(5),
        thresholds: QualityThresholds::default(),
        consent_matchers: Vec::new(),
        chrome_executable: None,
        once: false,
    }
}

fn processor() -> JobProcessor {
    JobProcessor::new(
        Box::new(FixedText(words(600))),
        Box::new(FixedText(words(30))),
        QualityThresholds::default(),
    )
}

fn idle_sleep(iteration: Iteration) -> Duration {
    match iteration {
        Iteration::Idle { sleep } => sleep,
        other => panic!("expected an idle poll, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_polls_back_off_in_steps_of_ten() {
    init_logging();
    let config = config();
    let queue = ScriptedQueue::default();
    let processor = processor();
    let mut poll_loop = PollLoop::new(&config, &queue, &processor);

    let mut sleeps = Vec::new();
    for _ in 0..25 {
        sleeps.push(idle_sleep(poll_loop.poll_once().await).as_secs());
    }

    let mut expected = vec![5; 10];
    expected.extend(vec![10; 10]);
    expected.extend(vec![15; 5]);
    assert_eq!(sleeps, expected);
    assert_eq!(poll_loop.idle_polls(), 25);
}

#[tokio::test]
async fn a_job_resets_the_back_off_and_is_reported_once() {
    init_logging();
    let config = config();
    let mut polls: Vec<Option<Job>> = vec![None; 12];
    polls.push(Some(Job::new("1", "https://x.com/doc.pdf")));
    polls.push(None);
    let queue = ScriptedQueue::with_polls(polls);
    let processor = processor();
    let mut poll_loop = PollLoop::new(&config, &queue, &processor);

    for _ in 0..12 {
        poll_loop.poll_once().await;
    }
    assert_eq!(poll_loop.idle_polls(), 12);

    match poll_loop.poll_once().await {
        Iteration::Processed { job_id, report } => {
            assert_eq!(job_id, "1");
            assert!(matches!(report, JobReport::Completed(_)));
        }
        other => panic!("expected a processed job, got {other:?}"),
    }
    assert_eq!(poll_loop.idle_polls(), 0);
    assert_eq!(
        idle_sleep(poll_loop.poll_once().await),
        Duration::from_secs(5)
    );
    assert_eq!(queue.reports(), vec!["complete 1 high".to_string()]);
}

#[tokio::test]
async fn polls_carry_the_worker_identity() {
    init_logging();
    let config = config();
    let queue = ScriptedQueue::default();
    let processor = processor();
    let mut poll_loop = PollLoop::new(&config, &queue, &processor);
    poll_loop.poll_once().await;

    assert_eq!(
        queue.pollers.lock().unwrap().clone(),
        vec!["worker-test".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn run_processes_jobs_until_shutdown() {
    init_logging();
    let config = config();
    let queue = ScriptedQueue::with_polls(vec![
        Some(Job::new("1", "https://x.com/doc.pdf")),
        None,
        Some(Job::new("2", "https://x.com/page")),
    ]);
    let processor = processor();
    let mut poll_loop = PollLoop::new(&config, &queue, &processor);
    let shutdown = poll_loop.shutdown_handle();

    let run = poll_loop.run();
    tokio::pin!(run);
    tokio::select! {
        _ = &mut run => panic!("loop ended before shutdown"),
        _ = async {
            while queue.reports().len() < 2 {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        } => {}
    }
    shutdown.trigger();
    run.await;

    assert!(shutdown.is_triggered());
    assert_eq!(
        queue.reports(),
        vec![
            "complete 1 high".to_string(),
            "fail 2 Extraction too short: 30 words".to_string(),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn shutdown_cuts_an_idle_sleep_short() {
    init_logging();
    let mut config = config();
    config.poll_interval = Duration::from_secs(30);
    let queue = ScriptedQueue::default();
    let processor = processor();
    let mut poll_loop = PollLoop::new(&config, &queue, &processor);
    let shutdown = poll_loop.shutdown_handle();
    let started = Instant::now();

    let run = poll_loop.run();
    tokio::pin!(run);
    tokio::select! {
        _ = &mut run => panic!("loop ended before shutdown"),
        _ = tokio::time::sleep(Duration::from_secs(1)) => {}
    }
    shutdown.trigger();
    run.await;

    assert!(started.elapsed() < Duration::from_secs(30));
    assert_eq!(queue.pollers.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn shutdown_signal_sleep() {
    let signal = ShutdownSignal::default();
    assert!(!signal.sleep(Duration::from_secs(2)).await);

    signal.trigger();
    let started = Instant::now();
    assert!(signal.sleep(Duration::from_secs(30)).await);
    assert_eq!(started.elapsed(), Duration::ZERO);
}
