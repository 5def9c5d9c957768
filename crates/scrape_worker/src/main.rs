use anyhow::{Context, Result};
use clap::Parser;
use scrape_engine::{
    ChromiumLauncher, HttpJobQueue, JobProcessor, PageRenderer, PdfExtractor, PdfSettings,
    RenderSettings,
};
use scrape_worker::poll_loop::{setup_signal_handler, Iteration, PollLoop};
use scrape_worker::{logging, Cli, WorkerConfig};
use worker_logging::worker_info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = cli.log_level;
    let log_file = cli.log_file.clone();

    let config = WorkerConfig::from_cli(cli).context("invalid configuration")?;

    worker_logging::set_worker_id(config.worker_id.clone());
    logging::initialize(log_level, log_file.as_deref()).context("logger already set")?;

    let queue = HttpJobQueue::new(config.queue_settings()).context("building queue client")?;
    let pdf = PdfExtractor::new(PdfSettings::default()).context("building PDF client")?;
    let renderer = PageRenderer::new(
        ChromiumLauncher::new(config.chrome_executable.clone()),
        RenderSettings {
            consent_matchers: config.consent_matchers.clone(),
            ..RenderSettings::default()
        },
    );
    let processor = JobProcessor::new(Box::new(pdf), Box::new(renderer), config.thresholds);

    worker_info!("Endpoint: {}", queue.endpoint());
    let mut poll_loop = PollLoop::new(&config, &queue, &processor);

    if config.once {
        match poll_loop.poll_once().await {
            Iteration::Processed { job_id, .. } => worker_info!("Processed job {}", job_id),
            Iteration::Idle { .. } => worker_info!("No job available"),
        }
        return Ok(());
    }

    setup_signal_handler(poll_loop.shutdown_handle());
    poll_loop.run().await;
    Ok(())
}
