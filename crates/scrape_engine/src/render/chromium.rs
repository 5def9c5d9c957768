use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::emulation::SetLocaleOverrideParams;
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::{
    EventJavascriptDialogOpening, EventLifecycleEvent, HandleJavaScriptDialogParams,
    NavigateParams, SetLifecycleEventsEnabledParams,
};
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams,
};
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures_util::StreamExt;
use tokio::task::JoinHandle;
use worker_logging::{worker_debug, worker_warn};

use super::{ConsentMatcher, PageDriver, RenderSettings, SessionLauncher, WaitUntil};
use crate::{ExtractError, FailureKind};

/// Launches a headless Chromium per session.
#[derive(Debug, Clone, Default)]
pub struct ChromiumLauncher {
    executable: Option<PathBuf>,
}

impl ChromiumLauncher {
    pub fn new(executable: Option<PathBuf>) -> Self {
        Self { executable }
    }

    fn browser_config(&self, settings: &RenderSettings) -> Result<BrowserConfig, ExtractError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(1366, 900)
            .request_timeout(settings.network_idle_timeout)
            .arg(format!("--lang={}", settings.locale));
        if let Some(executable) = &self.executable {
            builder = builder.chrome_executable(executable);
        }
        builder
            .build()
            .map_err(|err| ExtractError::new(FailureKind::Browser, err))
    }
}

#[async_trait::async_trait]
impl SessionLauncher for ChromiumLauncher {
    async fn open(&self, settings: &RenderSettings) -> Result<Box<dyn PageDriver>, ExtractError> {
        let config = self.browser_config(settings)?;
        let (browser, mut handler) = Browser::launch(config).await.map_err(browser_error)?;
        let handler_task = tokio::spawn(async move {
            while handler.next().await.is_some() {}
        });

        let mut session = ChromiumSession {
            browser,
            handler_task,
            dialog_task: None,
            page: None,
            context: None,
        };
        // A half-built session still owns a browser process.
        if let Err(err) = session.prepare(settings).await {
            let _ = session.close().await;
            return Err(err);
        }
        Ok(Box::new(session))
    }
}

struct ChromiumSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    dialog_task: Option<JoinHandle<()>>,
    page: Option<Page>,
    context: Option<BrowserContextId>,
}

impl ChromiumSession {
    async fn prepare(&mut self, settings: &RenderSettings) -> Result<(), ExtractError> {
        let context = self
            .browser
            .create_browser_context(CreateBrowserContextParams::default())
            .await
            .map_err(browser_error)?;
        self.context = Some(context.clone());

        let target = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context)
            .build()
            .map_err(|err| ExtractError::new(FailureKind::Browser, err))?;
        let page = self.browser.new_page(target).await.map_err(browser_error)?;

        let user_agent = SetUserAgentOverrideParams::builder()
            .user_agent(settings.user_agent.clone())
            .accept_language(settings.locale.clone())
            .build()
            .map_err(|err| ExtractError::new(FailureKind::Browser, err))?;
        page.set_user_agent(user_agent).await.map_err(browser_error)?;
        page.execute(
            SetLocaleOverrideParams::builder()
                .locale(settings.locale.clone())
                .build(),
        )
        .await
        .map_err(browser_error)?;
        page.execute(SetLifecycleEventsEnabledParams::new(true))
            .await
            .map_err(browser_error)?;

        let mut dialogs = page
            .event_listener::<EventJavascriptDialogOpening>()
            .await
            .map_err(browser_error)?;
        let dialog_page = page.clone();
        self.dialog_task = Some(tokio::spawn(async move {
            while let Some(dialog) = dialogs.next().await {
                worker_debug!("Accepting {:?} dialog: {}", dialog.r#type, dialog.message);
                let _ = dialog_page
                    .execute(HandleJavaScriptDialogParams::new(true))
                    .await;
            }
        }));

        self.page = Some(page);
        Ok(())
    }

    fn page(&self) -> Result<&Page, ExtractError> {
        self.page
            .as_ref()
            .ok_or_else(|| ExtractError::new(FailureKind::Browser, "page is not open"))
    }
}

#[async_trait::async_trait]
impl PageDriver for ChromiumSession {
    async fn navigate(
        &mut self,
        url: &str,
        wait_until: WaitUntil,
        timeout: Duration,
    ) -> Result<(), ExtractError> {
        let page = self.page()?;
        let milestone = match wait_until {
            WaitUntil::NetworkIdle => "networkIdle",
            WaitUntil::DomContentLoaded => "DOMContentLoaded",
        };

        let navigation = async {
            let mut lifecycle = page
                .event_listener::<EventLifecycleEvent>()
                .await
                .map_err(browser_error)?;
            let navigated = page
                .execute(NavigateParams::new(url))
                .await
                .map_err(browser_error)?
                .result;
            if let Some(error_text) = navigated.error_text {
                return Err(ExtractError::new(
                    FailureKind::Navigation,
                    format!("{error_text} at {url}"),
                ));
            }
            while let Some(event) = lifecycle.next().await {
                let same_frame = event.frame_id == navigated.frame_id;
                let same_load = navigated
                    .loader_id
                    .as_ref()
                    .map_or(true, |loader| *loader == event.loader_id);
                if same_frame && same_load && event.name == milestone {
                    return Ok(());
                }
            }
            Err(ExtractError::new(
                FailureKind::Browser,
                "browser closed during navigation",
            ))
        };

        tokio::time::timeout(timeout, navigation)
            .await
            .map_err(|_| {
                ExtractError::new(
                    FailureKind::Timeout,
                    format!(
                        "navigation to {url} exceeded {}ms waiting for {milestone}",
                        timeout.as_millis()
                    ),
                )
            })?
    }

    async fn click(&mut self, matcher: &ConsentMatcher) -> Result<bool, ExtractError> {
        let page = self.page()?;
        let evaluation = page
            .evaluate(matcher.click_script())
            .await
            .map_err(browser_error)?;
        evaluation
            .into_value::<bool>()
            .map_err(|err| ExtractError::new(FailureKind::Browser, err.to_string()))
    }

    async fn content(&mut self) -> Result<String, ExtractError> {
        self.page()?.content().await.map_err(browser_error)
    }

    async fn close(&mut self) -> Result<(), ExtractError> {
        if let Some(task) = self.dialog_task.take() {
            task.abort();
        }
        if let Some(page) = self.page.take() {
            let _ = page.close().await;
        }
        if let Some(context) = self.context.take() {
            let _ = self.browser.dispose_browser_context(context).await;
        }
        let closed = shut_down(&mut self.browser, EXIT_GRACE).await;
        self.handler_task.abort();
        closed
    }
}

/// How long a browser process gets to exit before it is killed.
const EXIT_GRACE: Duration = Duration::from_secs(5);

/// The process-level half of a browser session.
#[async_trait::async_trait]
trait BrowserProcess: Send {
    async fn request_close(&mut self) -> Result<(), ExtractError>;
    async fn kill(&mut self);
    async fn wait_exit(&mut self);
}

#[async_trait::async_trait]
impl BrowserProcess for Browser {
    async fn request_close(&mut self) -> Result<(), ExtractError> {
        Browser::close(self).await.map(|_| ()).map_err(browser_error)
    }

    async fn kill(&mut self) {
        let _ = Browser::kill(self).await;
    }

    async fn wait_exit(&mut self) {
        let _ = Browser::wait(self).await;
    }
}

/// Asks the browser to exit and reaps it. A refused close request, or a
/// process still running after `grace`, gets killed. Never waits unbounded.
async fn shut_down<P: BrowserProcess>(
    process: &mut P,
    grace: Duration,
) -> Result<(), ExtractError> {
    let closed = process.request_close().await;
    if let Err(err) = &closed {
        worker_warn!("Browser refused to close ({}), killing it", err);
        process.kill().await;
    }
    if tokio::time::timeout(grace, process.wait_exit()).await.is_err() {
        worker_warn!("Browser still running after {:?}, killing it", grace);
        process.kill().await;
        if tokio::time::timeout(grace, process.wait_exit()).await.is_err() {
            worker_warn!("Browser process could not be reaped");
        }
    }
    closed
}

fn browser_error(err: CdpError) -> ExtractError {
    match err {
        CdpError::Timeout => ExtractError::new(FailureKind::Timeout, err.to_string()),
        other => ExtractError::new(FailureKind::Browser, other.to_string()),
    }
}
