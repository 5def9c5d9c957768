//! Rendered-page extraction.
//!
//! A page is loaded in a fresh headless browser session, consent banners are
//! dismissed, the markup is captured and reduced to visible text. The browser
//! work sits behind [`PageDriver`] so that the navigation fallback, the consent
//! loop and the guaranteed teardown do not depend on a real browser.

mod chromium;
mod clean;
mod consent;

use std::time::Duration;

use scrape_core::word_count;
use worker_logging::{worker_debug, worker_info, worker_warn};

use crate::{ExtractError, TextExtractor};

pub use chromium::ChromiumLauncher;
pub use clean::{clean_page_text, visible_text};
pub use consent::{default_consent_matchers, ConsentMatcher, ParseConsentMatcherError};

pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const DEFAULT_LOCALE: &str = "es-ES";

/// Page-load milestone a navigation waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitUntil {
    /// No network activity for a trailing window.
    NetworkIdle,
    DomContentLoaded,
}

#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub user_agent: String,
    pub locale: String,
    pub network_idle_timeout: Duration,
    pub dom_loaded_timeout: Duration,
    pub consent_matchers: Vec<ConsentMatcher>,
    pub consent_pause: Duration,
    pub settle_delay: Duration,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            user_agent: DESKTOP_USER_AGENT.to_string(),
            locale: DEFAULT_LOCALE.to_string(),
            network_idle_timeout: Duration::from_secs(30),
            dom_loaded_timeout: Duration::from_secs(15),
            consent_matchers: default_consent_matchers(),
            consent_pause: Duration::from_millis(500),
            settle_delay: Duration::from_secs(2),
        }
    }
}

/// One live page in an isolated browser session.
#[async_trait::async_trait]
pub trait PageDriver: Send {
    /// Navigates and waits for `wait_until`, giving up after `timeout`.
    async fn navigate(
        &mut self,
        url: &str,
        wait_until: WaitUntil,
        timeout: Duration,
    ) -> Result<(), ExtractError>;

    /// Clicks the first element the matcher finds. `Ok(false)` when none.
    async fn click(&mut self, matcher: &ConsentMatcher) -> Result<bool, ExtractError>;

    /// Full rendered markup of the current page.
    async fn content(&mut self) -> Result<String, ExtractError>;

    /// Tears the session down. Called exactly once, on every exit path.
    async fn close(&mut self) -> Result<(), ExtractError>;
}

/// Opens a fresh session per extraction; nothing is shared between sessions.
#[async_trait::async_trait]
pub trait SessionLauncher: Send + Sync {
    async fn open(&self, settings: &RenderSettings) -> Result<Box<dyn PageDriver>, ExtractError>;
}

pub struct PageRenderer<L> {
    launcher: L,
    settings: RenderSettings,
}

impl<L: SessionLauncher> PageRenderer<L> {
    pub fn new(launcher: L, settings: RenderSettings) -> Self {
        Self { launcher, settings }
    }

    /// Rendered markup of `url`. The session is closed whether or not
    /// capturing succeeded.
    pub async fn capture(&self, url: &str) -> Result<String, ExtractError> {
        let mut session = self.launcher.open(&self.settings).await?;
        let captured = self.drive(session.as_mut(), url).await;
        if let Err(err) = session.close().await {
            worker_warn!("Browser teardown failed for {}: {}", url, err);
        }
        captured
    }

    async fn drive(&self, page: &mut dyn PageDriver, url: &str) -> Result<String, ExtractError> {
        self.navigate(page, url).await?;
        self.dismiss_consent(page).await;
        tokio::time::sleep(self.settings.settle_delay).await;
        page.content().await
    }

    async fn navigate(&self, page: &mut dyn PageDriver, url: &str) -> Result<(), ExtractError> {
        let primary = page
            .navigate(url, WaitUntil::NetworkIdle, self.settings.network_idle_timeout)
            .await;
        match primary {
            Ok(()) => Ok(()),
            Err(err) => {
                worker_debug!(
                    "Network idle not reached for {} ({}), retrying with DOM content loaded",
                    url,
                    err
                );
                page.navigate(url, WaitUntil::DomContentLoaded, self.settings.dom_loaded_timeout)
                    .await
            }
        }
    }

    /// Tries each matcher in order and stops at the first click. Finding
    /// nothing, or a matcher failing, is not an error.
    async fn dismiss_consent(&self, page: &mut dyn PageDriver) {
        for matcher in &self.settings.consent_matchers {
            match page.click(matcher).await {
                Ok(true) => {
                    worker_debug!("Dismissed consent banner via {}", matcher);
                    tokio::time::sleep(self.settings.consent_pause).await;
                    return;
                }
                Ok(false) => {}
                Err(err) => worker_debug!("Consent matcher {} failed: {}", matcher, err),
            }
        }
    }
}

#[async_trait::async_trait]
impl<L: SessionLauncher> TextExtractor for PageRenderer<L> {
    async fn extract(&self, url: &str) -> Result<String, ExtractError> {
        worker_info!("Scraping with headless browser: {}", url);
        let html = self.capture(url).await?;
        let text = clean_page_text(&html);
        worker_info!("Browser extracted: {} words", word_count(&text));
        Ok(text)
    }
}
