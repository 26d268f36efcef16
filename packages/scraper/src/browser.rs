//! Managed headless-browser session.
//!
//! Wraps a `chromiumoxide` browser plus its CDP handler task behind a
//! lifecycle the collectors can drive: launch through an engine fallback
//! chain, navigate with retries, scroll like a reader would, poll for
//! selectors, and tear everything down on every exit path.

use std::time::Duration;

use chromiumoxide::{Browser, BrowserConfig, Element, Page};
use futures::StreamExt as _;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};

use crate::ScrapeError;
use crate::rate_limiter::RateLimiter;

/// Explicit executables tried after default engine detection fails.
const ENGINE_EXECUTABLES: &[&str] = &[
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/usr/bin/google-chrome",
];

const BASE_RETRY_DELAY_MS: u64 = 1_000;
const MAX_RETRY_DELAY_MS: u64 = 30_000;
const RETRY_JITTER_FACTOR: f64 = 0.2;
const FIND_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// A headless browser with one active page and built-in request pacing.
#[derive(Debug)]
pub struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    page: Option<Page>,
    limiter: RateLimiter,
}

impl BrowserSession {
    /// Launches a browser, trying the default engine detection first and
    /// then each known executable path in order.
    ///
    /// `min_request_gap` is the pacing delay applied before every
    /// navigation.
    ///
    /// # Errors
    ///
    /// * `ScrapeError::NoEngine` - if every engine in the chain fails to
    ///   launch.
    pub async fn launch(min_request_gap: Duration) -> Result<Self, ScrapeError> {
        let (browser, handler_task) = launch_engine().await?;
        Ok(Self {
            browser,
            handler_task,
            page: None,
            limiter: RateLimiter::new(min_request_gap),
        })
    }

    /// Navigates to `url`, retrying with exponential backoff and jitter.
    ///
    /// Returns `true` once a navigation completes. Failures are logged
    /// and swallowed; after `max_retries` additional attempts the method
    /// returns `false` and the caller moves on (next mirror, next
    /// source).
    pub async fn navigate(&mut self, url: &str, max_retries: u32) -> bool {
        self.limiter.wait().await;
        for attempt in 0..=max_retries {
            if attempt > 0 {
                let delay = backoff_delay(attempt);
                log::debug!("retrying {url} in {delay:?} (attempt {attempt}/{max_retries})");
                sleep(delay).await;
            }
            match self.open(url).await {
                Ok(()) => return true,
                Err(e) => log::warn!("navigation to {url} failed: {e}"),
            }
        }
        false
    }

    async fn open(&mut self, url: &str) -> Result<(), ScrapeError> {
        if let Some(old) = self.page.take() {
            if let Err(e) = old.close().await {
                log::debug!("stale page close error: {e}");
            }
        }
        let page = self.browser.new_page(url).await?;
        page.wait_for_navigation().await?;
        self.page = Some(page);
        Ok(())
    }

    /// Scrolls the page down in `steps` increments with randomized
    /// deltas and pauses. Every fifth step takes a larger jump, the way
    /// a reader skims past content they have already seen. Evaluation
    /// errors stop scrolling early and are swallowed.
    pub async fn scroll(&self, steps: u32) {
        let Some(page) = &self.page else {
            return;
        };
        for step in 0..steps {
            let delta = if step % 5 == 4 {
                1_200 + fastrand::u32(0..600)
            } else {
                300 + fastrand::u32(0..300)
            };
            if let Err(e) = page.evaluate(format!("window.scrollBy(0, {delta})")).await {
                log::debug!("scroll stopped early after {step} steps: {e}");
                return;
            }
            sleep(Duration::from_millis(
                250 + u64::from(fastrand::u32(0..400)),
            ))
            .await;
        }
    }

    /// Polls for the first element matching `selector` until `timeout`.
    /// Returns `None` on timeout or when no page is open.
    pub async fn find_one(&self, selector: &str, timeout: Duration) -> Option<Element> {
        let page = self.page.as_ref()?;
        let deadline = Instant::now() + timeout;
        loop {
            if let Ok(element) = page.find_element(selector).await {
                return Some(element);
            }
            if Instant::now() >= deadline {
                return None;
            }
            sleep(FIND_POLL_INTERVAL).await;
        }
    }

    /// Polls for all elements matching `selector` until `timeout`.
    /// Returns an empty `Vec` on timeout or when no page is open.
    pub async fn find_all(&self, selector: &str, timeout: Duration) -> Vec<Element> {
        let Some(page) = &self.page else {
            return Vec::new();
        };
        let deadline = Instant::now() + timeout;
        loop {
            if let Ok(elements) = page.find_elements(selector).await {
                if !elements.is_empty() {
                    return elements;
                }
            }
            if Instant::now() >= deadline {
                return Vec::new();
            }
            sleep(FIND_POLL_INTERVAL).await;
        }
    }

    /// Returns the current page's HTML.
    ///
    /// # Errors
    ///
    /// * `ScrapeError::NoPage` - if nothing has been navigated to yet.
    /// * `ScrapeError::Browser` - if the protocol call fails.
    pub async fn content(&self) -> Result<String, ScrapeError> {
        let page = self.page.as_ref().ok_or(ScrapeError::NoPage)?;
        Ok(page.content().await?)
    }

    /// Discards the current browser and relaunches through the engine
    /// chain. Used after a source leaves the session in a bad state.
    ///
    /// # Errors
    ///
    /// * `ScrapeError::NoEngine` - if the relaunch fails on every engine.
    pub async fn recover(&mut self) -> Result<(), ScrapeError> {
        log::info!("recovering browser session");
        self.teardown().await;
        let (browser, handler_task) = launch_engine().await?;
        self.browser = browser;
        self.handler_task = handler_task;
        Ok(())
    }

    /// Closes the page, the browser process, and the handler task.
    pub async fn close(mut self) {
        self.teardown().await;
    }

    async fn teardown(&mut self) {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                log::debug!("page close error: {e}");
            }
        }
        if let Err(e) = self.browser.close().await {
            log::debug!("browser close error: {e}");
        }
        self.handler_task.abort();
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        // The handler task must not outlive the session even when close()
        // was skipped by an early return.
        self.handler_task.abort();
    }
}

async fn launch_engine() -> Result<(Browser, JoinHandle<()>), ScrapeError> {
    let mut executables = vec![None];
    executables.extend(ENGINE_EXECUTABLES.iter().map(|exe| Some(*exe)));

    for executable in executables {
        let config = match build_config(executable) {
            Ok(config) => config,
            Err(e) => {
                log::debug!("browser config for {executable:?} rejected: {e}");
                continue;
            }
        };
        match Browser::launch(config).await {
            Ok((browser, mut handler)) => {
                log::debug!("browser launched via {}", executable.unwrap_or("default engine"));
                let handler_task =
                    tokio::spawn(async move { while handler.next().await.is_some() {} });
                return Ok((browser, handler_task));
            }
            Err(e) => {
                log::warn!(
                    "browser launch via {} failed: {e}",
                    executable.unwrap_or("default engine")
                );
            }
        }
    }
    Err(ScrapeError::NoEngine)
}

fn build_config(executable: Option<&str>) -> Result<BrowserConfig, String> {
    let mut builder = BrowserConfig::builder()
        .arg("--no-sandbox")
        .arg("--disable-setuid-sandbox")
        .arg("--disable-dev-shm-usage")
        .arg("--disable-gpu");
    if let Some(path) = executable {
        builder = builder.chrome_executable(path);
    }
    builder.build()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn backoff_delay(attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(5);
    let base = BASE_RETRY_DELAY_MS.saturating_mul(1 << exponent);
    let capped = base.min(MAX_RETRY_DELAY_MS);
    let jitter = (capped as f64 * RETRY_JITTER_FACTOR * fastrand::f64()) as u64;
    Duration::from_millis(capped + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn backoff_grows_and_stays_bounded() {
        for attempt in 1..=10 {
            let delay = backoff_delay(attempt);
            assert!(delay >= Duration::from_millis(BASE_RETRY_DELAY_MS));
            let ceiling = MAX_RETRY_DELAY_MS
                + (MAX_RETRY_DELAY_MS as f64 * RETRY_JITTER_FACTOR) as u64;
            assert!(delay <= Duration::from_millis(ceiling));
        }
    }

    #[test]
    fn later_attempts_never_shrink_below_earlier_base() {
        // Jitter aside, the deterministic part doubles until the cap.
        let first = BASE_RETRY_DELAY_MS;
        let second = BASE_RETRY_DELAY_MS * 2;
        assert!(backoff_delay(1) >= Duration::from_millis(first));
        assert!(backoff_delay(2) >= Duration::from_millis(second));
    }
}
