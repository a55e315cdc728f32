//! Headless Chrome rendering for JavaScript-heavy pages.

use crate::error::{PaddockError, Result};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions};
use std::ffi::OsStr;
use std::time::Duration;

/// Renders a page and returns its final HTML.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Load `url`, scroll to the bottom, wait `settle` for dynamic content and return the DOM.
    async fn render(&self, url: &str, settle: Duration) -> Result<String>;
}

/// Chrome-backed renderer. Each render launches a fresh browser on a blocking thread.
#[derive(Debug, Clone)]
pub struct BrowserRenderer {
    headless: bool,
    user_agent: String,
    navigation_timeout: Duration,
}

impl BrowserRenderer {
    pub fn new(headless: bool, user_agent: &str, navigation_timeout: Duration) -> Self {
        Self {
            headless,
            user_agent: user_agent.to_string(),
            navigation_timeout,
        }
    }
}

#[async_trait]
impl PageRenderer for BrowserRenderer {
    async fn render(&self, url: &str, settle: Duration) -> Result<String> {
        let renderer = self.clone();
        let url = url.to_string();

        tokio::task::spawn_blocking(move || renderer.render_blocking(&url, settle))
            .await
            .map_err(|e| PaddockError::Browser(format!("Render task failed: {}", e)))?
    }
}

impl BrowserRenderer {
    fn render_blocking(&self, url: &str, settle: Duration) -> Result<String> {
        let args: Vec<&OsStr> = ["--no-sandbox", "--disable-dev-shm-usage", "--disable-gpu"]
            .iter()
            .map(|arg| OsStr::new(*arg))
            .collect();
        let options = LaunchOptions {
            headless: self.headless,
            window_size: Some((1920, 1080)),
            args,
            idle_browser_timeout: self.navigation_timeout + settle + Duration::from_secs(30),
            ..Default::default()
        };

        let browser = Browser::new(options).map_err(|e| browser_err(url, "launch failed", e))?;
        let tab = browser.new_tab().map_err(|e| browser_err(url, "new tab failed", e))?;
        tab.set_default_timeout(self.navigation_timeout);
        tab.set_user_agent(&self.user_agent, None, None)
            .map_err(|e| browser_err(url, "set user agent failed", e))?;

        tracing::debug!("Rendering {}", url);
        tab.navigate_to(url)
            .map_err(|e| browser_err(url, "navigation failed", e))?
            .wait_until_navigated()
            .map_err(|e| browser_err(url, "navigation did not complete", e))?;

        if let Err(e) = tab.wait_for_element("body") {
            tracing::warn!("No body element on {}: {}", url, e);
        }

        if let Err(e) = tab.evaluate("window.scrollTo(0, document.body.scrollHeight);", false) {
            tracing::debug!("Scroll failed on {}: {}", url, e);
        }
        std::thread::sleep(settle);

        let html = tab.get_content().map_err(|e| browser_err(url, "reading content failed", e))?;
        tracing::debug!("Rendered {} ({} bytes)", url, html.len());
        Ok(html)
    }
}

fn browser_err(url: &str, context: &str, e: impl std::fmt::Display) -> PaddockError {
    PaddockError::Browser(format!("{} ({}): {}", context, url, e))
}
