//! Headless browser strategy.
//!
//! Drives a Chromium-compatible binary over the DevTools protocol with
//! `chromiumoxide`: launch, open a page, navigate, read back the serialized
//! DOM. A browser never reports an HTTP status, so the response carries none.
//! The whole session, launch included, is bounded by the browser timeout;
//! when it fires the session is dropped and the browser process with it.

use super::FetchStrategy;
use crate::error::{ProbeError, Result};
use crate::types::{FetchRequest, RawResponse};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub struct HeadlessChrome {
    binary: PathBuf,
    timeout: Duration,
}

impl HeadlessChrome {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    fn config(&self, request: &FetchRequest) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .chrome_executable(&self.binary)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions");
        if let Some(ua) = request.user_agent() {
            builder = builder.arg(format!("--user-agent={ua}"));
        }
        builder
            .build()
            .map_err(|e| ProbeError::transport(format!("invalid browser config: {e}")))
    }
}

#[async_trait]
impl FetchStrategy for HeadlessChrome {
    fn name(&self) -> &str {
        "headless-chrome"
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<RawResponse> {
        let config = self.config(request)?;
        debug!(binary = %self.binary.display(), "launching browser");

        match tokio::time::timeout(self.timeout, session(config, &self.binary, request.url())).await
        {
            Ok(dom) => dom.map(RawResponse::without_status),
            Err(_) => {
                warn!(timeout = ?self.timeout, "browser timed out, tearing it down");
                Err(ProbeError::Timeout(self.timeout))
            }
        }
    }
}

/// Aborts the CDP event loop when the session ends, however it ends.
struct EventLoop(JoinHandle<()>);

impl Drop for EventLoop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

async fn session(config: BrowserConfig, binary: &Path, url: &str) -> Result<String> {
    let (mut browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        ProbeError::transport(format!("failed to launch {}: {e}", binary.display()))
    })?;
    let _events = EventLoop(tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            let _ = event;
        }
    }));

    let dom = dump_dom(&browser, url).await;

    match browser.close().await {
        Ok(_) => {
            if let Err(e) = browser.wait().await {
                debug!(error = %e, "browser did not exit cleanly");
            }
        }
        Err(e) => {
            debug!(error = %e, "browser close failed, killing it");
            if let Some(Err(e)) = browser.kill().await {
                debug!(error = %e, "browser kill failed");
            }
        }
    }

    dom
}

async fn dump_dom(browser: &Browser, url: &str) -> Result<String> {
    let page = browser
        .new_page("about:blank")
        .await
        .map_err(|e| ProbeError::transport(format!("failed to open page: {e}")))?;
    page.goto(url)
        .await
        .map_err(|e| ProbeError::transport(format!("navigation failed: {e}")))?;
    page.wait_for_navigation()
        .await
        .map_err(|e| ProbeError::transport(format!("page did not finish loading: {e}")))?;
    page.content()
        .await
        .map_err(|e| ProbeError::transport(format!("failed to read DOM: {e}")))
}
