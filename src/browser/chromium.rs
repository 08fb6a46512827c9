//! chromiumoxide によるブラウザセッション実装

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    Headers, SetExtraHttpHeadersParams, SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::traits::{BrowserSession, PageContext, PageProfile, WaitUntil};

/// `navigator.webdriver` を隠すスクリプト（ページスクリプトより先に実行）
const HIDE_WEBDRIVER_SCRIPT: &str =
    "Object.defineProperty(navigator, 'webdriver', { get: () => false });";

/// セレクタ待機のポーリング間隔
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(100);
/// readyState 確認のポーリング間隔
const READY_STATE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// ブラウザの起動・終了処理
///
/// セッションは起動済みハンドルの保持と単一起動だけを受け持ち、
/// 実際のプロセス操作はこのトレイトに任せる。
#[async_trait]
pub trait Launch: Send + Sync {
    type Handle: Send + Sync;

    async fn launch(&self) -> Result<Self::Handle, ScraperError>;

    async fn shutdown(&self, handle: Self::Handle);
}

/// 起動済みブラウザとイベントハンドラタスク
pub struct BrowserHandle {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl Drop for BrowserHandle {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

/// chromiumoxide で Chromium を起動する
pub struct ChromiumLauncher {
    config: ScraperConfig,
}

impl ChromiumLauncher {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }

    fn browser_config(&self) -> Result<BrowserConfig, ScraperError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(1920, 1080)
            .request_timeout(self.config.navigation_timeout);

        if !self.config.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &self.config.chrome_path {
            builder = builder.chrome_executable(path);
        }
        for arg in &self.config.launch_args {
            builder = builder.arg(arg.as_str());
        }
        if self.config.debug {
            builder = builder.arg("--enable-logging=stderr").arg("--v=1");
        }

        builder.build().map_err(ScraperError::BrowserInit)
    }
}

#[async_trait]
impl Launch for ChromiumLauncher {
    type Handle = BrowserHandle;

    async fn launch(&self) -> Result<BrowserHandle, ScraperError> {
        info!("Launching browser (headless={})", self.config.headless);

        let (browser, mut handler) = Browser::launch(self.browser_config()?)
            .await
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {:?}", e);
                }
            }
            debug!("Browser event handler finished");
        });

        info!("Browser launched");
        Ok(BrowserHandle { browser, handler })
    }

    async fn shutdown(&self, mut handle: BrowserHandle) {
        info!("Closing browser...");
        if let Err(e) = handle.browser.close().await {
            warn!("Failed to close browser cleanly: {}", e);
        }
        if let Err(e) = handle.browser.wait().await {
            warn!("Failed to wait for browser exit: {}", e);
        }
        info!("Browser closed");
    }
}

/// 遅延起動・単一インスタンスのブラウザセッション
pub struct ChromiumSession<L: Launch = ChromiumLauncher> {
    launcher: L,
    state: Mutex<Option<L::Handle>>,
}

impl ChromiumSession {
    pub fn new(config: ScraperConfig) -> Self {
        Self::with_launcher(ChromiumLauncher::new(config))
    }
}

impl<L: Launch> ChromiumSession<L> {
    pub fn with_launcher(launcher: L) -> Self {
        Self {
            launcher,
            state: Mutex::new(None),
        }
    }

    pub async fn is_running(&self) -> bool {
        self.state.lock().await.is_some()
    }

    /// 未起動なら起動する
    pub async fn start(&self) -> Result<(), ScraperError> {
        // ロックを保持したまま起動するため、同時呼び出しでも起動は1回
        let mut state = self.state.lock().await;
        if state.is_none() {
            *state = Some(self.launcher.launch().await?);
        }
        Ok(())
    }

    /// 起動済みなら終了する。次回の `start` で新しく起動する
    pub async fn shutdown(&self) {
        let handle = self.state.lock().await.take();
        if let Some(handle) = handle {
            self.launcher.shutdown(handle).await;
        }
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn ensure_started(&self) -> Result<(), ScraperError> {
        self.start().await
    }

    async fn new_page(&self, profile: &PageProfile) -> Result<Box<dyn PageContext>, ScraperError> {
        let page = {
            let state = self.state.lock().await;
            let handle = state
                .as_ref()
                .ok_or_else(|| ScraperError::BrowserInit("Browser not started".to_string()))?;
            handle
                .browser
                .new_page("about:blank")
                .await
                .map_err(|e| ScraperError::Page(e.to_string()))?
        };

        let page = ChromiumPage { page };
        if let Err(e) = page.apply_profile(profile).await {
            if let Err(close_err) = page.close().await {
                debug!("Failed to close page after profile error: {}", close_err);
            }
            return Err(e);
        }

        Ok(Box::new(page))
    }

    async fn close(&self) -> Result<(), ScraperError> {
        self.shutdown().await;
        Ok(())
    }
}

/// chromiumoxide の Page をラップした PageContext
pub struct ChromiumPage {
    page: Page,
}

impl ChromiumPage {
    async fn apply_profile(&self, profile: &PageProfile) -> Result<(), ScraperError> {
        self.page
            .set_user_agent(SetUserAgentOverrideParams::new(profile.user_agent.clone()))
            .await
            .map_err(|e| ScraperError::Page(format!("user agent: {}", e)))?;

        let headers: serde_json::Map<String, serde_json::Value> = profile
            .extra_headers
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();
        self.page
            .execute(SetExtraHttpHeadersParams::new(Headers::new(
                serde_json::Value::Object(headers),
            )))
            .await
            .map_err(|e| ScraperError::Page(format!("extra headers: {}", e)))?;

        if profile.hide_webdriver {
            self.page
                .evaluate_on_new_document(AddScriptToEvaluateOnNewDocumentParams::new(
                    HIDE_WEBDRIVER_SCRIPT,
                ))
                .await
                .map_err(|e| ScraperError::Page(format!("webdriver patch: {}", e)))?;
        }

        Ok(())
    }

    async fn ready_state(&self) -> Result<String, ScraperError> {
        let state = self.evaluate("document.readyState").await?;
        Ok(state.as_str().unwrap_or_default().to_string())
    }
}

#[async_trait]
impl PageContext for ChromiumPage {
    async fn navigate(
        &self,
        url: &str,
        wait_until: WaitUntil,
        limit: Duration,
    ) -> Result<(), ScraperError> {
        let start = Instant::now();

        match timeout(limit, self.page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(ScraperError::Navigation(format!("{}: {}", url, e))),
            Err(_) => {
                return Err(ScraperError::Timeout(format!(
                    "navigation to {} exceeded {:?}",
                    url, limit
                )))
            }
        }

        loop {
            let state = self.ready_state().await?;
            if wait_until.is_satisfied_by(&state) {
                debug!("Page ready ({}) after {:?}", state, start.elapsed());
                return Ok(());
            }
            if start.elapsed() >= limit {
                return Err(ScraperError::Timeout(format!(
                    "{} stuck in readyState={} after {:?}",
                    url, state, limit
                )));
            }
            sleep(READY_STATE_POLL_INTERVAL).await;
        }
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        limit: Duration,
    ) -> Result<(), ScraperError> {
        let start = Instant::now();
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            if start.elapsed() >= limit {
                return Err(ScraperError::ElementNotFound(format!(
                    "'{}' did not appear within {:?}",
                    selector, limit
                )));
            }
            sleep(SELECTOR_POLL_INTERVAL).await;
        }
    }

    async fn evaluate(&self, expression: &str) -> Result<serde_json::Value, ScraperError> {
        let result = self
            .page
            .evaluate(expression)
            .await
            .map_err(|e| ScraperError::JavaScript(e.to_string()))?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn current_url(&self) -> Result<Option<String>, ScraperError> {
        self.page
            .url()
            .await
            .map_err(|e| ScraperError::Page(e.to_string()))
    }

    async fn content(&self) -> Result<String, ScraperError> {
        self.page
            .content()
            .await
            .map_err(|e| ScraperError::JavaScript(e.to_string()))
    }

    async fn screenshot(&self) -> Result<Vec<u8>, ScraperError> {
        self.page
            .screenshot(ScreenshotParams::builder().full_page(true).build())
            .await
            .map_err(|e| ScraperError::Page(e.to_string()))
    }

    async fn close(&self) -> Result<(), ScraperError> {
        self.page
            .clone()
            .close()
            .await
            .map_err(|e| ScraperError::Page(e.to_string()))
    }
}
