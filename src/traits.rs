use std::time::Duration;

use async_trait::async_trait;

use crate::config::ScraperConfig;
use crate::error::ScraperError;

/// ナビゲーション完了とみなすタイミング
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitUntil {
    /// `document.readyState` が interactive 以降
    DomContentLoaded,
    /// `document.readyState` が complete
    Load,
}

impl WaitUntil {
    /// readyState がこの待機条件を満たすか
    pub fn is_satisfied_by(self, ready_state: &str) -> bool {
        match self {
            Self::DomContentLoaded => matches!(ready_state, "interactive" | "complete"),
            Self::Load => ready_state == "complete",
        }
    }
}

/// 新規ページに適用する検知回避プロファイル
#[derive(Debug, Clone)]
pub struct PageProfile {
    pub user_agent: String,
    pub extra_headers: Vec<(String, String)>,
    /// ページスクリプト実行前に `navigator.webdriver` を false に差し替える
    pub hide_webdriver: bool,
}

impl From<&ScraperConfig> for PageProfile {
    fn from(config: &ScraperConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            extra_headers: config.extra_headers.clone(),
            hide_webdriver: true,
        }
    }
}

/// 1操作専用のページ（タブ）
#[async_trait]
pub trait PageContext: Send + Sync {
    /// URLへ遷移し、`wait_until` を満たすまで待機（最大 `timeout`）
    async fn navigate(
        &self,
        url: &str,
        wait_until: WaitUntil,
        timeout: Duration,
    ) -> Result<(), ScraperError>;

    /// セレクタに一致する要素が現れるまで待機
    async fn wait_for_selector(&self, selector: &str, timeout: Duration)
        -> Result<(), ScraperError>;

    /// ページコンテキストで式を評価
    async fn evaluate(&self, expression: &str) -> Result<serde_json::Value, ScraperError>;

    /// 現在のURL（リダイレクト後）
    async fn current_url(&self) -> Result<Option<String>, ScraperError>;

    /// 描画済みDOMのHTMLスナップショット
    async fn content(&self) -> Result<String, ScraperError> {
        let html = self.evaluate("document.documentElement.outerHTML").await?;
        html.as_str()
            .map(str::to_owned)
            .ok_or_else(|| ScraperError::JavaScript(format!("outerHTML is not a string: {html}")))
    }

    /// フルページスクリーンショット（PNG）
    async fn screenshot(&self) -> Result<Vec<u8>, ScraperError>;

    async fn close(&self) -> Result<(), ScraperError>;
}

/// プロセス内で共有するブラウザセッション
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// 未起動なら起動する（同時呼び出しでも起動は1回）
    async fn ensure_started(&self) -> Result<(), ScraperError>;

    async fn new_page(&self, profile: &PageProfile) -> Result<Box<dyn PageContext>, ScraperError>;

    /// ブラウザを終了。次回の `ensure_started` で新しく起動する
    async fn close(&self) -> Result<(), ScraperError>;
}
