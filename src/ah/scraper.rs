//! AH スクレイパー実装
//!
//! キャッシュ確認 → レート制限 → ページ取得 → 遷移・待機 → 抽出 → キャッシュ保存。
//! ページは成功・失敗に関わらず必ず閉じる。

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::Url;

use super::extract;
use super::types::{Category, Product, ProductDetail, Scraped};
use crate::browser::ChromiumSession;
use crate::cache::TtlCache;
use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::rate_limiter::RateLimiter;
use crate::traits::{BrowserSession, PageContext, PageProfile, WaitUntil};

/// 検索件数のデフォルト
pub const DEFAULT_SEARCH_LIMIT: usize = 20;

/// キャッシュキー
mod cache_key {
    pub fn search(query: &str, limit: usize) -> String {
        format!("search:{}:{}", query, limit)
    }

    pub fn product(product_id: &str) -> String {
        format!("product:{}", product_id)
    }

    pub const CATEGORIES: &str = "categories";
}

/// 取得対象ページ
struct PageTarget {
    url: Url,
    /// クライアント描画を待つ固定時間
    settle: Duration,
    /// 描画完了の目安にするセレクタ
    ready_selector: &'static str,
}

/// 抽出結果が空かどうか（デバッグ用スクリーンショットの判定）
trait Extracted {
    fn is_blank(&self) -> bool;
}

impl<T> Extracted for Vec<T> {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl Extracted for ProductDetail {
    fn is_blank(&self) -> bool {
        self.name.is_none()
    }
}

/// Albert Heijn 商品スクレイパー
pub struct AhScraper {
    config: ScraperConfig,
    session: Arc<dyn BrowserSession>,
    profile: PageProfile,
    cache: TtlCache<Scraped>,
    rate_limiter: RateLimiter,
}

impl AhScraper {
    /// Chromium セッションで作成（ブラウザは最初の取得時に起動）
    pub fn new(config: ScraperConfig) -> Self {
        let session = Arc::new(ChromiumSession::new(config.clone()));
        Self::with_session(config, session)
    }

    /// 既存のセッションを使って作成
    pub fn with_session(config: ScraperConfig, session: Arc<dyn BrowserSession>) -> Self {
        Self {
            profile: PageProfile::from(&config),
            cache: TtlCache::new(config.cache_ttl),
            rate_limiter: RateLimiter::new(config.min_request_interval),
            session,
            config,
        }
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// 商品検索（最大 `limit` 件）
    pub async fn search_products(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Product>, ScraperError> {
        let key = cache_key::search(query, limit);
        if let Some(Scraped::Products(products)) = self.cache.get(&key) {
            info!("Cache hit: {}", key);
            return Ok(products);
        }

        let products = self
            .scrape_search(query, limit)
            .await
            .map_err(ScraperError::search)?;

        info!("Found {} products for '{}'", products.len(), query);
        self.cache.set(key, Scraped::Products(products.clone()));
        Ok(products)
    }

    /// 商品詳細
    pub async fn get_product_details(
        &self,
        product_id: &str,
    ) -> Result<ProductDetail, ScraperError> {
        let key = cache_key::product(product_id);
        if let Some(Scraped::Detail(detail)) = self.cache.get(&key) {
            info!("Cache hit: {}", key);
            return Ok(detail);
        }

        let detail = self
            .scrape_detail(product_id)
            .await
            .map_err(ScraperError::product_details)?;

        self.cache.set(key, Scraped::Detail(detail.clone()));
        Ok(detail)
    }

    /// トップページのカテゴリ一覧
    pub async fn get_categories(&self) -> Result<Vec<Category>, ScraperError> {
        if let Some(Scraped::Categories(categories)) = self.cache.get(cache_key::CATEGORIES) {
            info!("Cache hit: {}", cache_key::CATEGORIES);
            return Ok(categories);
        }

        let categories = self
            .scrape_categories()
            .await
            .map_err(ScraperError::categories)?;

        info!("Found {} categories", categories.len());
        self.cache
            .set(cache_key::CATEGORIES, Scraped::Categories(categories.clone()));
        Ok(categories)
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_size(&self) -> usize {
        self.cache.size()
    }

    /// ブラウザを終了（プロセス終了前に呼ぶ）
    pub async fn close(&self) -> Result<(), ScraperError> {
        self.session.close().await
    }

    async fn scrape_search(&self, query: &str, limit: usize) -> Result<Vec<Product>, ScraperError> {
        let target = PageTarget {
            url: self.config.search_url(query)?,
            settle: self.config.search_settle,
            ready_selector: extract::SEARCH_READY_SELECTOR,
        };
        self.fetch(target, |html, base| extract::search_results(html, base, limit))
            .await
    }

    async fn scrape_detail(&self, product_id: &str) -> Result<ProductDetail, ScraperError> {
        let target = PageTarget {
            url: self.config.product_url(product_id)?,
            settle: self.config.detail_settle,
            ready_selector: extract::DETAIL_READY_SELECTOR,
        };
        self.fetch(target, |html, base| {
            extract::product_detail(html, base, product_id)
        })
        .await
    }

    async fn scrape_categories(&self) -> Result<Vec<Category>, ScraperError> {
        let target = PageTarget {
            url: self.config.base()?,
            settle: self.config.detail_settle,
            ready_selector: extract::CATEGORY_READY_SELECTOR,
        };
        self.fetch(target, extract::categories).await
    }

    /// レート制限 → ブラウザ起動 → ページ取得 → 読み込み・抽出 → ページ解放
    async fn fetch<T, F>(&self, target: PageTarget, parse: F) -> Result<T, ScraperError>
    where
        T: Extracted,
        F: FnOnce(&str, &Url) -> T + Send,
    {
        self.rate_limiter.wait_for_slot().await;
        self.session.ensure_started().await?;
        let page = self.session.new_page(&self.profile).await?;

        let outcome = self.load_and_extract(page.as_ref(), &target, parse).await;

        if let Err(e) = page.close().await {
            warn!("Failed to close page for {}: {}", target.url, e);
        }
        outcome
    }

    async fn load_and_extract<T, F>(
        &self,
        page: &dyn PageContext,
        target: &PageTarget,
        parse: F,
    ) -> Result<T, ScraperError>
    where
        T: Extracted,
        F: FnOnce(&str, &Url) -> T + Send,
    {
        info!("Fetching {}", target.url);
        page.navigate(
            target.url.as_str(),
            WaitUntil::DomContentLoaded,
            self.config.navigation_timeout,
        )
        .await?;

        sleep(target.settle).await;

        // 見つからなくても続行する（抽出側のフォールバックに任せる）
        if let Err(e) = page
            .wait_for_selector(target.ready_selector, self.config.selector_timeout)
            .await
        {
            info!("Ready selector missing on {}, trying fallbacks: {}", target.url, e);
        }

        let html = page.content().await?;
        let base = self.page_base(page, target).await;
        let extracted = parse(&html, &base);

        if extracted.is_blank() {
            warn!("Nothing extracted from {}", target.url);
            if self.config.debug {
                self.log_screenshot(page).await;
            }
        }

        Ok(extracted)
    }

    /// 相対URLの解決基準（リダイレクト後のURL、取れなければ遷移先）
    async fn page_base(&self, page: &dyn PageContext, target: &PageTarget) -> Url {
        match page.current_url().await {
            Ok(Some(current)) => Url::parse(&current)
                .ok()
                .filter(|url| matches!(url.scheme(), "http" | "https"))
                .unwrap_or_else(|| target.url.clone()),
            Ok(None) => target.url.clone(),
            Err(e) => {
                debug!("Failed to read page url: {}", e);
                target.url.clone()
            }
        }
    }

    async fn log_screenshot(&self, page: &dyn PageContext) {
        match page.screenshot().await {
            Ok(png) => {
                let encoded = base64::engine::general_purpose::STANDARD.encode(&png);
                debug!("Screenshot: data:image/png;base64,{}", encoded);
            }
            Err(e) => debug!("Failed to take screenshot: {}", e),
        }
    }
}
