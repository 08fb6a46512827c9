//! テスト用のブラウザセッション（固定HTMLを返す）

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};
use tokio::time::Instant;

use crate::error::ScraperError;
use crate::traits::{BrowserSession, PageContext, PageProfile, WaitUntil};

pub(crate) const SEARCH_HTML: &str = r#"
<html><body>
  <div data-testhook="product-card">
    <a href="/producten/product/wi1525/ah-halfvolle-melk"><span data-testhook="product-title">AH Halfvolle melk</span></a>
    <span data-testhook="price-amount">1.29</span>
    <img data-src="/images/wi1525.jpg">
  </div>
  <div data-testhook="product-card">
    <a href="/producten/product/wi1526/ah-volle-melk"><span data-testhook="product-title">AH Volle melk</span></a>
  </div>
</body></html>"#;

pub(crate) const DETAIL_HTML: &str = r#"
<html><body>
  <h1 data-testhook="product-title">AH Halfvolle melk</h1>
  <div data-testhook="price-amount">1.29</div>
  <table class="nutrition-table">
    <tr><td>Energie</td><td>100 kcal</td></tr>
    <tr><td>Vet</td><td>2 g</td></tr>
  </table>
</body></html>"#;

pub(crate) const CATEGORY_HTML: &str = r#"
<html><body><nav>
  <a data-testhook="category-link" href="/producten/zuivel-eieren">Zuivel, eieren</a>
  <a data-testhook="category-link" href="/producten/bakkerij">Bakkerij</a>
</nav></body></html>"#;

type Pages = Arc<dyn Fn(&str) -> String + Send + Sync>;

#[derive(Default)]
pub(crate) struct MockStats {
    pub starts: AtomicUsize,
    pub pages_opened: AtomicUsize,
    pub pages_closed: AtomicUsize,
    pub navigations: AtomicUsize,
    pub selector_misses: AtomicUsize,
    pub screenshots: AtomicUsize,
    pub session_closes: AtomicUsize,
    log: Mutex<Vec<(String, Instant)>>,
}

pub(crate) struct MockSession {
    pub stats: Arc<MockStats>,
    pub fail_start: AtomicBool,
    pub fail_navigation: Arc<AtomicBool>,
    pub fail_content: Arc<AtomicBool>,
    pages: Pages,
}

impl MockSession {
    /// URLで検索・詳細・トップページの固定HTMLを返す
    pub fn new() -> Arc<Self> {
        Self::with_pages(|url| {
            if url.contains("/zoeken") {
                SEARCH_HTML.to_string()
            } else if url.contains("/producten/product/") {
                DETAIL_HTML.to_string()
            } else {
                CATEGORY_HTML.to_string()
            }
        })
    }

    pub fn with_pages(pages: impl Fn(&str) -> String + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            stats: Arc::default(),
            fail_start: AtomicBool::new(false),
            fail_navigation: Arc::default(),
            fail_content: Arc::default(),
            pages: Arc::new(pages),
        })
    }

    pub fn navigated_urls(&self) -> Vec<String> {
        self.stats.log.lock().unwrap().iter().map(|(url, _)| url.clone()).collect()
    }

    pub fn navigation_times(&self) -> Vec<Instant> {
        self.stats.log.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }
}

#[async_trait]
impl BrowserSession for MockSession {
    async fn ensure_started(&self) -> Result<(), ScraperError> {
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(ScraperError::BrowserInit("mock launch failure".into()));
        }
        self.stats.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn new_page(&self, _profile: &PageProfile) -> Result<Box<dyn PageContext>, ScraperError> {
        self.stats.pages_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockPage {
            stats: self.stats.clone(),
            fail_navigation: self.fail_navigation.clone(),
            fail_content: self.fail_content.clone(),
            pages: self.pages.clone(),
            url: Mutex::new(None),
        }))
    }

    async fn close(&self) -> Result<(), ScraperError> {
        self.stats.session_closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct MockPage {
    stats: Arc<MockStats>,
    fail_navigation: Arc<AtomicBool>,
    fail_content: Arc<AtomicBool>,
    pages: Pages,
    url: Mutex<Option<String>>,
}

impl MockPage {
    fn html(&self) -> String {
        match self.url.lock().unwrap().as_deref() {
            Some(url) => (self.pages)(url),
            None => "<html></html>".to_string(),
        }
    }
}

#[async_trait]
impl PageContext for MockPage {
    async fn navigate(
        &self,
        url: &str,
        _wait_until: WaitUntil,
        timeout: Duration,
    ) -> Result<(), ScraperError> {
        self.stats.navigations.fetch_add(1, Ordering::SeqCst);
        self.stats
            .log
            .lock()
            .unwrap()
            .push((url.to_string(), Instant::now()));
        if self.fail_navigation.load(Ordering::SeqCst) {
            return Err(ScraperError::Timeout(format!("{} after {:?}", url, timeout)));
        }
        *self.url.lock().unwrap() = Some(url.to_string());
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, _timeout: Duration) -> Result<(), ScraperError> {
        let found = {
            let doc = Html::parse_document(&self.html());
            Selector::parse(selector)
                .map(|s| doc.select(&s).next().is_some())
                .unwrap_or(false)
        };
        if found {
            Ok(())
        } else {
            self.stats.selector_misses.fetch_add(1, Ordering::SeqCst);
            Err(ScraperError::ElementNotFound(selector.to_string()))
        }
    }

    async fn evaluate(&self, expression: &str) -> Result<serde_json::Value, ScraperError> {
        if self.fail_content.load(Ordering::SeqCst) {
            return Err(ScraperError::JavaScript(format!("mock failure: {}", expression)));
        }
        Ok(serde_json::Value::String(self.html()))
    }

    async fn current_url(&self) -> Result<Option<String>, ScraperError> {
        Ok(self.url.lock().unwrap().clone())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, ScraperError> {
        self.stats.screenshots.fetch_add(1, Ordering::SeqCst);
        Ok(vec![0x89, b'P', b'N', b'G'])
    }

    async fn close(&self) -> Result<(), ScraperError> {
        self.stats.pages_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
