use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tower::Service;
use tracing::info;

use crate::ah::{AhScraper, Category, Product, ProductDetail, DEFAULT_SEARCH_LIMIT};
use crate::config::ScraperConfig;
use crate::error::ScraperError;

/// スクレイピングリクエスト
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeRequest {
    Search { query: String, limit: usize },
    ProductDetails { product_id: String },
    Categories,
}

impl ScrapeRequest {
    /// 商品検索（件数はデフォルト 20）
    pub fn search(query: impl Into<String>) -> Self {
        Self::Search {
            query: query.into(),
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    pub fn product_details(product_id: impl Into<String>) -> Self {
        Self::ProductDetails {
            product_id: product_id.into(),
        }
    }

    pub fn categories() -> Self {
        Self::Categories
    }

    /// 検索件数を指定（検索以外のリクエストには影響しない）
    pub fn with_limit(mut self, new_limit: usize) -> Self {
        if let Self::Search { limit, .. } = &mut self {
            *limit = new_limit;
        }
        self
    }
}

/// スクレイピング結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeResponse {
    Products(Vec<Product>),
    ProductDetails(ProductDetail),
    Categories(Vec<Category>),
}

/// tower::Serviceを実装したスクレイパーサービス
///
/// クローンは同じスクレイパー（キャッシュ・レート制限・ブラウザ）を共有する。
#[derive(Clone)]
pub struct ScraperService {
    scraper: Arc<AhScraper>,
}

impl ScraperService {
    pub fn new(config: ScraperConfig) -> Self {
        Self::from_scraper(Arc::new(AhScraper::new(config)))
    }

    pub fn from_scraper(scraper: Arc<AhScraper>) -> Self {
        Self { scraper }
    }

    pub fn scraper(&self) -> &Arc<AhScraper> {
        &self.scraper
    }
}

impl Service<ScrapeRequest> for ScraperService {
    type Response = ScrapeResponse;
    type Error = ScraperError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ScrapeRequest) -> Self::Future {
        info!("スクレイピングリクエスト受信: {:?}", req);
        let scraper = self.scraper.clone();

        Box::pin(async move {
            let response = match req {
                ScrapeRequest::Search { query, limit } => {
                    ScrapeResponse::Products(scraper.search_products(&query, limit).await?)
                }
                ScrapeRequest::ProductDetails { product_id } => {
                    ScrapeResponse::ProductDetails(scraper.get_product_details(&product_id).await?)
                }
                ScrapeRequest::Categories => {
                    ScrapeResponse::Categories(scraper.get_categories().await?)
                }
            };
            Ok(response)
        })
    }
}
