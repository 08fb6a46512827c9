//! Albert Heijn (ah.nl) 商品スクレイパーライブラリ
//!
//! - 商品検索・商品詳細・カテゴリ一覧を取得
//! - 結果はTTL付きでキャッシュ、ページ取得は最小間隔でレート制限
//! - ブラウザは最初の取得時に1つだけ起動し、全操作で共有
//!
//! # 使用例
//!
//! ```rust,ignore
//! use ah_scraper::{AhScraper, ScraperConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let scraper = AhScraper::new(ScraperConfig::from_env());
//!
//!     let products = scraper.search_products("melk", 5).await.unwrap();
//!     println!("Products: {:?}", products.len());
//!
//!     if let Some(first) = products.first() {
//!         let detail = scraper.get_product_details(&first.id).await.unwrap();
//!         println!("Nutrition: {:?}", detail.nutrition);
//!     }
//!
//!     scraper.close().await.unwrap();
//! }
//! ```
//!
//! # tower Service 使用例
//!
//! ```rust,ignore
//! use ah_scraper::{ScrapeRequest, ScraperConfig, ScraperService};
//! use tower::Service;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut service = ScraperService::new(ScraperConfig::default());
//!     let response = service.call(ScrapeRequest::search("kaas").with_limit(10)).await.unwrap();
//!     println!("{:?}", response);
//!     service.scraper().close().await.unwrap();
//! }
//! ```

pub mod ah;
pub mod browser;
pub mod cache;
pub mod config;
pub mod error;
pub mod rate_limiter;
pub mod service;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

// 主要な型をリエクスポート
pub use ah::{AhScraper, Category, Nutrition, Product, ProductDetail, DEFAULT_SEARCH_LIMIT};
pub use browser::ChromiumSession;
pub use cache::TtlCache;
pub use config::ScraperConfig;
pub use error::ScraperError;
pub use rate_limiter::RateLimiter;
pub use service::{ScrapeRequest, ScrapeResponse, ScraperService};
pub use traits::{BrowserSession, PageContext, PageProfile, WaitUntil};
