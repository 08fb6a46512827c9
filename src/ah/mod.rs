//! Albert Heijn (ah.nl) 商品スクレイパー
//!
//! 検索結果・商品詳細・カテゴリ一覧を取得する。

pub mod extract;
mod scraper;
mod types;

pub use self::scraper::{AhScraper, DEFAULT_SEARCH_LIMIT};
pub use types::{Category, Nutrition, Product, ProductDetail};
