//! AH スクレイパーの型定義

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 検索結果の商品カード
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub brand: Option<String>,
    pub price: Option<String>,
    pub image: Option<String>,
    pub url: String,
    /// URL末尾のパスセグメント
    pub id: String,
}

/// 栄養成分表（1列目 → 2列目）
pub type Nutrition = BTreeMap<String, String>;

/// 商品詳細。DOMで見つからない項目は None
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDetail {
    pub id: String,
    pub url: String,
    pub name: Option<String>,
    pub brand: Option<String>,
    pub price: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
    pub ingredients: Option<String>,
    pub allergens: Option<String>,
    pub nutrition: Option<Nutrition>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub url: String,
    pub id: String,
}

/// キャッシュに格納する取得結果
#[derive(Debug, Clone)]
pub(crate) enum Scraped {
    Products(Vec<Product>),
    Detail(ProductDetail),
    Categories(Vec<Category>),
}
