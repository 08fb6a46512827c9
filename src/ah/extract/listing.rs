//! 一覧ページ（検索結果・カテゴリ）の抽出
//!
//! カード候補の探索は戦略リストを先頭から試し、最初に1件以上返した戦略だけを使う。

use std::collections::HashSet;

use scraper::{ElementRef, Html};
use tracing::debug;
use url::Url;

use super::dom::{
    closest, first_match, first_text, image_src, non_empty_text, resolve, select_all,
    select_within, trailing_segment,
};
use crate::ah::types::{Category, Product};

/// 検索結果の描画完了を判定するセレクタ
pub const SEARCH_READY_SELECTOR: &str = r#"[data-testhook="product-card"], .product-card, [class*="ProductCard"], article, [class*="product"]"#;

/// カテゴリリンクの描画完了を判定するセレクタ
pub const CATEGORY_READY_SELECTOR: &str =
    r#"[data-testhook="category-link"], .category-link, a[class*="Category"]"#;

const PRODUCT_LINK: &str = r#"a[href*="/producten/product/"]"#;
const PRODUCT_PATH: &str = "/producten/product/";

const TITLE_SELECTORS: &[&str] = &[
    r#"[data-testhook="product-title"]"#,
    ".product-title",
    r#"[class*="ProductTitle"]"#,
    "h3",
    "h2",
    r#"[class*="title"]"#,
];

const PRICE_SELECTORS: &[&str] = &[
    r#"[data-testhook="price-amount"]"#,
    ".price",
    r#"[class*="Price"]"#,
    r#"[class*="price"]"#,
];

const BRAND_SELECTORS: &[&str] = &[
    r#"[data-testhook="product-brand"]"#,
    ".brand",
    r#"[class*="Brand"]"#,
];

/// DOMから候補要素を返す戦略（全戦略で同一シグネチャ）
pub type Strategy = for<'a> fn(&'a Html) -> Vec<ElementRef<'a>>;

/// 名前付き戦略（ログ用の名前を持つ）
#[derive(Clone, Copy)]
pub struct NamedStrategy {
    pub name: &'static str,
    pub find: Strategy,
}

/// 商品カードの探索順
pub const SEARCH_CARD_STRATEGIES: &[NamedStrategy] = &[
    NamedStrategy { name: "test-hook", find: cards_by_test_hook },
    NamedStrategy { name: "semantic-class", find: cards_by_class },
    NamedStrategy { name: "article", find: cards_by_article },
    NamedStrategy { name: "product-links", find: cards_by_product_links },
];

/// カテゴリリンクの探索順
pub const CATEGORY_LINK_STRATEGIES: &[NamedStrategy] = &[
    NamedStrategy { name: "test-hook", find: category_links_by_test_hook },
    NamedStrategy { name: "class", find: category_links_by_class },
    NamedStrategy { name: "anchor-class", find: category_links_by_anchor_class },
];

/// 最初に1件以上返した戦略の結果（後続の戦略は評価しない）
pub fn first_success<'a>(
    doc: &'a Html,
    strategies: &[NamedStrategy],
) -> Option<(&'static str, Vec<ElementRef<'a>>)> {
    strategies.iter().find_map(|strategy| {
        let found = (strategy.find)(doc);
        (!found.is_empty()).then_some((strategy.name, found))
    })
}

fn cards_by_test_hook(doc: &Html) -> Vec<ElementRef<'_>> {
    select_all(doc, r#"[data-testhook="product-card"]"#)
}

fn cards_by_class(doc: &Html) -> Vec<ElementRef<'_>> {
    select_all(doc, r#".product-card, [class*="ProductCard"]"#)
}

fn cards_by_article(doc: &Html) -> Vec<ElementRef<'_>> {
    select_all(doc, "article")
}

/// 最終手段: 商品URLへのリンクを集め、末尾セグメントで重複排除し、
/// 最も近いコンテナ要素を疑似カードとする
fn cards_by_product_links(doc: &Html) -> Vec<ElementRef<'_>> {
    let mut seen = HashSet::new();
    let mut cards = Vec::new();

    for link in select_all(doc, r#"a[href*="/producten/"]"#) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        if !href.contains(PRODUCT_PATH) {
            continue;
        }
        let id = trailing_segment(href);
        if seen.contains(&id) {
            continue;
        }
        if let Some(container) = closest(link, &["div", "article", "li"]) {
            seen.insert(id);
            cards.push(container);
        }
    }

    cards
}

fn category_links_by_test_hook(doc: &Html) -> Vec<ElementRef<'_>> {
    select_all(doc, r#"[data-testhook="category-link"]"#)
}

fn category_links_by_class(doc: &Html) -> Vec<ElementRef<'_>> {
    select_all(doc, ".category-link")
}

fn category_links_by_anchor_class(doc: &Html) -> Vec<ElementRef<'_>> {
    select_all(doc, r#"a[class*="Category"]"#)
}

/// カード内の商品リンク（なければ任意のリンク、カード自身がリンクならそれ）
fn card_link<'a>(card: ElementRef<'a>) -> Option<ElementRef<'a>> {
    first_match(card, &[PRODUCT_LINK, "a"])
        .or_else(|| (card.value().name() == "a").then_some(card))
}

fn parse_card(card: ElementRef<'_>, base: &Url) -> Option<Product> {
    let link = card_link(card)?;
    let url = resolve(base, link.value().attr("href")?)?;

    // タイトルが取れないカードは捨てる（リンク文字列が最後の候補）
    let name = first_text(card, TITLE_SELECTORS).or_else(|| non_empty_text(link))?;

    let price = first_text(card, PRICE_SELECTORS);
    let brand = first_text(card, BRAND_SELECTORS);
    let image = select_within(card, "img")
        .into_iter()
        .next()
        .and_then(|img| image_src(img, base));

    Some(Product {
        id: trailing_segment(&url),
        name,
        brand,
        price,
        image,
        url,
    })
}

/// 検索結果ページから最大 `limit` 件の商品を文書順で抽出
pub fn search_results(html: &str, base: &Url, limit: usize) -> Vec<Product> {
    let doc = Html::parse_document(html);
    let Some((strategy, cards)) = first_success(&doc, SEARCH_CARD_STRATEGIES) else {
        debug!("No product cards found by any strategy");
        return Vec::new();
    };
    debug!("Found {} product cards via '{}'", cards.len(), strategy);

    cards
        .into_iter()
        .filter_map(|card| parse_card(card, base))
        .take(limit)
        .collect()
}

/// トップページからカテゴリリンクを抽出（URL で重複排除）
pub fn categories(html: &str, base: &Url) -> Vec<Category> {
    let doc = Html::parse_document(html);
    let Some((strategy, links)) = first_success(&doc, CATEGORY_LINK_STRATEGIES) else {
        debug!("No category links found by any strategy");
        return Vec::new();
    };
    debug!("Found {} category links via '{}'", links.len(), strategy);

    let mut seen = HashSet::new();
    links
        .into_iter()
        .filter_map(|link| {
            let name = non_empty_text(link)?;
            let anchor = if link.value().name() == "a" {
                link
            } else {
                first_match(link, &["a[href]"])?
            };
            let url = resolve(base, anchor.value().attr("href")?)?;
            if !seen.insert(url.clone()) {
                return None;
            }
            let id = trailing_segment(&url);
            Some(Category { name, url, id })
        })
        .collect()
}
