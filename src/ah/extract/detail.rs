//! 商品詳細ページの抽出
//!
//! 各項目は独立したフォールバックリストで解決し、見つからなければ None。

use scraper::{ElementRef, Html};
use url::Url;

use super::dom::{first_match, first_text, image_src, select_within, text_of};
use crate::ah::types::{Nutrition, ProductDetail};

/// 詳細ページの描画完了を判定するセレクタ
pub const DETAIL_READY_SELECTOR: &str = r#"[data-testhook="product-title"], .product-title, h1"#;

const NAME_SELECTORS: &[&str] = &[r#"[data-testhook="product-title"]"#, ".product-title", "h1"];
const BRAND_SELECTORS: &[&str] = &[
    r#"[data-testhook="product-brand"]"#,
    ".brand",
    r#"[class*="Brand"]"#,
];
const PRICE_SELECTORS: &[&str] = &[
    r#"[data-testhook="price-amount"]"#,
    ".price",
    r#"[class*="Price"]"#,
];
const IMAGE_SELECTORS: &[&str] = &[
    r#"[data-testhook="product-image"]"#,
    ".product-image img",
    r#"img[class*="Product"]"#,
];
const DESCRIPTION_SELECTORS: &[&str] = &[
    r#"[data-testhook="product-description"]"#,
    ".description",
    r#"[class*="Description"]"#,
];
const INGREDIENTS_SELECTORS: &[&str] = &[
    r#"[data-testhook="product-ingredients"]"#,
    ".ingredients",
    r#"[class*="Ingredients"]"#,
];
const ALLERGENS_SELECTORS: &[&str] = &[
    r#"[data-testhook="product-allergens"]"#,
    ".allergens",
    r#"[class*="Allergens"]"#,
];
const NUTRITION_TABLE_SELECTORS: &[&str] = &[
    r#"[data-testhook="nutrition-table"]"#,
    ".nutrition-table",
    r#"table[class*="Nutrition"]"#,
];
const CATEGORY_SELECTORS: &[&str] = &[
    r#"[data-testhook="breadcrumb"]"#,
    ".breadcrumb",
    r#"nav[class*="Breadcrumb"]"#,
];

/// 商品画像。一致要素が img でなければ内側の最初の img を使う
fn product_image(root: ElementRef<'_>, base: &Url) -> Option<String> {
    IMAGE_SELECTORS.iter().find_map(|css| {
        let element = first_match(root, &[*css])?;
        if element.value().name() == "img" {
            image_src(element, base)
        } else {
            select_within(element, "img")
                .into_iter()
                .next()
                .and_then(|img| image_src(img, base))
        }
    })
}

/// 栄養成分表を行ごとに解析（セルが2つ未満の行は無視、同じキーは後勝ち）
pub fn parse_nutrition(table: ElementRef<'_>) -> Nutrition {
    let mut nutrition = Nutrition::new();
    for row in select_within(table, "tr") {
        let cells = select_within(row, "td, th");
        if let [key, value, ..] = cells.as_slice() {
            nutrition.insert(text_of(*key), text_of(*value));
        }
    }
    nutrition
}

/// 商品詳細ページを解析する。`page_url` は相対URLの解決基準
pub fn product_detail(html: &str, page_url: &Url, product_id: &str) -> ProductDetail {
    let doc = Html::parse_document(html);
    let root = doc.root_element();

    ProductDetail {
        id: product_id.to_string(),
        url: page_url.to_string(),
        name: first_text(root, NAME_SELECTORS),
        brand: first_text(root, BRAND_SELECTORS),
        price: first_text(root, PRICE_SELECTORS),
        image: product_image(root, page_url),
        description: first_text(root, DESCRIPTION_SELECTORS),
        ingredients: first_text(root, INGREDIENTS_SELECTORS),
        allergens: first_text(root, ALLERGENS_SELECTORS),
        nutrition: first_match(root, NUTRITION_TABLE_SELECTORS).map(parse_nutrition),
        category: first_text(root, CATEGORY_SELECTORS),
    }
}
