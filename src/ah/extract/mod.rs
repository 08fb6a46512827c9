//! DOMスナップショットからの抽出戦略
//!
//! いずれもHTML文字列を受け取る純粋関数で、ブラウザなしでテストできる。
//! セレクタが外れても失敗にはせず、項目は None、カードは除外になる。

mod detail;
mod dom;
mod listing;

pub use detail::{parse_nutrition, product_detail, DETAIL_READY_SELECTOR};
pub use listing::{
    categories, first_success, search_results, NamedStrategy, Strategy,
    CATEGORY_LINK_STRATEGIES, CATEGORY_READY_SELECTOR, SEARCH_CARD_STRATEGIES,
    SEARCH_READY_SELECTOR,
};
