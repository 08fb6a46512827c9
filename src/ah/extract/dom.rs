//! scraper（HTMLパーサ）上の小さなDOMヘルパー

use scraper::{ElementRef, Html, Selector};
use tracing::warn;
use url::Url;

pub(crate) fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            warn!("Invalid selector '{}': {:?}", css, e);
            None
        }
    }
}

/// ドキュメント全体から一致要素を文書順に取得
pub(crate) fn select_all<'a>(doc: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match selector(css) {
        Some(selector) => doc.select(&selector).collect(),
        None => Vec::new(),
    }
}

/// scope の子孫から一致要素を文書順に取得
pub(crate) fn select_within<'a>(scope: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match selector(css) {
        Some(selector) => scope.select(&selector).collect(),
        None => Vec::new(),
    }
}

/// 優先順のセレクタリストで最初に一致した要素
pub(crate) fn first_match<'a>(scope: ElementRef<'a>, selectors: &[&str]) -> Option<ElementRef<'a>> {
    selectors.iter().find_map(|css| {
        let selector = selector(css)?;
        scope.select(&selector).next()
    })
}

/// 優先順のセレクタリストで、空でないテキストを持つ最初の要素のテキスト
pub(crate) fn first_text(scope: ElementRef<'_>, selectors: &[&str]) -> Option<String> {
    selectors.iter().find_map(|css| {
        let selector = selector(css)?;
        scope.select(&selector).find_map(non_empty_text)
    })
}

/// 要素のテキスト（空白は1つに畳む）
pub(crate) fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn non_empty_text(element: ElementRef<'_>) -> Option<String> {
    let text = text_of(element);
    (!text.is_empty()).then_some(text)
}

/// 相対URLをページURL基準で絶対URLにする
pub(crate) fn resolve(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    base.join(href).ok().map(String::from)
}

/// 画像URL（遅延読み込みの data-src も見る）
pub(crate) fn image_src(img: ElementRef<'_>, base: &Url) -> Option<String> {
    let value = img.value();
    value
        .attr("src")
        .filter(|src| !src.trim().is_empty())
        .or_else(|| value.attr("data-src"))
        .and_then(|src| resolve(base, src))
}

/// 自身または最も近い祖先のうち、タグ名が names のいずれかの要素
pub(crate) fn closest<'a>(element: ElementRef<'a>, names: &[&str]) -> Option<ElementRef<'a>> {
    if names.contains(&element.value().name()) {
        return Some(element);
    }
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| names.contains(&ancestor.value().name()))
}

/// URL末尾の空でないパスセグメント
pub(crate) fn trailing_segment(url: &str) -> String {
    if let Ok(parsed) = Url::parse(url) {
        if let Some(segment) = parsed
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        {
            return segment.to_string();
        }
    }
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}
