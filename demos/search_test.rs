//! AH スクレイパーテスト
//!
//! 実行方法:
//! ```
//! cargo run --example search_test -- melk
//! AH_HEADLESS=false AH_DEBUG=true cargo run --example search_test -- kaas
//! ```

use ah_scraper::{AhScraper, ScraperConfig, ScraperError};
use tracing_subscriber::EnvFilter;

async fn run(scraper: &AhScraper, query: &str) -> Result<(), ScraperError> {
    println!("Searching '{}'...", query);
    let products = scraper.search_products(query, 5).await?;

    println!();
    println!("=== Products ===");
    for (i, product) in products.iter().enumerate() {
        println!(
            "{}. {} - {} ({})",
            i + 1,
            product.name,
            product.price.as_deref().unwrap_or("-"),
            product.url
        );
    }

    if let Some(first) = products.first() {
        println!();
        println!("=== Detail: {} ===", first.id);
        let detail = scraper.get_product_details(&first.id).await?;
        println!("{}", serde_json::to_string_pretty(&detail).unwrap_or_default());
    }

    println!();
    println!("=== Categories ===");
    let categories = scraper.get_categories().await?;
    for category in categories.iter().take(10) {
        println!("- {} ({})", category.name, category.url);
    }

    // 2回目はキャッシュから返る
    let cached = scraper.search_products(query, 5).await?;
    println!();
    println!(
        "Cached search: {} products, cache size: {}",
        cached.len(),
        scraper.cache_size()
    );

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ログ設定
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let query = std::env::args().nth(1).unwrap_or_else(|| "melk".to_string());
    let config = ScraperConfig::from_env();

    println!("=== AH Scraper Test ===");
    println!("Base URL: {}", config.base_url);
    println!("Headless: {}", config.headless);
    println!();

    let scraper = AhScraper::new(config);

    // Ctrl+C でもブラウザを閉じてから終了する。
    // 中断された操作のページは閉じられないが、直後の close() でブラウザごと破棄される
    let result = tokio::select! {
        result = run(&scraper, &query) => result,
        _ = tokio::signal::ctrl_c() => {
            println!("Interrupted");
            Ok(())
        }
    };

    scraper.close().await?;
    result?;

    println!();
    println!("=== Test Complete ===");
    Ok(())
}
