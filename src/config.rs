use std::time::Duration;

use url::Url;

use crate::error::ScraperError;

/// デフォルトの対象サイト
pub const DEFAULT_BASE_URL: &str = "https://www.ah.nl";

/// 実ブラウザに見せかけるUser-Agent
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// ページごとに付与する追加ヘッダー
pub const DEFAULT_EXTRA_HEADERS: &[(&str, &str)] = &[
    ("Accept-Language", "nl-NL,nl;q=0.9,en-US;q=0.8,en;q=0.7"),
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
    ),
    ("Accept-Encoding", "gzip, deflate, br"),
    ("Connection", "keep-alive"),
    ("Upgrade-Insecure-Requests", "1"),
];

/// ブラウザ起動フラグ
pub const DEFAULT_LAUNCH_ARGS: &[&str] = &[
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-accelerated-2d-canvas",
    "--disable-gpu",
    "--disable-blink-features=AutomationControlled",
];

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub base_url: String,
    pub headless: bool,
    pub chrome_path: Option<String>,
    pub user_agent: String,
    pub extra_headers: Vec<(String, String)>,
    pub launch_args: Vec<String>,
    pub cache_ttl: Duration,
    pub min_request_interval: Duration,
    pub navigation_timeout: Duration,
    pub search_settle: Duration,
    pub detail_settle: Duration,
    pub selector_timeout: Duration,
    pub debug: bool,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            headless: true,
            chrome_path: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            extra_headers: DEFAULT_EXTRA_HEADERS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            launch_args: DEFAULT_LAUNCH_ARGS.iter().map(|a| a.to_string()).collect(),
            cache_ttl: Duration::from_millis(3_600_000),
            min_request_interval: Duration::from_millis(1000),
            navigation_timeout: Duration::from_secs(30),
            search_settle: Duration::from_secs(3),
            detail_settle: Duration::from_secs(2),
            selector_timeout: Duration::from_secs(5),
            debug: false,
        }
    }
}

impl ScraperConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// 環境変数から設定を読み込む（未設定の項目はデフォルト値）
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(base_url) = std::env::var("AH_BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(headless) = std::env::var("AH_HEADLESS") {
            config.headless = parse_flag(&headless).unwrap_or(config.headless);
        }
        if let Ok(debug) = std::env::var("AH_DEBUG") {
            config.debug = parse_flag(&debug).unwrap_or(config.debug);
        }
        config.chrome_path = std::env::var("CHROME_PATH")
            .or_else(|_| std::env::var("CHROMIUM_PATH"))
            .ok();

        config
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_chrome_path(mut self, path: impl Into<String>) -> Self {
        self.chrome_path = Some(path.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_min_request_interval(mut self, interval: Duration) -> Self {
        self.min_request_interval = interval;
        self
    }

    pub fn with_navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    pub fn with_settle_delays(mut self, search: Duration, detail: Duration) -> Self {
        self.search_settle = search;
        self.detail_settle = detail;
        self
    }

    pub fn with_selector_timeout(mut self, timeout: Duration) -> Self {
        self.selector_timeout = timeout;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn base(&self) -> Result<Url, ScraperError> {
        Ok(Url::parse(&self.base_url)?)
    }

    /// 検索ページURL: `<base>/zoeken?query=<q>`
    pub fn search_url(&self, query: &str) -> Result<Url, ScraperError> {
        let mut url = self.base()?.join("/zoeken")?;
        url.query_pairs_mut().append_pair("query", query);
        Ok(url)
    }

    /// 商品詳細ページURL: `<base>/producten/product/<id>`
    pub fn product_url(&self, product_id: &str) -> Result<Url, ScraperError> {
        let mut url = self.base()?;
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .clear()
            .extend(["producten", "product", product_id]);
        Ok(url)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
