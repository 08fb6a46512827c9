use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("browser initialization failed: {0}")]
    BrowserInit(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("javascript evaluation failed: {0}")]
    JavaScript(String),

    #[error("page error: {0}")]
    Page(String),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("failed to search products: {0}")]
    Search(#[source] Box<ScraperError>),

    #[error("failed to get product details: {0}")]
    ProductDetails(#[source] Box<ScraperError>),

    #[error("failed to get categories: {0}")]
    Categories(#[source] Box<ScraperError>),
}

impl ScraperError {
    /// 検索処理の失敗としてラップ
    pub fn search(cause: ScraperError) -> Self {
        Self::Search(Box::new(cause))
    }

    /// 商品詳細取得の失敗としてラップ
    pub fn product_details(cause: ScraperError) -> Self {
        Self::ProductDetails(Box::new(cause))
    }

    /// カテゴリ取得の失敗としてラップ
    pub fn categories(cause: ScraperError) -> Self {
        Self::Categories(Box::new(cause))
    }

    /// タイムアウト起因かどうか
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Search(inner) | Self::ProductDetails(inner) | Self::Categories(inner) => {
                inner.is_timeout()
            }
            _ => false,
        }
    }
}
