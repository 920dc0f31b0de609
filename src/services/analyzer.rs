use reqwest::Client;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use crate::core::{detect_site, Overlay, PageSnapshot};
use crate::core::scrape::scrape_site;
use crate::models::{Category, PageMessage, Retailer, ScrapedProduct};
use crate::services::api_client::MatchApiClient;
use crate::services::preferences::Preferences;

pub const MISSING_MEASUREMENTS_MESSAGE: &str =
    "Please set your measurements in the extension options to get size recommendations.";
pub const CONNECT_ERROR_MESSAGE: &str = "Could not connect to PinkVanity. Please try again later.";

/// Errors that can occur before analysis starts
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("Page fetch failed: {0}")]
    FetchError(#[from] reqwest::Error),

    #[error("Page fetch returned {0}")]
    FetchStatus(u16),
}

/// Where page analysis stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisOutcome {
    Disabled,
    UnsupportedSite,
    NotWomensProduct,
    ScrapeFailed,
    MissingMeasurements,
    ProductMatched { found: bool },
    ClothingMatched { found: bool },
    ApiFailed,
}

impl AnalysisOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisOutcome::Disabled => "disabled",
            AnalysisOutcome::UnsupportedSite => "unsupported_site",
            AnalysisOutcome::NotWomensProduct => "not_womens_product",
            AnalysisOutcome::ScrapeFailed => "scrape_failed",
            AnalysisOutcome::MissingMeasurements => "missing_measurements",
            AnalysisOutcome::ProductMatched { found: true } => "product_match",
            AnalysisOutcome::ProductMatched { found: false } => "product_no_match",
            AnalysisOutcome::ClothingMatched { found: true } => "clothing_match",
            AnalysisOutcome::ClothingMatched { found: false } => "clothing_no_match",
            AnalysisOutcome::ApiFailed => "api_failed",
        }
    }
}

impl fmt::Display for AnalysisOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the pipeline needs from a page, extracted up front
///
/// The parsed DOM is dropped before any network call.
#[derive(Debug, Clone)]
pub struct PageFacts {
    pub url: String,
    pub retailer: Option<Retailer>,
    pub is_womens: bool,
    pub product: Option<ScrapedProduct>,
}

impl PageFacts {
    pub fn extract(url: &str, html: &str) -> Self {
        let page = PageSnapshot::parse(url, html);
        let retailer = detect_site(&page.hostname());

        let (is_womens, product) = match retailer {
            Some(retailer) => (page.is_womens_product(), scrape_site(retailer, &page)),
            None => (false, None),
        };

        Self {
            url: url.to_string(),
            retailer,
            is_womens,
            product,
        }
    }
}

/// Content-side pipeline: detect, classify, scrape, match, render
pub struct PageAnalyzer {
    preferences: Preferences,
    api: Arc<MatchApiClient>,
    overlay: Arc<Mutex<Overlay>>,
    http: Client,
}

impl PageAnalyzer {
    pub fn new(preferences: Preferences, api: Arc<MatchApiClient>, overlay: Arc<Mutex<Overlay>>) -> Self {
        Self {
            preferences,
            api,
            overlay,
            http: Client::new(),
        }
    }

    pub fn overlay(&self) -> &Arc<Mutex<Overlay>> {
        &self.overlay
    }

    /// Analyze a page message, fetching the HTML when it was not sent
    pub async fn analyze_message(&self, msg: &PageMessage) -> Result<AnalysisOutcome, AnalyzeError> {
        let html = self.resolve_html(msg).await?;
        let facts = PageFacts::extract(&msg.url, &html);
        Ok(self.analyze(facts).await)
    }

    /// Scrape a page without matching (`GET_PRODUCT_INFO`)
    pub async fn product_info(&self, msg: &PageMessage) -> Result<Option<ScrapedProduct>, AnalyzeError> {
        let html = self.resolve_html(msg).await?;
        Ok(PageFacts::extract(&msg.url, &html).product)
    }

    async fn resolve_html(&self, msg: &PageMessage) -> Result<String, AnalyzeError> {
        if let Some(html) = &msg.html {
            return Ok(html.clone());
        }

        tracing::debug!("Fetching page {}", msg.url);
        let response = self.http.get(&msg.url).send().await?;
        if !response.status().is_success() {
            return Err(AnalyzeError::FetchStatus(response.status().as_u16()));
        }
        Ok(response.text().await?)
    }

    pub async fn analyze(&self, facts: PageFacts) -> AnalysisOutcome {
        if !self.preferences.is_enabled().await {
            tracing::info!("Extension disabled");
            return AnalysisOutcome::Disabled;
        }

        let Some(retailer) = facts.retailer else {
            tracing::info!("Unsupported site: {}", facts.url);
            return AnalysisOutcome::UnsupportedSite;
        };

        if !facts.is_womens {
            tracing::info!("Not a women's product page on {}", retailer);
            self.overlay.lock().await.hide();
            return AnalysisOutcome::NotWomensProduct;
        }

        tracing::info!("Women's product detected on {}", retailer);

        let Some(product) = facts.product else {
            tracing::info!("Could not scrape product info from {}", facts.url);
            return AnalysisOutcome::ScrapeFailed;
        };

        tracing::debug!("Scraped product: {:?}", product);
        self.overlay.lock().await.show_loading();

        match product.category {
            Category::Clothing => self.match_clothing(&product).await,
            Category::PersonalCare => self.match_product(product).await,
        }
    }

    async fn match_clothing(&self, product: &ScrapedProduct) -> AnalysisOutcome {
        let Some(measurements) = self.preferences.get_measurements().await else {
            self.overlay.lock().await.show_error(MISSING_MEASUREMENTS_MESSAGE);
            return AnalysisOutcome::MissingMeasurements;
        };

        match self.api.find_clothing_match(&product.title, &measurements).await {
            Ok(result) => {
                let found = result.found_match;
                self.overlay.lock().await.show_clothing_match(result);
                AnalysisOutcome::ClothingMatched { found }
            }
            Err(e) => self.api_failed(e).await,
        }
    }

    async fn match_product(&self, product: ScrapedProduct) -> AnalysisOutcome {
        let result = self
            .api
            .find_product_match(&product.title, product.price, product.category, product.ingredients)
            .await;

        match result {
            Ok(result) => {
                let found = result.found_match;
                self.overlay.lock().await.show_product_match(result);
                AnalysisOutcome::ProductMatched { found }
            }
            Err(e) => self.api_failed(e).await,
        }
    }

    async fn api_failed(&self, e: impl fmt::Display) -> AnalysisOutcome {
        tracing::error!("Matching API error: {}", e);
        self.overlay.lock().await.show_error(CONNECT_ERROR_MESSAGE);
        AnalysisOutcome::ApiFailed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facts_unsupported_site() {
        let facts = PageFacts::extract("https://example.org/women", "<h1>Dress</h1>");
        assert_eq!(facts.retailer, None);
        assert!(!facts.is_womens);
        assert!(facts.product.is_none());
    }

    #[test]
    fn test_facts_scraped() {
        let facts = PageFacts::extract(
            "https://www.zara.com/us/en/woman/blazer.html",
            r#"<html><body><h1 class="product-name">Blazer</h1><span class="price__amount">$89.90</span><p>Women's jacket for her</p></body></html>"#,
        );
        assert_eq!(facts.retailer, Some(Retailer::Zara));
        assert!(facts.is_womens);
        let product = facts.product.unwrap();
        assert_eq!(product.price, 89.9);
        assert_eq!(product.category, Category::Clothing);
    }

    #[test]
    fn test_outcome_names() {
        assert_eq!(AnalysisOutcome::ProductMatched { found: false }.to_string(), "product_no_match");
        assert_eq!(AnalysisOutcome::MissingMeasurements.as_str(), "missing_measurements");
    }
}
