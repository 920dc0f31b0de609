use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;
use crate::core::{classify::Classification, detect::detect_site};
use crate::models::{Category, Retailer, ScrapedProduct};

/// Ordered selector fallbacks for one retailer
struct SiteSelectors {
    title: Vec<Selector>,
    price: Vec<Selector>,
    ingredients: Option<Selector>,
    /// Fixed category; `None` defers to the keyword classifier
    category: Option<Category>,
}

impl SiteSelectors {
    fn new(title: &[&str], price: &[&str], ingredients: Option<&str>, category: Option<Category>) -> Self {
        Self {
            title: parse_selectors(title),
            price: parse_selectors(price),
            ingredients: ingredients.and_then(|s| Selector::parse(s).ok()),
            category,
        }
    }
}

fn parse_selectors(raw: &[&str]) -> Vec<Selector> {
    raw.iter()
        .filter_map(|s| match Selector::parse(s) {
            Ok(sel) => Some(sel),
            Err(e) => {
                tracing::warn!("Skipping invalid selector {}: {:?}", s, e);
                None
            }
        })
        .collect()
}

lazy_static! {
    static ref TARGET: SiteSelectors = SiteSelectors::new(
        &[r#"[data-test="product-title"]"#, r#"h1[class*="Title"]"#, "h1"],
        &[r#"[data-test="product-price"]"#, r#"span[data-test="current-price"]"#, r#"[class*="Price"]"#],
        Some(r#"[data-test="item-details-description"]"#),
        None,
    );
    static ref UNIQLO: SiteSelectors = SiteSelectors::new(
        &[".pdp-product-name", r#"h1[class*="product"]"#],
        &[".pdp-product-price", r#"[class*="price"]"#],
        None,
        Some(Category::Clothing),
    );
    static ref HM: SiteSelectors = SiteSelectors::new(
        &["h1.ProductName", r#"h1[class*="product"]"#, "h1"],
        &[".ProductPrice", r#"[class*="price"]"#],
        None,
        Some(Category::Clothing),
    );
    static ref ZARA: SiteSelectors = SiteSelectors::new(
        &[r#"h1[class*="product-name"]"#, "h1"],
        &[r#"[class*="price__amount"]"#, r#"[class*="price"]"#],
        None,
        Some(Category::Clothing),
    );
    static ref AE: SiteSelectors = SiteSelectors::new(
        &[r#"h1[class*="product-name"]"#, "h1"],
        &[r#"[class*="product-price"]"#, r#"[class*="price"]"#],
        None,
        Some(Category::Clothing),
    );
    static ref INGREDIENTS_RE: Regex = Regex::new(r"(?i)ingredients?:?\s*([^.]+)").unwrap();
    static ref PRICE_STRIP_RE: Regex = Regex::new(r"[^0-9.]").unwrap();
    static ref LEADING_FLOAT_RE: Regex = Regex::new(r"^(\d+\.?\d*|\.\d+)").unwrap();
    static ref BODY: Selector = Selector::parse("body").unwrap();
}

fn selectors_for(retailer: Retailer) -> Option<&'static SiteSelectors> {
    match retailer {
        Retailer::Target => Some(&*TARGET),
        Retailer::Uniqlo => Some(&*UNIQLO),
        Retailer::Hm => Some(&*HM),
        Retailer::Zara => Some(&*ZARA),
        Retailer::Ae => Some(&*AE),
        Retailer::Walmart => None,
    }
}

/// A parsed page as seen by the content side
pub struct PageSnapshot {
    url: String,
    document: Html,
}

impl PageSnapshot {
    pub fn parse(url: impl Into<String>, html: &str) -> Self {
        Self {
            url: url.into(),
            document: Html::parse_document(html),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Hostname of the page URL, empty when the URL does not parse
    pub fn hostname(&self) -> String {
        Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default()
    }

    /// Visible body text, skipping script and style contents
    pub fn text(&self) -> String {
        let Some(body) = self.document.select(&BODY).next() else {
            return String::new();
        };

        let mut out = String::new();
        for node in body.descendants() {
            let Some(text) = node.value().as_text() else { continue };
            let hidden = node
                .parent()
                .and_then(|p| p.value().as_element().map(|e| e.name()))
                .map(|name| matches!(name, "script" | "style" | "noscript" | "template"))
                .unwrap_or(false);
            if hidden {
                continue;
            }
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                if !out.is_empty() {
                    out.push(' ');
                }
                out.push_str(trimmed);
            }
        }
        out
    }

    /// Trimmed text of the first element matched by the first selector that
    /// matches anything, like chained `querySelector(a) || querySelector(b)`
    fn first_text(&self, selectors: &[Selector]) -> Option<String> {
        selectors
            .iter()
            .find_map(|sel| self.document.select(sel).next())
            .map(|el| el.text().collect::<String>().trim().to_string())
    }

    fn classification(&self) -> Classification {
        Classification::score(&self.url, &self.text())
    }

    /// Gender classification of this page
    pub fn is_womens_product(&self) -> bool {
        self.classification().is_womens()
    }

    pub fn detect_category(&self) -> Category {
        self.classification().category()
    }
}

/// Parse a price string the way the storefront text reads
///
/// Everything but digits and dots is stripped, then the leading decimal
/// number is taken. Returns `None` when nothing parses or the price is zero.
pub fn parse_price(text: &str) -> Option<f64> {
    let stripped = PRICE_STRIP_RE.replace_all(text, "");
    let number = LEADING_FLOAT_RE.find(&stripped)?;
    let price: f64 = number.as_str().parse().ok()?;

    if price > 0.0 && price.is_finite() {
        Some(price)
    } else {
        None
    }
}

/// Pull a comma separated ingredient list out of a description block
pub fn parse_ingredients(text: &str) -> Vec<String> {
    INGREDIENTS_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|list| {
            list.as_str()
                .split(',')
                .map(|i| i.trim().to_string())
                .filter(|i| !i.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Scrape one retailer page; `None` unless both title and price are found
pub fn scrape_site(retailer: Retailer, page: &PageSnapshot) -> Option<ScrapedProduct> {
    let Some(selectors) = selectors_for(retailer) else {
        tracing::debug!("No scraper for {}", retailer);
        return None;
    };

    let title = page.first_text(&selectors.title).unwrap_or_default();
    let price = page
        .first_text(&selectors.price)
        .and_then(|text| parse_price(&text));

    let Some(price) = price.filter(|_| !title.is_empty()) else {
        tracing::debug!("{} scraper: title or price missing on {}", retailer, page.url());
        return None;
    };

    let ingredients = selectors
        .ingredients
        .as_ref()
        .and_then(|sel| page.document.select(sel).next())
        .map(|el| parse_ingredients(&el.text().collect::<String>()))
        .filter(|list| !list.is_empty());

    let category = selectors
        .category
        .unwrap_or_else(|| page.detect_category());

    Some(ScrapedProduct {
        title,
        price,
        category,
        ingredients,
        brand: None,
        retailer,
        url: page.url().to_string(),
    })
}

/// Detect the retailer from the page URL and run its scraper
pub fn scrape_product(page: &PageSnapshot) -> Option<ScrapedProduct> {
    let Some(retailer) = detect_site(&page.hostname()) else {
        tracing::debug!("Unsupported site: {}", page.url());
        return None;
    };

    tracing::debug!("Scraping {}...", retailer);
    scrape_site(retailer, page)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(url: &str, body: &str) -> PageSnapshot {
        PageSnapshot::parse(url, &format!("<html><body>{}</body></html>", body))
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("$12.99"), Some(12.99));
        assert_eq!(parse_price("USD 1,299.00"), Some(1299.0));
        assert_eq!(parse_price("Sale: $9.50 "), Some(9.5));
        assert_eq!(parse_price("$0.00"), None);
        assert_eq!(parse_price("Free"), None);
        assert_eq!(parse_price(""), None);
    }

    #[test]
    fn test_parse_ingredients() {
        let list = parse_ingredients("Ingredients: Water, Glycerin , Aloe. Keep dry.");
        assert_eq!(list, vec!["Water", "Glycerin", "Aloe"]);
        assert!(parse_ingredients("No list here").is_empty());
    }

    #[test]
    fn test_target_scrape() {
        let p = page(
            "https://www.target.com/p/venus-razor/-/A-1",
            r#"<h1 data-test="product-title"> Venus Smooth Razor </h1>
               <span data-test="product-price">$12.99</span>
               <div data-test="item-details-description">Ingredients: steel, aloe strip.</div>
               <p>Razor with 5 blade cartridge</p>"#,
        );
        let product = scrape_product(&p).unwrap();
        assert_eq!(product.title, "Venus Smooth Razor");
        assert_eq!(product.price, 12.99);
        assert_eq!(product.retailer, Retailer::Target);
        assert_eq!(product.category, Category::PersonalCare);
        assert_eq!(product.ingredients, Some(vec!["steel".to_string(), "aloe strip".to_string()]));
    }

    #[test]
    fn test_selector_fallback() {
        let p = page(
            "https://www2.hm.com/en_us/productpage.1.html",
            r#"<h1>Relaxed Hoodie</h1><div class="product-price">$24.99</div>"#,
        );
        let product = scrape_product(&p).unwrap();
        assert_eq!(product.title, "Relaxed Hoodie");
        assert_eq!(product.price, 24.99);
        assert_eq!(product.category, Category::Clothing);
        assert!(product.ingredients.is_none());
    }

    #[test]
    fn test_missing_price_is_none() {
        let p = page("https://www.zara.com/us/en/item.html", "<h1>Oversized Blazer</h1>");
        assert!(scrape_product(&p).is_none());
    }

    #[test]
    fn test_no_matching_selectors_is_none() {
        let p = page("https://www.uniqlo.com/us/en/products/E1", "<div>nothing here</div>");
        assert!(scrape_product(&p).is_none());
    }

    #[test]
    fn test_walmart_and_unsupported_are_none() {
        let p = page("https://www.walmart.com/ip/1", "<h1>Razor</h1><span class=\"price\">$5</span>");
        assert!(scrape_product(&p).is_none());
        let p = page("https://example.org/", "<h1>Razor</h1><span class=\"price\">$5</span>");
        assert!(scrape_product(&p).is_none());
    }

    #[test]
    fn test_text_skips_scripts() {
        let p = page("https://www.target.com/", "<p>for her</p><script>var mens = 1;</script>");
        assert_eq!(p.text(), "for her");
        assert!(p.is_womens_product());
    }

    #[test]
    fn test_hostname() {
        assert_eq!(page("https://www2.hm.com/a", "").hostname(), "www2.hm.com");
        assert_eq!(page("not a url", "").hostname(), "");
    }
}
