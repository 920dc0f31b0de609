//! PinkVanity - pink-tax companion service
//!
//! Detects women-marketed product pages on supported retailers, scrapes the
//! product with per-site selector fallbacks, asks the matching API for a
//! cheaper men's-marketed equivalent (or a size recommendation for
//! clothing), and keeps a local savings ledger.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{detect_site, is_womens_product, scrape_product, Overlay, PageSnapshot, Widget};
pub use models::{Category, Message, MessageResponse, Retailer, ScrapedProduct};
pub use services::{MessageRouter, PageAnalyzer, SavingsLedger, Storage};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let page = PageSnapshot::parse("https://www.target.com/p/venus-razor", "<h1>Venus Razor for Women</h1>");
        assert_eq!(detect_site(&page.hostname()), Some(Retailer::Target));
        assert!(is_womens_product(page.url(), &page.text()));
    }
}
