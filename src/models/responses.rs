use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use crate::models::domain::{ScrapedProduct, Transaction};

/// A matched men's product equivalent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductMatch {
    pub title: String,
    pub price: f64,
    pub savings_amount: f64,
    pub savings_percent: f64,
    pub similarity_score: f64,
    #[serde(default)]
    pub match_reasons: Vec<String>,
    #[serde(default)]
    pub product_url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Response of the quick and full product match endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResponse {
    pub found_match: bool,
    pub original_product: String,
    pub original_price: f64,
    #[serde(default, rename = "match")]
    pub product_match: Option<ProductMatch>,
    #[serde(default)]
    pub message: String,
}

/// Men's clothing equivalent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MensEquivalent {
    pub title: String,
    pub price: f64,
    pub savings_amount: f64,
    pub savings_percent: f64,
}

/// Size recommendation attached to a clothing match
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClothingSizeRecommendation {
    pub size: String,
    #[serde(default)]
    pub fit_notes: Vec<String>,
    #[serde(default)]
    pub measurements: BTreeMap<String, BTreeMap<String, Value>>,
}

/// Response of `POST /api/v1/clothing/match`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClothingMatchResponse {
    pub found_match: bool,
    pub original_product: String,
    pub original_price: f64,
    #[serde(default)]
    pub mens_equivalent: Option<MensEquivalent>,
    #[serde(default)]
    pub size_recommendation: Option<ClothingSizeRecommendation>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub amount: f64,
}

/// Server-side lifetime savings statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsStats {
    pub total_saved: f64,
    pub total_transactions: u64,
    pub avg_savings_percent: f64,
    #[serde(default)]
    pub top_categories: Vec<CategoryTotal>,
}

/// Health report of the remote matching API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiHealth {
    #[serde(default)]
    pub status: Option<String>,
    pub womens_products_loaded: u64,
    #[serde(default)]
    pub mens_products_loaded: Option<u64>,
    #[serde(default)]
    pub golden_pairs_loaded: Option<u64>,
}

/// Health check response of the companion service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Local savings ledger snapshot (`GET_STATS`)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LocalStats {
    #[serde(rename = "totalSaved")]
    pub total_saved: f64,
    pub transactions: Vec<Transaction>,
}

impl LocalStats {
    /// The last `n` transactions, newest first
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter().rev().take(n)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSavingsResponse {
    pub success: bool,
    #[serde(rename = "totalSaved")]
    pub total_saved: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserIdResponse {
    #[serde(rename = "userId")]
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub outcome: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductInfoResponse {
    pub product: Option<ScrapedProduct>,
}

/// Reply to a routed message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageResponse {
    RecordSavings(RecordSavingsResponse),
    Stats(LocalStats),
    UserId(UserIdResponse),
    Analyze(AnalyzeResponse),
    ProductInfo(ProductInfoResponse),
}

/// Recent swap line on the popup dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentSwap {
    pub product: String,
    pub amount: String,
}

/// Popup dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub total_saved: String,
    pub transaction_count: String,
    pub recent: Vec<RecentSwap>,
    pub api_connected: bool,
}

/// Overlay state polled by the page shim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayResponse {
    pub visible: bool,
    pub state: Option<String>,
    pub can_swap: bool,
    pub html: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeResponse {
    pub text: String,
    pub color: String,
}

/// Result of the options page "Test connection" button
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionTestResponse {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub womens_products_loaded: Option<u64>,
    pub message: String,
}

impl ConnectionTestResponse {
    pub fn connected(health: &ApiHealth) -> Self {
        Self {
            connected: true,
            womens_products_loaded: Some(health.womens_products_loaded),
            message: format!("Connected! {} products loaded.", health.womens_products_loaded),
        }
    }

    pub fn failed(message: &str) -> Self {
        Self {
            connected: false,
            womens_products_loaded: None,
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_response_parses_backend_shape() {
        let json = r#"{
            "found_match": true,
            "original_product": "Venus Razor",
            "original_price": 12.99,
            "match": {
                "title": "Gillette Mach3",
                "price": 8.99,
                "savings_amount": 4.0,
                "savings_percent": 30.8,
                "similarity_score": 0.92,
                "match_reasons": ["Same blade count"]
            },
            "message": "Found a cheaper equivalent"
        }"#;
        let resp: MatchResponse = serde_json::from_str(json).unwrap();
        let m = resp.product_match.unwrap();
        assert_eq!(m.title, "Gillette Mach3");
        assert_eq!(m.product_url, None);
    }

    #[test]
    fn test_clothing_response_without_match() {
        let json = r#"{"found_match": false, "original_product": "Hoodie", "original_price": 0}"#;
        let resp: ClothingMatchResponse = serde_json::from_str(json).unwrap();
        assert!(!resp.found_match);
        assert!(resp.mens_equivalent.is_none());
    }

    #[test]
    fn test_connection_message_counts_products() {
        let health: ApiHealth = serde_json::from_str(r#"{"status": "healthy", "womens_products_loaded": 42}"#).unwrap();
        let resp = ConnectionTestResponse::connected(&health);
        assert_eq!(resp.message, "Connected! 42 products loaded.");
        assert_eq!(resp.womens_products_loaded, Some(42));
    }

    #[test]
    fn test_message_response_is_untagged() {
        let resp = MessageResponse::UserId(UserIdResponse { user_id: "pv_abc".into() });
        assert_eq!(serde_json::to_string(&resp).unwrap(), r#"{"userId":"pv_abc"}"#);
    }

    #[test]
    fn test_recent_is_newest_first() {
        let stats = LocalStats {
            total_saved: 6.0,
            transactions: (1..=3)
                .map(|i| Transaction {
                    amount: i as f64,
                    category: "clothing".into(),
                    product: format!("item {}", i),
                    timestamp: i,
                })
                .collect(),
        };
        let recent: Vec<_> = stats.recent(2).map(|t| t.product.as_str()).collect();
        assert_eq!(recent, vec!["item 3", "item 2"]);
    }
}
