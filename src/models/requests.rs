use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::models::domain::{Category, UserMeasurements};

/// Body of `POST /api/v1/match`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductMatchRequest {
    pub title: String,
    pub price: f64,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<Vec<String>>,
}

/// Cross-scope message, tagged by `type` like the extension's runtime messages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    RecordSavings(RecordSavingsMessage),
    GetStats,
    GetUserId,
    AnalyzePage(PageMessage),
    GetProductInfo(PageMessage),
}

impl Message {
    pub fn kind(&self) -> &'static str {
        match self {
            Message::RecordSavings(_) => "RECORD_SAVINGS",
            Message::GetStats => "GET_STATS",
            Message::GetUserId => "GET_USER_ID",
            Message::AnalyzePage(_) => "ANALYZE_PAGE",
            Message::GetProductInfo(_) => "GET_PRODUCT_INFO",
        }
    }
}

/// Payload of `RECORD_SAVINGS`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecordSavingsMessage {
    #[validate(range(exclusive_min = 0.0))]
    pub amount: f64,
    #[serde(default = "default_savings_category")]
    pub category: String,
    #[validate(length(min = 1))]
    pub product: String,
}

fn default_savings_category() -> String {
    Category::PersonalCare.as_str().to_string()
}

/// Page snapshot sent by the browser shim
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PageMessage {
    #[validate(url)]
    pub url: String,
    /// Serialized DOM; fetched from `url` when absent
    #[serde(default)]
    pub html: Option<String>,
}

/// Options page form (synced preferences)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OptionsForm {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(rename = "apiUrl", default)]
    #[validate(url)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub measurements: Option<UserMeasurements>,
}

fn default_true() -> bool { true }

impl OptionsForm {
    /// Trim `apiUrl` and drop it when blank, so saving falls back to the default
    pub fn normalized(mut self) -> Self {
        self.api_url = self
            .api_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        self
    }
}

/// Body of the options page "Test connection" request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ConnectionTestRequest {
    /// URL typed into the form, not necessarily saved yet
    #[serde(rename = "apiUrl", default)]
    #[validate(url)]
    pub api_url: Option<String>,
}
