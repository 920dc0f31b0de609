use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Product category used by the matching API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[default]
    PersonalCare,
    Clothing,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::PersonalCare => "personal_care",
            Category::Clothing => "clothing",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Retailers recognised by the overlay pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Retailer {
    Target,
    Uniqlo,
    Hm,
    Zara,
    Ae,
    Walmart,
}

impl Retailer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Retailer::Target => "target",
            Retailer::Uniqlo => "uniqlo",
            Retailer::Hm => "hm",
            Retailer::Zara => "zara",
            Retailer::Ae => "ae",
            Retailer::Walmart => "walmart",
        }
    }
}

impl fmt::Display for Retailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sites the draggable widget mounts on (exact host match)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WidgetSite {
    AmericanEagle,
    Zara,
    Hm,
}

impl WidgetSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetSite::AmericanEagle => "american-eagle",
            WidgetSite::Zara => "zara",
            WidgetSite::Hm => "hm",
        }
    }
}

impl fmt::Display for WidgetSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Product information scraped from a retailer page.
///
/// Rebuilt on every page visit and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedProduct {
    pub title: String,
    pub price: f64,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    pub retailer: Retailer,
    pub url: String,
}

/// Body measurements entered on the options page (inches)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UserMeasurements {
    pub waist_inches: f64,
    pub hip_inches: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chest_inches: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_inches: Option<f64>,
}

/// Fit preference chosen in the widget settings form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitPreference {
    Fitted,
    #[default]
    Regular,
    Relaxed,
}

impl FitPreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            FitPreference::Fitted => "fitted",
            FitPreference::Regular => "regular",
            FitPreference::Relaxed => "relaxed",
        }
    }
}

impl fmt::Display for FitPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Widget measurements (inches); every field is optional
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Measurements {
    #[serde(rename = "bustIn", default, skip_serializing_if = "Option::is_none")]
    pub bust_in: Option<f64>,
    #[serde(rename = "waistIn", default, skip_serializing_if = "Option::is_none")]
    pub waist_in: Option<f64>,
    #[serde(rename = "hipsIn", default, skip_serializing_if = "Option::is_none")]
    pub hips_in: Option<f64>,
}

impl Measurements {
    pub fn is_empty(&self) -> bool {
        self.bust_in.is_none() && self.waist_in.is_none() && self.hips_in.is_none()
    }
}

/// Settings persisted by the widget variant
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct UserSettings {
    #[serde(default)]
    pub measurements: Measurements,
    #[serde(rename = "fitPreference", default)]
    pub fit_preference: FitPreference,
}

/// Widget pixel position, saved when a drag ends
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WidgetPosition {
    pub left: f64,
    pub top: f64,
}

/// One recorded swap in the local savings ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub amount: f64,
    pub category: String,
    pub product: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

/// Canned demo responses served by the matching API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoKind {
    Razor,
    ShaveGel,
    Hoodie,
}

impl DemoKind {
    pub fn as_path(&self) -> &'static str {
        match self {
            DemoKind::Razor => "razor",
            DemoKind::ShaveGel => "shave-gel",
            DemoKind::Hoodie => "hoodie",
        }
    }
}

impl FromStr for DemoKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "razor" => Ok(DemoKind::Razor),
            "shave-gel" => Ok(DemoKind::ShaveGel),
            "hoodie" => Ok(DemoKind::Hoodie),
            other => Err(format!("unknown demo kind: {}", other)),
        }
    }
}
