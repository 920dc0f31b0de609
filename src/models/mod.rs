// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{Category, Retailer, WidgetSite, ScrapedProduct, UserMeasurements, FitPreference, Measurements, UserSettings, WidgetPosition, Transaction, DemoKind};
pub use requests::{ProductMatchRequest, Message, RecordSavingsMessage, PageMessage, OptionsForm, ConnectionTestRequest};
pub use responses::{
    ProductMatch, MatchResponse, MensEquivalent, ClothingSizeRecommendation, ClothingMatchResponse,
    CategoryTotal, SavingsStats, ApiHealth, HealthResponse, ErrorResponse, LocalStats,
    RecordSavingsResponse, UserIdResponse, AnalyzeResponse, ProductInfoResponse, MessageResponse,
    RecentSwap, DashboardResponse, OverlayResponse, BadgeResponse,
    ConnectionTestResponse,
};
