// Service exports
pub mod analyzer;
pub mod api_client;
pub mod debounce;
pub mod ledger;
pub mod preferences;
pub mod router;
pub mod storage;

pub use analyzer::{AnalysisOutcome, AnalyzeError, PageAnalyzer, PageFacts};
pub use api_client::{ApiError, MatchApiClient};
pub use debounce::Debouncer;
pub use ledger::{badge_text, LedgerError, SavingsLedger, BADGE_COLOR};
pub use preferences::Preferences;
pub use router::{MessageRouter, RouterError};
pub use storage::{Storage, StorageArea, StorageError};
