use std::sync::Arc;
use thiserror::Error;
use validator::Validate;
use crate::models::{
    AnalyzeResponse, Message, MessageResponse, ProductInfoResponse, RecordSavingsMessage,
    RecordSavingsResponse, UserIdResponse,
};
use crate::services::analyzer::{AnalyzeError, PageAnalyzer};
use crate::services::api_client::MatchApiClient;
use crate::services::ledger::{badge_text, LedgerError, SavingsLedger};
use crate::services::preferences::Preferences;
use crate::services::storage::StorageError;

/// Errors that can occur while handling a message
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Analyze(#[from] AnalyzeError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Background-side dispatcher for cross-scope messages
#[derive(Clone)]
pub struct MessageRouter {
    ledger: SavingsLedger,
    preferences: Preferences,
    analyzer: Arc<PageAnalyzer>,
    api: Arc<MatchApiClient>,
    sync_remote_savings: bool,
}

impl MessageRouter {
    pub fn new(
        ledger: SavingsLedger,
        preferences: Preferences,
        analyzer: Arc<PageAnalyzer>,
        api: Arc<MatchApiClient>,
    ) -> Self {
        Self {
            ledger,
            preferences,
            analyzer,
            api,
            sync_remote_savings: true,
        }
    }

    /// Also report each saving to the matching API (on by default)
    pub fn with_remote_savings(mut self, enabled: bool) -> Self {
        self.sync_remote_savings = enabled;
        self
    }

    pub fn ledger(&self) -> &SavingsLedger {
        &self.ledger
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn analyzer(&self) -> &Arc<PageAnalyzer> {
        &self.analyzer
    }

    pub fn api(&self) -> &Arc<MatchApiClient> {
        &self.api
    }

    pub async fn handle(&self, msg: Message) -> Result<MessageResponse, RouterError> {
        tracing::debug!("Routing {} message", msg.kind());

        match msg {
            Message::RecordSavings(record) => self.record_savings(record).await,
            Message::GetStats => Ok(MessageResponse::Stats(self.ledger.stats().await?)),
            Message::GetUserId => {
                let user_id = self.preferences.get_or_create_user_id().await?;
                Ok(MessageResponse::UserId(UserIdResponse { user_id }))
            }
            Message::AnalyzePage(page) => {
                validated(&page)?;
                let outcome = self.analyzer.analyze_message(&page).await?;
                Ok(MessageResponse::Analyze(AnalyzeResponse {
                    success: true,
                    outcome: outcome.to_string(),
                }))
            }
            Message::GetProductInfo(page) => {
                validated(&page)?;
                let product = self.analyzer.product_info(&page).await?;
                Ok(MessageResponse::ProductInfo(ProductInfoResponse { product }))
            }
        }
    }

    async fn record_savings(&self, record: RecordSavingsMessage) -> Result<MessageResponse, RouterError> {
        validated(&record)?;

        let total_saved = self
            .ledger
            .record(record.amount, &record.category, &record.product)
            .await?;

        tracing::info!(
            "Recorded ${:.2} on {}, badge now {:?}",
            record.amount,
            record.product,
            badge_text(total_saved)
        );

        // The reply does not wait on the matching API.
        if self.sync_remote_savings {
            let router = self.clone();
            tokio::spawn(async move { router.sync_remote(&record).await });
        }

        Ok(MessageResponse::RecordSavings(RecordSavingsResponse {
            success: true,
            total_saved,
        }))
    }

    // The local ledger is authoritative; the server copy is best-effort.
    async fn sync_remote(&self, record: &RecordSavingsMessage) {
        let user_id = match self.preferences.get_or_create_user_id().await {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!("Skipping remote savings sync, no user id: {}", e);
                return;
            }
        };

        if let Err(e) = self
            .api
            .record_savings(&user_id, record.amount, &record.category, &record.product)
            .await
        {
            tracing::warn!("Saving recorded locally but API sync failed: {}", e);
        }
    }
}

fn validated<T: Validate>(value: &T) -> Result<(), RouterError> {
    value.validate().map_err(|e| RouterError::Validation(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::Mutex;
    use crate::core::Overlay;
    use crate::models::PageMessage;
    use crate::services::storage::Storage;

    async fn router() -> MessageRouter {
        let storage = Arc::new(Storage::in_memory());
        let preferences = Preferences::new(storage.clone());
        let api = Arc::new(MatchApiClient::new(preferences.clone(), 10, Duration::from_secs(60)));
        let analyzer = Arc::new(PageAnalyzer::new(
            preferences.clone(),
            api.clone(),
            Arc::new(Mutex::new(Overlay::new())),
        ));
        let ledger = SavingsLedger::spawn(storage).await;
        MessageRouter::new(ledger, preferences, analyzer, api).with_remote_savings(false)
    }

    #[tokio::test]
    async fn test_record_savings_returns_total() {
        let router = router().await;
        let msg: Message = serde_json::from_str(
            r#"{"type": "RECORD_SAVINGS", "amount": 4.5, "category": "personal_care", "product": "Razor"}"#,
        )
        .unwrap();

        let resp = router.handle(msg).await.unwrap();
        assert_eq!(
            resp,
            MessageResponse::RecordSavings(RecordSavingsResponse { success: true, total_saved: 4.5 })
        );

        match router.handle(Message::GetStats).await.unwrap() {
            MessageResponse::Stats(stats) => assert_eq!(stats.transactions.len(), 1),
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_record_savings_rejects_empty_product() {
        let router = router().await;
        let msg = Message::RecordSavings(RecordSavingsMessage {
            amount: 1.0,
            category: "clothing".into(),
            product: String::new(),
        });
        assert!(matches!(router.handle(msg).await, Err(RouterError::Validation(_))));
    }

    #[tokio::test]
    async fn test_record_savings_rejects_zero_amount() {
        let router = router().await;
        let msg = Message::RecordSavings(RecordSavingsMessage {
            amount: 0.0,
            category: "personal_care".into(),
            product: "Razor".into(),
        });
        assert!(matches!(router.handle(msg).await, Err(RouterError::Validation(_))));
    }

    #[tokio::test]
    async fn test_page_messages_reject_invalid_url() {
        let router = router().await;
        let page = PageMessage { url: "not a url".into(), html: None };

        let analyze = router.handle(Message::AnalyzePage(page.clone())).await;
        assert!(matches!(analyze, Err(RouterError::Validation(_))));

        let info = router.handle(Message::GetProductInfo(page)).await;
        assert!(matches!(info, Err(RouterError::Validation(_))));
    }

    #[tokio::test]
    async fn test_user_id_is_stable() {
        let router = router().await;
        let first = router.handle(Message::GetUserId).await.unwrap();
        let second = router.handle(Message::GetUserId).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_product_info_from_snapshot() {
        let router = router().await;
        let msg = Message::GetProductInfo(PageMessage {
            url: "https://www.zara.com/us/en/woman/dress.html".into(),
            html: Some(r#"<h1 class="product-name">Midi Dress</h1><span class="price__amount">$49.90</span>"#.into()),
        });

        match router.handle(msg).await.unwrap() {
            MessageResponse::ProductInfo(info) => {
                assert_eq!(info.product.unwrap().title, "Midi Dress");
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_analyze_unsupported_site() {
        let router = router().await;
        let msg = Message::AnalyzePage(PageMessage {
            url: "https://example.org/".into(),
            html: Some("<p>hello</p>".into()),
        });

        match router.handle(msg).await.unwrap() {
            MessageResponse::Analyze(resp) => assert_eq!(resp.outcome, "unsupported_site"),
            other => panic!("unexpected response: {:?}", other),
        }
    }
}
