use serde_json::{json, Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use crate::models::{LocalStats, Transaction};
use crate::services::storage::{Storage, StorageArea, StorageError};

pub const KEY_TOTAL_SAVED: &str = "totalSaved";
pub const KEY_TRANSACTIONS: &str = "transactions";

/// Action badge background colour
pub const BADGE_COLOR: &str = "#e91e8c";

/// Errors that can occur when talking to the ledger
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Ledger task is not running")]
    Closed,
}

enum Command {
    Record {
        amount: f64,
        category: String,
        product: String,
        reply: oneshot::Sender<Result<f64, LedgerError>>,
    },
    Stats {
        reply: oneshot::Sender<LocalStats>,
    },
    Reset {
        reply: oneshot::Sender<Result<(), LedgerError>>,
    },
}

/// Handle to the savings ledger task
///
/// One task owns the running total and the transaction list, so concurrent
/// records from several tabs are applied one after another and no update
/// is lost. Every record is persisted to local storage before it is
/// acknowledged.
#[derive(Clone)]
pub struct SavingsLedger {
    tx: mpsc::Sender<Command>,
}

impl SavingsLedger {
    /// Load the ledger from local storage and start its task
    pub async fn spawn(storage: Arc<Storage>) -> Self {
        let state = load_state(&storage).await;
        tracing::info!(
            "Savings ledger loaded: ${:.2} across {} swaps",
            state.total_saved,
            state.transactions.len()
        );

        let (tx, rx) = mpsc::channel(64);
        let task = LedgerTask { storage, state, rx };
        tokio::spawn(task.run());

        Self { tx }
    }

    /// Append a transaction; returns the new running total
    pub async fn record(&self, amount: f64, category: &str, product: &str) -> Result<f64, LedgerError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Record {
                amount,
                category: category.to_string(),
                product: product.to_string(),
                reply,
            })
            .await
            .map_err(|_| LedgerError::Closed)?;

        rx.await.map_err(|_| LedgerError::Closed)?
    }

    pub async fn stats(&self) -> Result<LocalStats, LedgerError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Stats { reply })
            .await
            .map_err(|_| LedgerError::Closed)?;

        rx.await.map_err(|_| LedgerError::Closed)
    }

    /// Drop every transaction and zero the total, in memory and on disk
    pub async fn reset(&self) -> Result<(), LedgerError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Reset { reply })
            .await
            .map_err(|_| LedgerError::Closed)?;

        rx.await.map_err(|_| LedgerError::Closed)?
    }
}

struct LedgerTask {
    storage: Arc<Storage>,
    state: LocalStats,
    rx: mpsc::Receiver<Command>,
}

impl LedgerTask {
    async fn run(mut self) {
        while let Some(cmd) = self.rx.recv().await {
            match cmd {
                Command::Record { amount, category, product, reply } => {
                    let result = self.record(amount, category, product).await;
                    let _ = reply.send(result);
                }
                Command::Stats { reply } => {
                    let _ = reply.send(self.state.clone());
                }
                Command::Reset { reply } => {
                    let result = self.reset().await;
                    let _ = reply.send(result);
                }
            }
        }
        tracing::debug!("Savings ledger task stopped");
    }

    async fn record(&mut self, amount: f64, category: String, product: String) -> Result<f64, LedgerError> {
        let transaction = Transaction {
            amount,
            category,
            product,
            timestamp: chrono::Utc::now().timestamp_millis(),
        };

        let total_saved = self.state.total_saved + amount;
        let mut transactions = self.state.transactions.clone();
        transactions.push(transaction);

        let mut entries = Map::new();
        entries.insert(KEY_TOTAL_SAVED.to_string(), json!(total_saved));
        entries.insert(KEY_TRANSACTIONS.to_string(), serde_json::to_value(&transactions).map_err(StorageError::from)?);

        if let Err(e) = self.storage.set_many(StorageArea::Local, entries).await {
            tracing::error!("Failed to persist savings transaction: {}", e);
            return Err(e.into());
        }

        self.state = LocalStats { total_saved, transactions };
        tracing::debug!("Recorded ${:.2} saving, total now ${:.2}", amount, total_saved);
        Ok(total_saved)
    }

    async fn reset(&mut self) -> Result<(), LedgerError> {
        self.storage.remove(StorageArea::Local, KEY_TOTAL_SAVED).await?;
        self.storage.remove(StorageArea::Local, KEY_TRANSACTIONS).await?;
        self.state = LocalStats::default();
        tracing::info!("Savings ledger cleared");
        Ok(())
    }
}

/// Read the persisted ledger, skipping malformed entries
async fn load_state(storage: &Storage) -> LocalStats {
    let stored = storage
        .get_many(StorageArea::Local, &[KEY_TOTAL_SAVED, KEY_TRANSACTIONS])
        .await;

    let total_saved = stored
        .get(KEY_TOTAL_SAVED)
        .and_then(Value::as_f64)
        .unwrap_or(0.0);

    let transactions = stored
        .get(KEY_TRANSACTIONS)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default();

    LocalStats { total_saved, transactions }
}

/// Badge text for the extension action: whole dollars saved, or empty
pub fn badge_text(total_saved: f64) -> String {
    if total_saved > 0.0 {
        format!("${}", total_saved.floor() as i64)
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_record_updates_total_and_appends() {
        let storage = Arc::new(Storage::in_memory());
        let ledger = SavingsLedger::spawn(storage.clone()).await;

        let before = chrono::Utc::now().timestamp_millis();
        let total = ledger.record(12.5, "personal_care", "Gillette Mach3").await.unwrap();
        assert_eq!(total, 12.5);

        let stats = ledger.stats().await.unwrap();
        assert_eq!(stats.total_saved, 12.5);
        assert_eq!(stats.transactions.len(), 1);
        assert_eq!(stats.transactions[0].product, "Gillette Mach3");
        assert!(stats.transactions[0].timestamp >= before);

        assert_eq!(storage.get(StorageArea::Local, KEY_TOTAL_SAVED).await, Some(json!(12.5)));
    }

    #[tokio::test]
    async fn test_loads_existing_state() {
        let storage = Arc::new(Storage::in_memory());
        storage.set(StorageArea::Local, KEY_TOTAL_SAVED, json!(10.0)).await.unwrap();
        storage
            .set(
                StorageArea::Local,
                KEY_TRANSACTIONS,
                json!([
                    {"amount": 10.0, "category": "clothing", "product": "Hoodie", "timestamp": 1},
                    {"garbage": true}
                ]),
            )
            .await
            .unwrap();

        let ledger = SavingsLedger::spawn(storage).await;
        let stats = ledger.stats().await.unwrap();
        assert_eq!(stats.total_saved, 10.0);
        assert_eq!(stats.transactions.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_records_do_not_lose_updates() {
        let storage = Arc::new(Storage::in_memory());
        let ledger = SavingsLedger::spawn(storage).await;

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let ledger = ledger.clone();
                tokio::spawn(async move { ledger.record(1.0, "personal_care", &format!("item {}", i)).await })
            })
            .collect();
        for h in handles {
            h.await.unwrap().unwrap();
        }

        let stats = ledger.stats().await.unwrap();
        assert_eq!(stats.total_saved, 20.0);
        assert_eq!(stats.transactions.len(), 20);
    }

    #[tokio::test]
    async fn test_reset_clears_state_and_storage() {
        let storage = Arc::new(Storage::in_memory());
        let ledger = SavingsLedger::spawn(storage.clone()).await;
        ledger.record(8.0, "clothing", "Hoodie").await.unwrap();

        ledger.reset().await.unwrap();

        let stats = ledger.stats().await.unwrap();
        assert_eq!(stats.total_saved, 0.0);
        assert!(stats.transactions.is_empty());
        assert_eq!(storage.get(StorageArea::Local, KEY_TOTAL_SAVED).await, None);

        // the next record starts from zero
        assert_eq!(ledger.record(2.0, "clothing", "Tee").await.unwrap(), 2.0);
    }

    #[test]
    fn test_badge_text() {
        assert_eq!(badge_text(0.0), "");
        assert_eq!(badge_text(12.99), "$12");
        assert_eq!(badge_text(-3.0), "");
    }
}
