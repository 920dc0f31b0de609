use moka::future::Cache;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use crate::models::{
    ApiHealth, Category, ClothingMatchResponse, DemoKind, MatchResponse, ProductMatchRequest,
    SavingsStats, UserMeasurements,
};
use crate::services::preferences::Preferences;

/// Errors that can occur when calling the matching API
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Status(u16),
}

/// Client for the remote PinkVanity matching API
///
/// The base URL is read from synced preferences on every call, so option
/// changes apply immediately. Each call makes exactly one request: there
/// are no retries and no backoff.
pub struct MatchApiClient {
    preferences: Preferences,
    client: Client,
    quick_cache: Cache<String, MatchResponse>,
}

impl MatchApiClient {
    pub fn new(preferences: Preferences, cache_size: u64, cache_ttl: Duration) -> Self {
        let quick_cache = moka::future::CacheBuilder::new(cache_size)
            .time_to_live(cache_ttl)
            .build();

        Self {
            preferences,
            client: Client::new(),
            quick_cache,
        }
    }

    async fn base_url(&self) -> String {
        self.preferences.api_url().await.trim_end_matches('/').to_string()
    }

    /// Find a men's equivalent for a women's product
    ///
    /// POST /api/v1/match
    pub async fn find_product_match(
        &self,
        title: &str,
        price: f64,
        category: Category,
        ingredients: Option<Vec<String>>,
    ) -> Result<MatchResponse, ApiError> {
        let url = format!("{}/api/v1/match", self.base_url().await);
        let body = ProductMatchRequest {
            title: title.to_string(),
            price,
            category,
            ingredients,
        };

        tracing::debug!("Requesting product match for {:?} at ${:.2}", title, price);

        let response = self.client.post(&url).json(&body).send().await?;
        parse_json(response).await
    }

    /// Quick match via query string
    ///
    /// GET /api/v1/match/quick?title&price&category
    ///
    /// Responses are memoized per (base URL, title, price, category) for
    /// the configured TTL.
    pub async fn quick_match(&self, title: &str, price: f64, category: Category) -> Result<MatchResponse, ApiError> {
        let base_url = self.base_url().await;
        let key = format!("{}|{}|{}|{}", base_url, title, price, category);
        if let Some(hit) = self.quick_cache.get(&key).await {
            tracing::trace!("Quick match cache hit: {}", key);
            return Ok(hit);
        }

        let url = format!("{}/api/v1/match/quick", base_url);
        let price = price.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[("title", title), ("price", price.as_str()), ("category", category.as_str())])
            .send()
            .await?;

        let result: MatchResponse = parse_json(response).await?;
        self.quick_cache.insert(key, result.clone()).await;
        Ok(result)
    }

    /// Clothing match with a size recommendation
    ///
    /// POST /api/v1/clothing/match?womens_product_title&waist&hip[&chest]
    pub async fn find_clothing_match(
        &self,
        title: &str,
        measurements: &UserMeasurements,
    ) -> Result<ClothingMatchResponse, ApiError> {
        let url = format!("{}/api/v1/clothing/match", self.base_url().await);

        let mut params = vec![
            ("womens_product_title", title.to_string()),
            ("waist", measurements.waist_inches.to_string()),
            ("hip", measurements.hip_inches.to_string()),
        ];
        if let Some(chest) = measurements.chest_inches.filter(|c| *c > 0.0) {
            params.push(("chest", chest.to_string()));
        }

        let response = self.client.post(&url).query(&params).send().await?;
        parse_json(response).await
    }

    /// Record a savings transaction server-side
    ///
    /// POST /api/v1/savings/record?user_id&amount&category&product_title
    pub async fn record_savings(
        &self,
        user_id: &str,
        amount: f64,
        category: &str,
        product_title: &str,
    ) -> Result<(), ApiError> {
        let url = format!("{}/api/v1/savings/record", self.base_url().await);
        let amount = amount.to_string();

        let response = self
            .client
            .post(&url)
            .query(&[
                ("user_id", user_id),
                ("amount", amount.as_str()),
                ("category", category),
                ("product_title", product_title),
            ])
            .send()
            .await?;

        check_status(&response)?;
        Ok(())
    }

    /// GET /api/v1/savings/{userId}
    pub async fn get_savings_stats(&self, user_id: &str) -> Result<SavingsStats, ApiError> {
        let url = format!(
            "{}/api/v1/savings/{}",
            self.base_url().await,
            urlencoding::encode(user_id)
        );

        let response = self.client.get(&url).send().await?;
        parse_json(response).await
    }

    /// GET /api/v1/demo/{razor|shave-gel|hoodie}
    pub async fn get_demo_response(&self, kind: DemoKind) -> Result<serde_json::Value, ApiError> {
        let url = format!("{}/api/v1/demo/{}", self.base_url().await, kind.as_path());
        let response = self.client.get(&url).send().await?;
        parse_json(response).await
    }

    /// GET /health
    pub async fn health(&self) -> Result<ApiHealth, ApiError> {
        let base_url = self.base_url().await;
        self.health_at(&base_url).await
    }

    /// Health of an arbitrary API, e.g. a URL typed on the options page
    /// before it is saved
    pub async fn health_at(&self, base_url: &str) -> Result<ApiHealth, ApiError> {
        let url = format!("{}/health", base_url.trim_end_matches('/'));
        let response = self.client.get(&url).send().await?;
        parse_json(response).await
    }
}

fn check_status(response: &Response) -> Result<(), ApiError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        tracing::warn!("Matching API returned {} for {}", status, response.url().path());
        Err(ApiError::Status(status.as_u16()))
    }
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    check_status(&response)?;
    Ok(response.json().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::storage::{Storage, StorageArea};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_base_url_follows_preferences() {
        let storage = Arc::new(Storage::in_memory());
        let client = MatchApiClient::new(Preferences::new(storage.clone()), 10, Duration::from_secs(60));
        assert_eq!(client.base_url().await, "http://localhost:8000");

        storage
            .set(StorageArea::Sync, "apiUrl", serde_json::json!("https://api.example.test/"))
            .await
            .unwrap();
        assert_eq!(client.base_url().await, "https://api.example.test");
    }
}
