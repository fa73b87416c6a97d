use async_trait::async_trait;
use chowline_core::config::RecordStoreConfig;
use chowline_core::{CandidateId, LookupError, RestaurantRecord};
use serde::Deserialize;

/// Point lookups against the record store that owns the full restaurant
/// documents. This system only ever reads; the ingestion loader writes.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find_by_business_id(
        &self,
        id: &CandidateId,
    ) -> Result<Option<RestaurantRecord>, LookupError>;
}

pub struct HttpRecordStore {
    client: reqwest::Client,
    query_url: String,
}

impl HttpRecordStore {
    pub fn from_config(config: &RecordStoreConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            query_url: format!(
                "{}/{}/_query",
                config.endpoint.trim_end_matches('/'),
                config.table
            ),
        }
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    items: Vec<RestaurantRecord>,
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn find_by_business_id(
        &self,
        id: &CandidateId,
    ) -> Result<Option<RestaurantRecord>, LookupError> {
        let body = serde_json::json!({
            "filter": { "business_id": id.0 }
        });

        let response = self
            .client
            .post(&self.query_url)
            .json(&body)
            .send()
            .await
            .map_err(|error| LookupError::Store(error.to_string()))?
            .error_for_status()
            .map_err(|error| LookupError::Store(error.to_string()))?;

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|error| LookupError::Store(error.to_string()))?;

        // Equality filter on the business identifier; first match wins.
        Ok(parsed.items.into_iter().next())
    }
}
