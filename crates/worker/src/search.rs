use async_trait::async_trait;
use chowline_core::config::SearchConfig;
use chowline_core::{CandidateId, LookupError};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// The search index holding (business id, cuisine) documents. Queries are
/// randomized server-side so repeated requests surface different picks.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    async fn random_ids_by_cuisine(
        &self,
        cuisine: &str,
        count: usize,
    ) -> Result<Vec<CandidateId>, LookupError>;
}

/// Elasticsearch-compatible HTTP implementation.
pub struct HttpSearchIndex {
    client: reqwest::Client,
    search_url: String,
    username: String,
    password: SecretString,
}

impl HttpSearchIndex {
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            search_url: format!(
                "{}/{}/{}/_search",
                config.endpoint.trim_end_matches('/'),
                config.index,
                config.doc_type
            ),
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: SearchHits,
}

#[derive(Debug, Deserialize)]
struct SearchHits {
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "_id")]
    id: String,
}

#[async_trait]
impl SearchIndex for HttpSearchIndex {
    async fn random_ids_by_cuisine(
        &self,
        cuisine: &str,
        count: usize,
    ) -> Result<Vec<CandidateId>, LookupError> {
        let body = serde_json::json!({
            "query": {
                "function_score": {
                    "query": { "match": { "cuisine": cuisine } },
                    "random_score": {}
                }
            },
            "size": count,
        });

        let response = self
            .client
            .post(&self.search_url)
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .json(&body)
            .send()
            .await
            .map_err(|error| LookupError::Index(error.to_string()))?
            .error_for_status()
            .map_err(|error| LookupError::Index(error.to_string()))?;

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|error| LookupError::Index(error.to_string()))?;

        Ok(parsed
            .hits
            .hits
            .into_iter()
            .take(count)
            .map(|hit| CandidateId(hit.id))
            .collect())
    }
}
