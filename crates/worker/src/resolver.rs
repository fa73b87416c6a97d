use std::sync::Arc;

use chowline_core::config::WorkerConfig;
use chowline_core::{CandidateSet, LookupError, RestaurantRecord, ShortfallPolicy};
use tracing::debug;

use crate::search::SearchIndex;
use crate::store::RecordStore;

/// Turns a cuisine filter into full restaurant records: a randomized
/// candidate query against the search index, then one point lookup per id.
pub struct Resolver {
    index: Arc<dyn SearchIndex>,
    store: Arc<dyn RecordStore>,
    result_count: usize,
    shortfall_policy: ShortfallPolicy,
}

impl Resolver {
    pub fn new(
        index: Arc<dyn SearchIndex>,
        store: Arc<dyn RecordStore>,
        config: &WorkerConfig,
    ) -> Self {
        Self {
            index,
            store,
            result_count: config.result_count,
            shortfall_policy: config.shortfall_policy,
        }
    }

    pub async fn candidates(&self, cuisine: &str) -> Result<CandidateSet, LookupError> {
        let ids = self.index.random_ids_by_cuisine(cuisine, self.result_count).await?;
        Ok(CandidateSet::new(ids, self.result_count))
    }

    pub async fn recommend(&self, cuisine: &str) -> Result<Vec<RestaurantRecord>, LookupError> {
        let candidates = self.candidates(cuisine).await?;
        debug!(
            cuisine = %cuisine,
            requested = candidates.requested(),
            returned = candidates.len(),
            "candidate query answered"
        );

        if candidates.shortfall() > 0 && self.shortfall_policy == ShortfallPolicy::Error {
            return Err(LookupError::InsufficientCandidates {
                wanted: candidates.requested(),
                got: candidates.len(),
            });
        }

        let mut records = Vec::with_capacity(candidates.len());
        for id in candidates.ids() {
            let record = self
                .store
                .find_by_business_id(id)
                .await?
                .ok_or_else(|| LookupError::RecordNotFound(id.0.clone()))?;
            records.push(record);
        }
        Ok(records)
    }
}
