use serde::{Deserialize, Serialize};

/// Opaque identifier handed back by the search index, resolved later to a
/// full record in the record store.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateId(pub String);

impl std::fmt::Display for CandidateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The ordered identifiers returned for one candidate query, together with
/// the count the caller asked for. The index may hold fewer matches than
/// requested; callers decide via [`shortfall`](Self::shortfall) whether to
/// truncate or fail rather than index past the end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateSet {
    ids: Vec<CandidateId>,
    requested: usize,
}

impl CandidateSet {
    pub fn new(ids: Vec<CandidateId>, requested: usize) -> Self {
        Self { ids, requested }
    }

    pub fn ids(&self) -> &[CandidateId] {
        &self.ids
    }

    pub fn requested(&self) -> usize {
        self.requested
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// How many ids short of the requested count the index came back.
    pub fn shortfall(&self) -> usize {
        self.requested.saturating_sub(self.ids.len())
    }

    pub fn into_ids(self) -> Vec<CandidateId> {
        self.ids
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// A restaurant as held by the external record store. Read-only to this
/// system; the ingestion loader owns writes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RestaurantRecord {
    pub business_id: String,
    pub name: String,
    /// Display address components in presentation order.
    pub address: Vec<String>,
    pub coordinates: Coordinates,
    pub number_of_reviews: u32,
    pub rating: f64,
    pub zip_code: String,
}
