use thiserror::Error;

/// Failures while turning a cuisine filter into full restaurant records.
/// Always fatal for the invocation: no partial recommendation is ever sent.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("search index returned {got} candidates, {wanted} were requested")]
    InsufficientCandidates { wanted: usize, got: usize },
    #[error("no record in the store matches candidate id `{0}`")]
    RecordNotFound(String),
    #[error("search index query failed: {0}")]
    Index(String),
    #[error("record store lookup failed: {0}")]
    Store(String),
}

/// Notification channel failure. Fatal for the invocation; the channel is
/// fire-and-forget and nothing retries at this layer.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("notification send to `{handle}` failed: {reason}")]
    Send { handle: String, reason: String },
}
