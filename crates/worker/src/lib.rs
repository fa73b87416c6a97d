//! The asynchronous half of the pipeline: dequeue a dining request, resolve
//! randomized candidates against the search index, look each one up in the
//! record store, and deliver the formatted recommendation out of band.

pub mod notify;
pub mod resolver;
pub mod runtime;
pub mod search;
pub mod store;

pub use notify::{HttpNotifier, Notifier};
pub use resolver::Resolver;
pub use runtime::{RecommendationWorker, WorkerError};
pub use search::{HttpSearchIndex, SearchIndex};
pub use store::{HttpRecordStore, RecordStore};
