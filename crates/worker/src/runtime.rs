use std::sync::Arc;
use std::time::Duration;

use chowline_core::{format_recommendations, DeliveryError, LookupError};
use chowline_db::{HandoffQueue, MessageId, QueueError};
use thiserror::Error;
use tracing::{error, info};

use crate::notify::Notifier;
use crate::resolver::Resolver;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

/// The queue-driven recommendation worker. Each pass handles at most one
/// message end to end.
pub struct RecommendationWorker {
    queue: Arc<dyn HandoffQueue>,
    resolver: Resolver,
    notifier: Arc<dyn Notifier>,
    poll_interval: Duration,
}

impl RecommendationWorker {
    pub fn new(
        queue: Arc<dyn HandoffQueue>,
        resolver: Resolver,
        notifier: Arc<dyn Notifier>,
        poll_interval: Duration,
    ) -> Self {
        Self { queue, resolver, notifier, poll_interval }
    }

    /// Processes one queued request if any is visible.
    ///
    /// The message is acknowledged only after the notification went out, so
    /// a crash anywhere in the pass leaves the claim to expire and the
    /// request to be redelivered. Redelivery can repeat the notification;
    /// nothing else in the pipeline mutates external state.
    pub async fn run_once(&self) -> Result<Option<MessageId>, WorkerError> {
        let Some(claimed) = self.queue.dequeue_one().await? else {
            return Ok(None);
        };

        info!(
            message_id = %claimed.id,
            cuisine = %claimed.request.cuisine,
            sent_at = %claimed.sent_at.to_rfc3339(),
            "processing dining request"
        );

        let records = self.resolver.recommend(&claimed.request.cuisine).await?;
        let message = format_recommendations(&claimed.request, &records);
        self.notifier.send(&message, &claimed.request.contact_handle).await?;

        self.queue.acknowledge(&claimed.receipt).await?;

        info!(
            message_id = %claimed.id,
            recommendations = records.len(),
            "dining request fulfilled and acknowledged"
        );
        Ok(Some(claimed.id))
    }

    /// Polls the queue forever. Failed passes are logged and retried on the
    /// next tick; the unacknowledged message comes back once its visibility
    /// deadline passes.
    pub async fn run(&self) {
        loop {
            match self.run_once().await {
                Ok(Some(_)) => continue,
                Ok(None) => tokio::time::sleep(self.poll_interval).await,
                Err(source) => {
                    error!(error = %source, "recommendation pass failed");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }
}
