use std::time::Duration;

use chowline_core::chrono::{DateTime, NaiveDate, Utc};
use chowline_core::DiningRequest;
use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

use crate::DbPool;

/// Constant message body carried alongside the six request attributes.
pub const MESSAGE_BODY: &str = "Dining Requirements";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageId(pub String);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Claim token returned by dequeue. Valid until the visibility deadline;
/// after that the message is redeliverable and the receipt is dead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt(pub String);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimedMessage {
    pub id: MessageId,
    pub receipt: Receipt,
    pub request: DiningRequest,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("could not decode queued message: {0}")]
    Decode(String),
    #[error("receipt `{0}` is unknown or its claim has expired")]
    ReceiptInvalid(String),
}

/// Durable request handoff between the dialog front-end and the worker.
///
/// Two-phase protocol: `dequeue_one` hides the claimed message from other
/// consumers until the visibility deadline; only `acknowledge` removes it
/// permanently. A consumer crash between the two phases leads to
/// redelivery, so delivery is at-least-once.
#[async_trait::async_trait]
pub trait HandoffQueue: Send + Sync {
    async fn enqueue(&self, request: &DiningRequest) -> Result<MessageId, QueueError>;
    async fn dequeue_one(&self) -> Result<Option<ClaimedMessage>, QueueError>;
    async fn acknowledge(&self, receipt: &Receipt) -> Result<(), QueueError>;
}

pub struct SqliteHandoffQueue {
    pool: DbPool,
    visibility_timeout: Duration,
}

impl SqliteHandoffQueue {
    pub fn new(pool: DbPool) -> Self {
        Self { pool, visibility_timeout: Duration::from_secs(60) }
    }

    pub fn with_visibility_timeout(pool: DbPool, visibility_timeout: Duration) -> Self {
        Self { pool, visibility_timeout }
    }

    pub async fn len(&self) -> Result<u64, QueueError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM handoff_message")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    pub async fn is_empty(&self) -> Result<bool, QueueError> {
        Ok(self.len().await? == 0)
    }
}

#[async_trait::async_trait]
impl HandoffQueue for SqliteHandoffQueue {
    async fn enqueue(&self, request: &DiningRequest) -> Result<MessageId, QueueError> {
        let id = MessageId(Uuid::new_v4().to_string());

        sqlx::query(
            "INSERT INTO handoff_message (
                id,
                body,
                cuisine,
                location,
                party_size,
                dining_date,
                dining_time,
                contact_handle,
                sent_at_ms
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id.0)
        .bind(MESSAGE_BODY)
        .bind(&request.cuisine)
        .bind(&request.location)
        .bind(request.party_size.to_string())
        .bind(request.dining_date.format("%Y-%m-%d").to_string())
        .bind(&request.dining_time)
        .bind(&request.contact_handle)
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn dequeue_one(&self) -> Result<Option<ClaimedMessage>, QueueError> {
        let now_ms = Utc::now().timestamp_millis();
        let deadline_ms = now_ms + self.visibility_timeout.as_millis() as i64;
        let receipt = Receipt(Uuid::new_v4().to_string());

        // Claim the oldest visible message in one statement so that two
        // concurrent consumers can never receive the same row.
        let row = sqlx::query(
            "UPDATE handoff_message
             SET receipt = ?, invisible_until_ms = ?
             WHERE seq = (
                SELECT seq FROM handoff_message
                WHERE invisible_until_ms IS NULL OR invisible_until_ms <= ?
                ORDER BY seq ASC
                LIMIT 1
             )
             RETURNING id, cuisine, location, party_size, dining_date, dining_time,
                       contact_handle, sent_at_ms",
        )
        .bind(&receipt.0)
        .bind(deadline_ms)
        .bind(now_ms)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| claimed_from_row(row, receipt)).transpose()
    }

    async fn acknowledge(&self, receipt: &Receipt) -> Result<(), QueueError> {
        let now_ms = Utc::now().timestamp_millis();
        let deleted = sqlx::query(
            "DELETE FROM handoff_message WHERE receipt = ? AND invisible_until_ms > ?",
        )
        .bind(&receipt.0)
        .bind(now_ms)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if deleted == 0 {
            return Err(QueueError::ReceiptInvalid(receipt.0.clone()));
        }
        Ok(())
    }
}

fn claimed_from_row(row: SqliteRow, receipt: Receipt) -> Result<ClaimedMessage, QueueError> {
    let party_size_raw = row.try_get::<String, _>("party_size")?;
    let party_size = party_size_raw.parse::<u32>().map_err(|_| {
        QueueError::Decode(format!("invalid party_size attribute `{party_size_raw}`"))
    })?;

    let dining_date_raw = row.try_get::<String, _>("dining_date")?;
    let dining_date = NaiveDate::parse_from_str(&dining_date_raw, "%Y-%m-%d").map_err(|_| {
        QueueError::Decode(format!("invalid dining_date attribute `{dining_date_raw}`"))
    })?;

    let sent_at_ms = row.try_get::<i64, _>("sent_at_ms")?;
    let sent_at = DateTime::<Utc>::from_timestamp_millis(sent_at_ms)
        .ok_or_else(|| QueueError::Decode(format!("invalid sent_at_ms value {sent_at_ms}")))?;

    Ok(ClaimedMessage {
        id: MessageId(row.try_get("id")?),
        receipt,
        request: DiningRequest {
            cuisine: row.try_get("cuisine")?,
            location: row.try_get("location")?,
            party_size,
            dining_date,
            dining_time: row.try_get("dining_time")?,
            contact_handle: row.try_get("contact_handle")?,
        },
        sent_at,
    })
}
