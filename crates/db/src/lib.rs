pub mod connection;
pub mod migrations;
pub mod queue;

pub use connection::{connect, connect_with_settings, DbPool};
pub use queue::{
    ClaimedMessage, HandoffQueue, MessageId, QueueError, Receipt, SqliteHandoffQueue,
};
