//! Port for the user-message (nudge) store consulted by the notification
//! gate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::UserId;

/// Creation stamp of an existing message, enough for rate limiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageStamp {
    /// Message id.
    pub id: Uuid,
    /// When the message was created.
    pub created_at: DateTime<Utc>,
}

/// A nudge to insert, carrying its synthetic idempotency key.
///
/// `(user_id, day, attempt_seq)` is unique in the store; two concurrent runs
/// computing the same sequence number cannot both land, which closes the
/// duplicate-nudge window the old check-then-insert pattern left open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNudge {
    /// Recipient.
    pub user_id: UserId,
    /// Local day key the nudge belongs to.
    pub day: String,
    /// 1-based sequence within the day, derived from the current count.
    pub attempt_seq: i32,
    /// Notification title.
    pub title: String,
    /// Notification body.
    pub body: String,
    /// In-app deep link.
    pub url: String,
}

/// Result of an insert-or-ignore nudge write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NudgeInsert {
    /// The row landed; the nudge is ours to deliver.
    Inserted(Uuid),
    /// A concurrent run already claimed this `(user, day, seq)` slot.
    AlreadySent,
}

/// Errors raised by message-store adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageRepositoryError {
    /// Repository connection could not be established.
    #[error("message repository connection failed: {message}")]
    Connection {
        /// Adapter-provided diagnostic.
        message: String,
    },
    /// Query or mutation failed during execution.
    #[error("message repository query failed: {message}")]
    Query {
        /// Adapter-provided diagnostic.
        message: String,
    },
}

impl MessageRepositoryError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Port for reading and writing nudge messages.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Stamps of the user's messages bucketed into the given local day key,
    /// newest first.
    ///
    /// The gate counts and spaces nudges within the same day bucket the
    /// unique `(user_id, day, attempt_seq)` key uses; mixing in a different
    /// window would let the derived sequence number collide with a row the
    /// count never saw.
    async fn messages_for_day(
        &self,
        user_id: &UserId,
        day: &str,
    ) -> Result<Vec<MessageStamp>, MessageRepositoryError>;

    /// Insert-or-ignore on the synthetic `(user_id, day, attempt_seq)` key.
    async fn insert_nudge(&self, nudge: &NewNudge)
        -> Result<NudgeInsert, MessageRepositoryError>;
}
