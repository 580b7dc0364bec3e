//! Best-effort push delivery port.
//!
//! Delivery failures never surface to the caller of a pacing run; the nudge
//! row is the source of truth and the push is a courtesy.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::UserId;

/// Payload handed to the push relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushPayload {
    /// The stored message the push mirrors.
    pub message_id: Uuid,
    /// Notification title.
    pub title: String,
    /// Notification body.
    pub body: String,
    /// In-app deep link.
    pub url: String,
}

/// Errors raised by push adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PushDeliveryError {
    /// Subscription lookup failed.
    #[error("push subscription lookup failed: {message}")]
    Connection {
        /// Adapter-provided diagnostic.
        message: String,
    },
    /// Relay rejected or failed the delivery.
    #[error("push delivery failed: {message}")]
    Delivery {
        /// Adapter-provided diagnostic.
        message: String,
    },
}

impl PushDeliveryError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for delivery failures.
    pub fn delivery(message: impl Into<String>) -> Self {
        Self::Delivery {
            message: message.into(),
        }
    }
}

/// Port for fanning a nudge out to the user's push subscriptions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PushDelivery: Send + Sync {
    /// Deliver the payload to every live subscription for the user.
    async fn notify(
        &self,
        user_id: &UserId,
        payload: &PushPayload,
    ) -> Result<(), PushDeliveryError>;
}

/// Fixture that delivers nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpPushDelivery;

#[async_trait]
impl PushDelivery for NoOpPushDelivery {
    async fn notify(
        &self,
        _user_id: &UserId,
        _payload: &PushPayload,
    ) -> Result<(), PushDeliveryError> {
        Ok(())
    }
}
