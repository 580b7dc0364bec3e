//! HTTP push delivery adapter.
//!
//! Fans a stored nudge out to every push subscription the user's devices
//! have registered. Delivery is best effort: the pipeline records the nudge
//! row first and treats a failed push as a log line, not an error.
//!
//! Subscriptions the relay reports as gone (403, 404 or 410) are pruned so
//! the next run does not retry dead endpoints.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use reqwest::StatusCode;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::UserId;
use crate::domain::ports::{PushDelivery, PushDeliveryError, PushPayload};

use super::persistence::{DbPool, PushSubscriptionRow, push_subscriptions};

/// Wire form of a nudge pushed to a relay endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PushBody<'a> {
    message_id: Uuid,
    title: &'a str,
    body: &'a str,
    url: &'a str,
}

/// Push delivery over plain HTTP POST to each stored endpoint.
#[derive(Clone)]
pub struct HttpPushDelivery {
    pool: DbPool,
    client: reqwest::Client,
}

impl HttpPushDelivery {
    /// Create a new adapter with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            client: reqwest::Client::new(),
        }
    }

    async fn subscriptions(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<PushSubscriptionRow>, PushDeliveryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| PushDeliveryError::connection(e.to_string()))?;

        push_subscriptions::table
            .filter(push_subscriptions::user_id.eq(user_id.as_uuid()))
            .select(PushSubscriptionRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|e| PushDeliveryError::connection(e.to_string()))
    }

    async fn prune(&self, subscription_id: Uuid) {
        let Ok(mut conn) = self.pool.get().await else {
            return;
        };
        let result = diesel::delete(
            push_subscriptions::table.filter(push_subscriptions::id.eq(subscription_id)),
        )
        .execute(&mut conn)
        .await;
        if let Err(error) = result {
            debug!(%error, %subscription_id, "failed to prune dead push subscription");
        }
    }
}

fn is_gone(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::FORBIDDEN | StatusCode::NOT_FOUND | StatusCode::GONE
    )
}

#[async_trait]
impl PushDelivery for HttpPushDelivery {
    async fn notify(
        &self,
        user_id: &UserId,
        payload: &PushPayload,
    ) -> Result<(), PushDeliveryError> {
        let subscriptions = self.subscriptions(user_id).await?;
        if subscriptions.is_empty() {
            return Ok(());
        }

        let body = PushBody {
            message_id: payload.message_id,
            title: &payload.title,
            body: &payload.body,
            url: &payload.url,
        };

        let total = subscriptions.len();
        let mut failed = 0usize;
        for subscription in subscriptions {
            match self.client.post(&subscription.endpoint).json(&body).send().await {
                Ok(response) if response.status().is_success() => {}
                Ok(response) => {
                    let status = response.status();
                    warn!(%user_id, %status, "push relay rejected delivery");
                    if is_gone(status) {
                        self.prune(subscription.id).await;
                    }
                    failed += 1;
                }
                Err(error) => {
                    warn!(%user_id, %error, "push delivery request failed");
                    failed += 1;
                }
            }
        }

        if failed == total {
            return Err(PushDeliveryError::delivery(format!(
                "all {total} subscription deliveries failed"
            )));
        }
        Ok(())
    }
}
