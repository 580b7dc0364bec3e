//! PostgreSQL-backed `MessageRepository` adapter.
//!
//! The nudge write is `INSERT ... ON CONFLICT DO NOTHING` on the synthetic
//! `(user_id, day, attempt_seq)` key. A zero row count means a concurrent
//! run already claimed the slot.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::UserId;
use crate::domain::ports::{
    MessageRepository, MessageRepositoryError, MessageStamp, NewNudge, NudgeInsert,
};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{MessageStampRow, NewMessageRow};
use super::pool::DbPool;
use super::schema::user_messages;

/// Diesel-backed implementation of the `MessageRepository` port.
#[derive(Clone)]
pub struct DieselMessageRepository {
    pool: DbPool,
}

impl DieselMessageRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_err(e: diesel::result::Error) -> MessageRepositoryError {
    map_diesel_error(
        e,
        MessageRepositoryError::query,
        MessageRepositoryError::connection,
    )
}

#[async_trait]
impl MessageRepository for DieselMessageRepository {
    async fn messages_for_day(
        &self,
        user_id: &UserId,
        day: &str,
    ) -> Result<Vec<MessageStamp>, MessageRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| map_pool_error(e, MessageRepositoryError::connection))?;

        let rows: Vec<MessageStampRow> = user_messages::table
            .filter(user_messages::user_id.eq(user_id.as_uuid()))
            .filter(user_messages::day.eq(day))
            .select(MessageStampRow::as_select())
            .order(user_messages::created_at.desc())
            .load(&mut conn)
            .await
            .map_err(map_err)?;

        Ok(rows
            .into_iter()
            .map(|row| MessageStamp {
                id: row.id,
                created_at: row.created_at,
            })
            .collect())
    }

    async fn insert_nudge(
        &self,
        nudge: &NewNudge,
    ) -> Result<NudgeInsert, MessageRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| map_pool_error(e, MessageRepositoryError::connection))?;

        let id = Uuid::new_v4();
        let row = NewMessageRow {
            id,
            user_id: *nudge.user_id.as_uuid(),
            day: &nudge.day,
            attempt_seq: nudge.attempt_seq,
            title: &nudge.title,
            body: &nudge.body,
            url: &nudge.url,
        };

        let inserted = diesel::insert_into(user_messages::table)
            .values(&row)
            .on_conflict((
                user_messages::user_id,
                user_messages::day,
                user_messages::attempt_seq,
            ))
            .do_nothing()
            .execute(&mut conn)
            .await
            .map_err(map_err)?;

        if inserted == 0 {
            Ok(NudgeInsert::AlreadySent)
        } else {
            Ok(NudgeInsert::Inserted(id))
        }
    }
}
