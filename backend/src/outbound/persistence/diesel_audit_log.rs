//! PostgreSQL-backed `AuditLog` adapter.

use async_trait::async_trait;
use diesel_async::RunQueryDsl;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::ports::{AuditKind, AuditLog, AuditLogError};
use crate::domain::{AccessLevel, UserId};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::NewAuditRow;
use super::pool::DbPool;
use super::schema::audit_entries;

/// Diesel-backed implementation of the `AuditLog` port.
///
/// Appends one row per entry; callers treat failures as non-fatal.
#[derive(Clone)]
pub struct DieselAuditLog {
    pool: DbPool,
    access: AccessLevel,
}

impl DieselAuditLog {
    /// Create a new audit log with the given connection pool and access
    /// level.
    pub fn new(pool: DbPool, access: AccessLevel) -> Self {
        Self { pool, access }
    }
}

#[async_trait]
impl AuditLog for DieselAuditLog {
    async fn record(
        &self,
        user_id: &UserId,
        day: &str,
        kind: AuditKind,
        payload: Value,
    ) -> Result<(), AuditLogError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| map_pool_error(e, AuditLogError::connection))?;

        let row = NewAuditRow {
            id: Uuid::new_v4(),
            user_id: *user_id.as_uuid(),
            day,
            kind: kind.as_str(),
            payload: &payload,
            access_level: self.access.as_str(),
        };

        diesel::insert_into(audit_entries::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|e| map_diesel_error(e, AuditLogError::query, AuditLogError::connection))
    }
}
