//! Best-effort audit trail port.
//!
//! Audit failures never abort a pacing run; callers log and continue.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::UserId;

/// Kinds of audit entries the pipeline records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditKind {
    /// Snapshot of the day's standing, written on every run.
    RaceUpdate,
    /// Decision outcome, written after the commit lands.
    PaceAdapt,
}

impl AuditKind {
    /// Stable string stored in the `kind` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RaceUpdate => "race_update",
            Self::PaceAdapt => "pace_adapt",
        }
    }
}

/// Errors raised by audit adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuditLogError {
    /// Repository connection could not be established.
    #[error("audit log connection failed: {message}")]
    Connection {
        /// Adapter-provided diagnostic.
        message: String,
    },
    /// Insert failed during execution.
    #[error("audit log query failed: {message}")]
    Query {
        /// Adapter-provided diagnostic.
        message: String,
    },
}

impl AuditLogError {
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

/// Append-only port for audit entries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Record one entry for the user on the given local day key.
    async fn record(
        &self,
        user_id: &UserId,
        day: &str,
        kind: AuditKind,
        payload: Value,
    ) -> Result<(), AuditLogError>;
}

/// Fixture that drops every entry.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAuditLog;

#[async_trait]
impl AuditLog for FixtureAuditLog {
    async fn record(
        &self,
        _user_id: &UserId,
        _day: &str,
        _kind: AuditKind,
        _payload: Value,
    ) -> Result<(), AuditLogError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::AuditKind;

    #[rstest]
    #[case(AuditKind::RaceUpdate, "race_update")]
    #[case(AuditKind::PaceAdapt, "pace_adapt")]
    fn kinds_serialise_to_stable_strings(#[case] kind: AuditKind, #[case] expected: &str) {
        assert_eq!(kind.as_str(), expected);
    }
}
