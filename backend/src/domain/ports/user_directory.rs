//! Port for account-level lookups (admin flag).

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::UserId;

/// Errors raised by directory adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserDirectoryError {
    /// Repository connection could not be established.
    #[error("user directory connection failed: {message}")]
    Connection {
        /// Adapter-provided diagnostic.
        message: String,
    },
    /// Query failed during execution.
    #[error("user directory query failed: {message}")]
    Query {
        /// Adapter-provided diagnostic.
        message: String,
    },
}

impl UserDirectoryError {
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

/// Read-only port for account rows.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Whether the account carries the system-administrator flag.
    async fn is_sysadmin(&self, user_id: &UserId) -> Result<bool, UserDirectoryError>;
}

/// Fixture that grants admin to nobody.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureUserDirectory;

#[async_trait]
impl UserDirectory for FixtureUserDirectory {
    async fn is_sysadmin(&self, _user_id: &UserId) -> Result<bool, UserDirectoryError> {
        Ok(false)
    }
}
