//! Port for reading user preferences relevant to pacing (timezone).

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::UserId;

/// Errors raised by preferences adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreferencesRepositoryError {
    /// Repository connection could not be established.
    #[error("preferences repository connection failed: {message}")]
    Connection {
        /// Adapter-provided diagnostic.
        message: String,
    },
    /// Query failed during execution.
    #[error("preferences repository query failed: {message}")]
    Query {
        /// Adapter-provided diagnostic.
        message: String,
    },
}

impl PreferencesRepositoryError {
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

/// Read-only port for the slice of user preferences the pipeline needs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PreferencesRepository: Send + Sync {
    /// The user's stored IANA timezone name, if any.
    async fn timezone_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<String>, PreferencesRepositoryError>;
}

/// Fixture reporting no stored preference.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePreferencesRepository;

#[async_trait]
impl PreferencesRepository for FixturePreferencesRepository {
    async fn timezone_for_user(
        &self,
        _user_id: &UserId,
    ) -> Result<Option<String>, PreferencesRepositoryError> {
        Ok(None)
    }
}
