//! Port for reading per-user shadow configuration.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{ShadowConfig, UserId};

/// Errors raised by shadow config adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShadowConfigRepositoryError {
    /// Repository connection could not be established.
    #[error("shadow config repository connection failed: {message}")]
    Connection {
        /// Adapter-provided diagnostic.
        message: String,
    },
    /// Query failed during execution.
    #[error("shadow config repository query failed: {message}")]
    Query {
        /// Adapter-provided diagnostic.
        message: String,
    },
}

impl ShadowConfigRepositoryError {
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

/// Read-only port for shadow configuration.
///
/// Adapters resolve null fields to [`ShadowConfig::default`] values and must
/// return defaults (not an error) for users without a config row.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShadowConfigRepository: Send + Sync {
    /// Effective configuration for one user, defaults applied.
    async fn config_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<ShadowConfig, ShadowConfigRepositoryError>;

    /// All users with `enabled_race = true`, the batch candidate set.
    async fn racers(&self) -> Result<Vec<UserId>, ShadowConfigRepositoryError>;
}

/// Fixture returning defaults and an empty racer set.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureShadowConfigRepository;

#[async_trait]
impl ShadowConfigRepository for FixtureShadowConfigRepository {
    async fn config_for_user(
        &self,
        _user_id: &UserId,
    ) -> Result<ShadowConfig, ShadowConfigRepositoryError> {
        Ok(ShadowConfig::default())
    }

    async fn racers(&self) -> Result<Vec<UserId>, ShadowConfigRepositoryError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn fixture_returns_defaults() {
        let repo = FixtureShadowConfigRepository;
        let cfg = repo
            .config_for_user(&UserId::random())
            .await
            .expect("fixture lookup succeeds");
        assert_eq!(cfg, ShadowConfig::default());
        assert!(repo.racers().await.expect("fixture list succeeds").is_empty());
    }

    #[rstest]
    fn error_helpers_format_message() {
        let err = ShadowConfigRepositoryError::query("bad sql");
        assert!(err.to_string().contains("bad sql"));
    }
}
