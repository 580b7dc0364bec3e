//! User identity newtype shared across the pacing pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validated user identifier (UUID).
///
/// # Examples
/// ```
/// use nourish_backend::domain::UserId;
///
/// let id = UserId::new("3fa85f64-5717-4562-b3fc-2c963f66afa6").expect("valid id");
/// assert_eq!(id.to_string(), "3fa85f64-5717-4562-b3fc-2c963f66afa6");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Parse a user id from its string form.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, uuid::Error> {
        Uuid::parse_str(raw.as_ref()).map(Self)
    }

    /// Wrap an already-parsed UUID.
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a random id, mainly for tests and fixtures.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Borrow the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<Uuid> for UserId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("not-a-uuid")]
    #[case("")]
    fn rejects_malformed_ids(#[case] raw: &str) {
        assert!(UserId::new(raw).is_err());
    }

    #[rstest]
    fn round_trips_through_uuid() {
        let id = UserId::random();
        let reparsed = UserId::new(id.to_string()).expect("round trip");
        assert_eq!(id, reparsed);
    }
}
