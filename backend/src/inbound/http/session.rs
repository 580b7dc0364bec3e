//! Cookie-session wrapper keeping handlers free of framework plumbing.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;

use crate::domain::{Error, UserId};

pub(crate) const USER_ID_KEY: &str = "user_id";

/// Domain-flavoured view of the Actix session.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Wrap the underlying session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Store the authenticated user's id in the session cookie.
    pub fn persist_user(&self, user_id: &UserId) -> Result<(), Error> {
        self.0
            .insert(USER_ID_KEY, user_id.to_string())
            .map_err(|err| Error::internal(format!("failed to persist session: {err}")))
    }

    /// The authenticated user, or `401` when the cookie is absent or holds
    /// something that no longer parses as a user id.
    pub fn require_user_id(&self) -> Result<UserId, Error> {
        let raw = self
            .0
            .get::<String>(USER_ID_KEY)
            .map_err(|err| Error::internal(format!("failed to read session: {err}")))?;
        let Some(raw) = raw else {
            return Err(Error::unauthorized("login required"));
        };
        UserId::new(&raw).map_err(|err| {
            tracing::warn!(error = %err, "session cookie holds an invalid user id");
            Error::unauthorized("login required")
        })
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
