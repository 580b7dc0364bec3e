//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

use actix_web::cookie::{Key, SameSite};

use crate::outbound::persistence::DbPool;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: DbPool,
    pub(crate) cron_secret: Option<String>,
    pub(crate) default_timezone: String,
    pub(crate) dev_mode: bool,
}

impl ServerConfig {
    /// Construct a server configuration using application preferences.
    #[must_use]
    pub fn new(
        key: Key,
        cookie_secure: bool,
        same_site: SameSite,
        bind_addr: SocketAddr,
        db_pool: DbPool,
    ) -> Self {
        Self {
            key,
            cookie_secure,
            same_site,
            bind_addr,
            db_pool,
            cron_secret: None,
            default_timezone: "Asia/Kolkata".to_owned(),
            dev_mode: false,
        }
    }

    /// Attach the shared secret guarding the cron endpoints.
    ///
    /// Without one the cron endpoints stay sealed.
    #[must_use]
    pub fn with_cron_secret(mut self, secret: Option<String>) -> Self {
        self.cron_secret = secret;
        self
    }

    /// Override the server-wide default timezone.
    #[must_use]
    pub fn with_default_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.default_timezone = timezone.into();
        self
    }

    /// Enable dev mode: the dev session endpoint opens and the admin gate
    /// relaxes.
    #[must_use]
    pub fn with_dev_mode(mut self, dev_mode: bool) -> Self {
        self.dev_mode = dev_mode;
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
