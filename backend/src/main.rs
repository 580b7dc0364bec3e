//! Backend entry-point: wires the pacing API, session middleware and
//! OpenAPI docs.

use std::env;
use std::net::SocketAddr;

use actix_web::cookie::{Key, SameSite};
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use nourish_backend::outbound::persistence::{DbPool, PoolConfig};
use nourish_backend::server::{ServerConfig, create_server};

fn session_key() -> std::io::Result<Key> {
    let key_path =
        env::var("SESSION_KEY_FILE").unwrap_or_else(|_| "/var/run/secrets/session_key".into());
    match std::fs::read(&key_path) {
        Ok(bytes) => Ok(Key::derive_from(&bytes)),
        Err(e) => {
            let allow_dev = env::var("SESSION_ALLOW_EPHEMERAL").ok().as_deref() == Some("1");
            if cfg!(debug_assertions) || allow_dev {
                warn!(path = %key_path, error = %e, "using temporary session key (dev only)");
                Ok(Key::generate())
            } else {
                Err(std::io::Error::other(format!(
                    "failed to read session key at {key_path}: {e}"
                )))
            }
        }
    }
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let database_url = env::var("DATABASE_URL")
        .map_err(|_| std::io::Error::other("DATABASE_URL must be set"))?;
    let pool = DbPool::new(PoolConfig::new(database_url))
        .await
        .map_err(|e| std::io::Error::other(format!("failed to build database pool: {e}")))?;

    let key = session_key()?;
    let cookie_secure = env::var("SESSION_COOKIE_SECURE")
        .map(|v| v != "0")
        .unwrap_or(true);
    let cron_secret = env::var("CRON_SECRET").ok().filter(|s| !s.is_empty());
    let default_timezone = env::var("DEFAULT_TIMEZONE").unwrap_or_else(|_| "Asia/Kolkata".into());
    let dev_mode = env::var("DEV_MODE").ok().as_deref() == Some("1");
    let bind_addr: SocketAddr = env::var("BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".into())
        .parse()
        .map_err(|e| std::io::Error::other(format!("invalid BIND_ADDR: {e}")))?;

    let config = ServerConfig::new(key, cookie_secure, SameSite::Lax, bind_addr, pool)
        .with_cron_secret(cron_secret)
        .with_default_timezone(default_timezone)
        .with_dev_mode(dev_mode);

    create_server(config)?.await
}
