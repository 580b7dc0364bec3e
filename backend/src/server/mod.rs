//! Server construction and middleware wiring.

mod config;

pub use config::ServerConfig;

use std::sync::Arc;

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use crate::Trace;
#[cfg(debug_assertions)]
use crate::doc::ApiDoc;
use crate::domain::{AccessLevel, PacingDeps, PacingService, SchedulerService};
use crate::inbound::http;
use crate::inbound::http::state::HttpState;
use crate::outbound::HttpPushDelivery;
use crate::outbound::persistence::{
    DbPool, DieselAuditLog, DieselCommitRepository, DieselCompletionRepository,
    DieselMessageRepository, DieselPreferencesRepository, DieselShadowConfigRepository,
    DieselShadowTaskRepository, DieselTaskRepository, DieselUserDirectory,
};

/// Build the shared HTTP state from the Diesel adapters.
///
/// Commit and aggregate writes carry a per-call [`AccessLevel`] chosen by
/// the run trigger; the audit log always writes as the service. Per-request
/// scoping is enforced by the session extractor and the admin/cron guards
/// above it.
fn build_http_state(config: &ServerConfig) -> HttpState {
    let pool = config.db_pool.clone();
    let preferences = Arc::new(DieselPreferencesRepository::new(pool.clone()));
    let shadow_tasks = Arc::new(DieselShadowTaskRepository::new(pool.clone()));
    let clock: Arc<dyn mockable::Clock> = Arc::new(mockable::DefaultClock);

    let pacing = PacingService::new(PacingDeps {
        config: Arc::new(DieselShadowConfigRepository::new(pool.clone())),
        preferences: preferences.clone(),
        completions: Arc::new(DieselCompletionRepository::new(pool.clone())),
        tasks: Arc::new(DieselTaskRepository::new(pool.clone())),
        commits: Arc::new(DieselCommitRepository::new(pool.clone())),
        messages: Arc::new(DieselMessageRepository::new(pool.clone())),
        audit: Arc::new(DieselAuditLog::new(pool.clone(), AccessLevel::Service)),
        push: Arc::new(HttpPushDelivery::new(pool.clone())),
        shadow_tasks: shadow_tasks.clone(),
        clock: clock.clone(),
        default_tz: config.default_timezone.clone(),
    });

    let scheduler = SchedulerService::new(
        shadow_tasks,
        preferences,
        clock,
        config.default_timezone.clone(),
    );

    HttpState {
        pacing: Arc::new(pacing),
        scheduler: Arc::new(scheduler),
        directory: Arc::new(DieselUserDirectory::new(pool)),
        cron_secret: config.cron_secret.clone(),
        dev_mode: config.dev_mode,
    }
}

#[derive(Clone)]
struct AppDependencies {
    http_state: web::Data<HttpState>,
    key: Key,
    cookie_secure: bool,
    same_site: SameSite,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        http_state,
        key,
        cookie_secure,
        same_site,
    } = deps;

    let session = SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(same_site)
        .session_lifecycle(
            PersistentSession::default().session_ttl(actix_web::cookie::time::Duration::hours(2)),
        )
        .build();

    let app = App::new()
        .app_data(http_state)
        .wrap(session)
        .wrap(Trace)
        .configure(http::configure);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    #[cfg(not(debug_assertions))]
    let app = app;

    app
}

/// Construct an Actix HTTP server from the provided configuration.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(config: ServerConfig) -> std::io::Result<Server> {
    let http_state = web::Data::new(build_http_state(&config));
    let ServerConfig {
        key,
        cookie_secure,
        same_site,
        bind_addr,
        ..
    } = config;

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            http_state: http_state.clone(),
            key: key.clone(),
            cookie_secure,
            same_site,
        })
    })
    .bind(bind_addr)?
    .run();

    Ok(server)
}
