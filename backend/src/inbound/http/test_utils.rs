//! Test helpers for the HTTP adapter.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::Key;
use mockable::MockClock;
use chrono::{DateTime, TimeZone, Utc};

use crate::domain::ports::{
    FixtureAuditLog, FixturePreferencesRepository, FixtureShadowConfigRepository,
    FixtureUserDirectory, MockCommitRepository, MockCompletionRepository, MockMessageRepository,
    MockShadowConfigRepository, MockShadowTaskRepository, MockTaskRepository, NoOpPushDelivery,
    ShadowConfigRepository,
};
use crate::domain::{PacingDeps, PacingService, SchedulerService, ShadowConfig};
use crate::inbound::http::state::HttpState;

/// Open a dev session for `user` and return the resulting cookie.
pub async fn login(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
    user: &crate::domain::UserId,
) -> actix_web::cookie::Cookie<'static> {
    let request = actix_web::test::TestRequest::post()
        .uri("/api/dev/session")
        .set_json(serde_json::json!({ "userId": user.to_string() }))
        .to_request();
    let response = actix_web::test::call_service(app, request).await;
    assert!(response.status().is_success(), "dev session denied");
    response
        .response()
        .cookies()
        .find(|c| c.name() == "session")
        .expect("session cookie")
        .into_owned()
}

/// Session middleware configured for plain-HTTP tests: fresh key, cookie
/// named `session`, `Secure` off.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Instant every test clock reports.
pub fn frozen_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 14, 5, 0)
        .single()
        .expect("valid instant")
}

fn frozen_clock() -> Arc<MockClock> {
    let mut clock = MockClock::new();
    clock.expect_utc().return_const(frozen_now());
    Arc::new(clock)
}

/// Mutable mock bundle for shaping handler tests.
///
/// Configure expectations on the mocks, then call [`TestPorts::into_state`].
/// Defaults: fixture config (race on, default pace), no stored timezone, no
/// push, no audit, nobody is an admin.
pub struct TestPorts {
    pub completions: MockCompletionRepository,
    pub tasks: MockTaskRepository,
    pub commits: MockCommitRepository,
    pub messages: MockMessageRepository,
    pub shadow_tasks: MockShadowTaskRepository,
    pub race_enabled: bool,
    pub cron_secret: Option<String>,
    pub dev_mode: bool,
}

impl Default for TestPorts {
    fn default() -> Self {
        Self {
            completions: MockCompletionRepository::new(),
            tasks: MockTaskRepository::new(),
            commits: MockCommitRepository::new(),
            messages: MockMessageRepository::new(),
            shadow_tasks: MockShadowTaskRepository::new(),
            race_enabled: true,
            cron_secret: None,
            dev_mode: true,
        }
    }
}

impl TestPorts {
    /// Build the HTTP state over the configured mocks.
    pub fn into_state(self) -> HttpState {
        let config: Arc<dyn ShadowConfigRepository> = if self.race_enabled {
            Arc::new(FixtureShadowConfigRepository)
        } else {
            let mut config = MockShadowConfigRepository::new();
            config.expect_config_for_user().returning(|_| {
                Ok(ShadowConfig {
                    enabled_race: false,
                    ..ShadowConfig::default()
                })
            });
            Arc::new(config)
        };
        let shadow_tasks = Arc::new(self.shadow_tasks);
        let pacing = PacingService::new(PacingDeps {
            config,
            preferences: Arc::new(FixturePreferencesRepository),
            completions: Arc::new(self.completions),
            tasks: Arc::new(self.tasks),
            commits: Arc::new(self.commits),
            messages: Arc::new(self.messages),
            audit: Arc::new(FixtureAuditLog),
            push: Arc::new(NoOpPushDelivery),
            shadow_tasks: shadow_tasks.clone(),
            clock: frozen_clock(),
            default_tz: "UTC".to_owned(),
        });
        let scheduler = SchedulerService::new(
            shadow_tasks,
            Arc::new(FixturePreferencesRepository),
            frozen_clock(),
            "UTC",
        );
        HttpState {
            pacing: Arc::new(pacing),
            scheduler: Arc::new(scheduler),
            directory: Arc::new(FixtureUserDirectory),
            cron_secret: self.cron_secret,
            dev_mode: self.dev_mode,
        }
    }
}
