//! Scheduled-job HTTP handlers.
//!
//! ```text
//! POST /api/cron/shadow/run-today-all              Cohort pacing sweep
//! POST /api/cron/shadow/generate-events-today-all  Cohort ghost materialisation
//! ```
//!
//! Both endpoints authenticate with a shared secret carried in the
//! `x-cron-secret` header or a `?secret=` query parameter. A deployment
//! without a configured secret keeps them sealed.

use actix_web::{HttpRequest, post, web};
use serde::Deserialize;

use crate::domain::{Error, RunTrigger};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::wire::{BatchRunResponse, MaterialiseBatchResponse};

/// Header carrying the shared cron secret.
pub const CRON_SECRET_HEADER: &str = "x-cron-secret";

/// Query-string fallback for schedulers that cannot set headers.
#[derive(Debug, Deserialize)]
pub struct CronQuery {
    /// Shared secret; checked only when the header is absent.
    pub secret: Option<String>,
}

fn authorise(req: &HttpRequest, query: &CronQuery, expected: Option<&str>) -> Result<(), Error> {
    let Some(expected) = expected.filter(|secret| !secret.is_empty()) else {
        return Err(Error::forbidden("cron endpoints are not configured"));
    };
    let presented = req
        .headers()
        .get(CRON_SECRET_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .or_else(|| query.secret.clone());
    match presented {
        Some(ref secret) if secret == expected => Ok(()),
        _ => Err(Error::forbidden("invalid cron secret")),
    }
}

/// Run the pacing pipeline for every racer, with extended metrics.
#[utoipa::path(
    post,
    path = "/api/cron/shadow/run-today-all",
    params(("secret" = Option<String>, Query, description = "Shared cron secret")),
    responses(
        (status = 200, description = "Per-user batch report", body = BatchRunResponse),
        (status = 403, description = "Missing or invalid secret", body = Error),
        (status = 503, description = "Service unavailable", body = Error)
    ),
    tags = ["cron"],
    operation_id = "cronRunTodayAll"
)]
#[post("/run-today-all")]
pub async fn run_today_all(
    state: web::Data<HttpState>,
    req: HttpRequest,
    query: web::Query<CronQuery>,
) -> ApiResult<web::Json<BatchRunResponse>> {
    authorise(&req, &query, state.cron_secret.as_deref())?;
    let report = state.pacing.run_batch(RunTrigger::CronBatch).await?;
    Ok(web::Json(report.into()))
}

/// Materialise today's ghost instances for every shadow profile.
#[utoipa::path(
    post,
    path = "/api/cron/shadow/generate-events-today-all",
    params(("secret" = Option<String>, Query, description = "Shared cron secret")),
    responses(
        (status = 200, description = "Per-profile batch report", body = MaterialiseBatchResponse),
        (status = 403, description = "Missing or invalid secret", body = Error),
        (status = 503, description = "Service unavailable", body = Error)
    ),
    tags = ["cron"],
    operation_id = "cronGenerateEventsTodayAll"
)]
#[post("/generate-events-today-all")]
pub async fn generate_events_today_all(
    state: web::Data<HttpState>,
    req: HttpRequest,
    query: web::Query<CronQuery>,
) -> ApiResult<web::Json<MaterialiseBatchResponse>> {
    authorise(&req, &query, state.cron_secret.as_deref())?;
    let report = state.scheduler.materialise_all().await?;
    Ok(web::Json(report.into()))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test, web};
    use rstest::rstest;
    use serde_json::Value;

    use crate::inbound::http::test_utils::{TestPorts, test_session_middleware};

    use super::CRON_SECRET_HEADER;

    fn test_app(
        ports: TestPorts,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(web::Data::new(ports.into_state()))
            .wrap(test_session_middleware())
            .configure(crate::inbound::http::configure)
    }

    fn secured() -> TestPorts {
        TestPorts {
            cron_secret: Some("tick-tock".to_owned()),
            ..TestPorts::default()
        }
    }

    #[rstest]
    #[case::no_secret(None)]
    #[case::wrong_secret(Some("wrong"))]
    #[actix_web::test]
    async fn sweep_rejects_bad_secrets(#[case] header: Option<&str>) {
        let app = actix_test::init_service(test_app(secured())).await;
        let mut request = actix_test::TestRequest::post().uri("/api/cron/shadow/run-today-all");
        if let Some(value) = header {
            request = request.insert_header((CRON_SECRET_HEADER, value));
        }
        let response = actix_test::call_service(&app, request.to_request()).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn unconfigured_deployments_keep_the_endpoints_sealed() {
        // Default TestPorts carries no secret at all.
        let app = actix_test::init_service(test_app(TestPorts::default())).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/cron/shadow/run-today-all")
                .insert_header((CRON_SECRET_HEADER, "anything"))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn header_secret_authorises_the_sweep() {
        let app = actix_test::init_service(test_app(secured())).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/cron/shadow/run-today-all")
                .insert_header((CRON_SECRET_HEADER, "tick-tock"))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["ok"], true);
        assert_eq!(body["total"], 0);
        assert_eq!(body["results"], Value::Array(vec![]));
    }

    #[actix_web::test]
    async fn query_secret_authorises_the_sweep() {
        let mut ports = secured();
        ports.shadow_tasks.expect_profiles().returning(|| Ok(vec![]));
        let app = actix_test::init_service(test_app(ports)).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/cron/shadow/generate-events-today-all?secret=tick-tock")
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
