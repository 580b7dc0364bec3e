//! Progress commit HTTP handlers.
//!
//! ```text
//! GET  /api/shadow/progress/commit     Read back today's commit
//! POST /api/shadow/progress/commit     Commit today's progress explicitly
//! POST /api/shadow/progress/run-today  Run the pacing pipeline once
//! ```

use actix_web::{get, post, web};
use serde_json::Value;

use crate::domain::{Error, RunTrigger};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::wire::{
    CommitRequest, CommitResponse, RunTodayResponse, TodayCommitResponse,
};

/// Read back today's commit for the authenticated user.
#[utoipa::path(
    get,
    path = "/api/shadow/progress/commit",
    responses(
        (status = 200, description = "Today's commit, if any", body = TodayCommitResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 503, description = "Service unavailable", body = Error)
    ),
    tags = ["progress"],
    operation_id = "todayCommit",
    security(("SessionCookie" = []))
)]
#[get("/progress/commit")]
pub async fn today_commit(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<TodayCommitResponse>> {
    let user = session.require_user_id()?;
    let today = state.pacing.today_commit(&user).await?;
    Ok(web::Json(today.into()))
}

/// Commit today's progress explicitly.
///
/// Only the body's `payload` field is read; its entries are merged into
/// the commit's audit payload and must form a JSON object when present.
#[utoipa::path(
    post,
    path = "/api/shadow/progress/commit",
    request_body = Option<CommitRequest>,
    responses(
        (status = 200, description = "Commit written", body = CommitResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 503, description = "Service unavailable", body = Error)
    ),
    tags = ["progress"],
    operation_id = "commitToday",
    security(("SessionCookie" = []))
)]
#[post("/progress/commit")]
pub async fn commit_today(
    state: web::Data<HttpState>,
    session: SessionContext,
    body: Option<web::Json<CommitRequest>>,
) -> ApiResult<web::Json<CommitResponse>> {
    let user = session.require_user_id()?;
    let extra = match body.and_then(|b| b.into_inner().payload) {
        Some(value) => {
            if !value.is_object() && !value.is_null() {
                return Err(Error::invalid_request("payload must be a JSON object"));
            }
            value
        }
        None => Value::Null,
    };
    let commit = state.pacing.commit_today(&user, extra).await?;
    Ok(web::Json(commit.into()))
}

/// Run the pacing pipeline once for the authenticated user.
#[utoipa::path(
    post,
    path = "/api/shadow/progress/run-today",
    responses(
        (status = 200, description = "Pipeline outcome", body = RunTodayResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 503, description = "Service unavailable", body = Error)
    ),
    tags = ["progress"],
    operation_id = "runToday",
    security(("SessionCookie" = []))
)]
#[post("/progress/run-today")]
pub async fn run_today(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<RunTodayResponse>> {
    let user = session.require_user_id()?;
    let outcome = state
        .pacing
        .run_cycle(&user, RunTrigger::Interactive)
        .await?;
    Ok(web::Json(outcome.into()))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test, web};
    use rstest::rstest;
    use serde_json::{Value, json};
    use uuid::Uuid;

    use crate::domain::UserId;
    use crate::domain::ports::NudgeInsert;
    use crate::inbound::http::test_utils::{TestPorts, login, test_session_middleware};

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

    #[actix_web::test]
    async fn run_today_requires_a_session() {
        let app = actix_test::init_service(test_app(TestPorts::default())).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/shadow/progress/run-today")
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn run_today_reports_flat_snake_case_fields() {
        let mut ports = TestPorts::default();
        ports
            .completions
            .expect_completions_for_day()
            .returning(|_, _| Ok(vec![]));
        ports
            .tasks
            .expect_filter_user_owned()
            .returning(|ids| Ok(ids.to_vec()));
        ports
            .commits
            .expect_upsert_commit()
            .returning(|_, _| Ok(()));
        ports
            .commits
            .expect_upsert_daily()
            .returning(|_, _| Ok(()));
        ports
            .messages
            .expect_messages_for_day()
            .returning(|_, _| Ok(vec![]));
        ports
            .messages
            .expect_insert_nudge()
            .returning(|_| Ok(NudgeInsert::Inserted(Uuid::new_v4())));

        let app = actix_test::init_service(test_app(ports)).await;
        let cookie = login(&app, &UserId::random()).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/shadow/progress/run-today")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["ok"], true);
        // Zero completions against the default target of three.
        assert_eq!(body["delta"], -3);
        assert_eq!(body["target_today"], 3);
        assert_eq!(body["completed_today"], 0);
        assert_eq!(body["decision_kind"], "slowdown");
        assert_eq!(body["nudged"], true);
        assert_eq!(body["title"], "It's okay to slow down");
        assert!(body.get("nudge").is_none(), "no nested nudge object");
        assert!(body.get("decisionKind").is_none(), "no camelCase keys");
    }

    #[actix_web::test]
    async fn run_today_refuses_a_disabled_race_with_just_the_reason() {
        let mut ports = TestPorts::default();
        ports.race_enabled = false;

        let app = actix_test::init_service(test_app(ports)).await;
        let cookie = login(&app, &UserId::random()).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/shadow/progress/run-today")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body, json!({ "ok": false, "reason": "race_disabled" }));
    }

    #[actix_web::test]
    async fn get_commit_returns_empty_context_before_any_run() {
        let mut ports = TestPorts::default();
        ports
            .commits
            .expect_find_commit()
            .returning(|_, _| Ok(None));

        let app = actix_test::init_service(test_app(ports)).await;
        let cookie = login(&app, &UserId::random()).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/shadow/progress/commit")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["day"], "2025-06-01");
        assert_eq!(body["tz"], "UTC");
        assert!(body["commit"].is_null(), "commit travels as explicit null");
    }

    #[rstest]
    #[case(json!({ "payload": [1, 2, 3] }))]
    #[case(json!({ "payload": "just a string" }))]
    #[actix_web::test]
    async fn post_commit_rejects_non_object_payloads(#[case] body: Value) {
        let app = actix_test::init_service(test_app(TestPorts::default())).await;
        let cookie = login(&app, &UserId::random()).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/shadow/progress/commit")
                .cookie(cookie)
                .set_json(body)
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn post_commit_merges_only_the_payload_field() {
        let mut ports = TestPorts::default();
        ports
            .completions
            .expect_completions_for_day()
            .returning(|_, _| Ok(vec![]));
        ports
            .tasks
            .expect_filter_user_owned()
            .returning(|ids| Ok(ids.to_vec()));
        ports
            .commits
            .expect_upsert_commit()
            .returning(|_, _| Ok(()));
        ports
            .commits
            .expect_upsert_daily()
            .returning(|_, _| Ok(()));

        let app = actix_test::init_service(test_app(ports)).await;
        let cookie = login(&app, &UserId::random()).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/shadow/progress/commit")
                .cookie(cookie)
                .set_json(json!({
                    "payload": { "note": "early finish" },
                    "note": "sibling fields are ignored"
                }))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["ok"], true);
        assert_eq!(body["payload"]["note"], "early finish");
        assert_eq!(body["payload"]["source"], "manual_commit");
        assert_eq!(body["decision_kind"], "slowdown");
        assert!(body.get("commit").is_none(), "flattened, not nested");
    }

    #[actix_web::test]
    async fn post_commit_works_without_a_body() {
        let mut ports = TestPorts::default();
        ports
            .completions
            .expect_completions_for_day()
            .returning(|_, _| Ok(vec![]));
        ports
            .tasks
            .expect_filter_user_owned()
            .returning(|ids| Ok(ids.to_vec()));
        ports
            .commits
            .expect_upsert_commit()
            .returning(|_, _| Ok(()));
        ports
            .commits
            .expect_upsert_daily()
            .returning(|_, _| Ok(()));

        let app = actix_test::init_service(test_app(ports)).await;
        let cookie = login(&app, &UserId::random()).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/shadow/progress/commit")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["payload"]["source"], "manual_commit");
    }
}
