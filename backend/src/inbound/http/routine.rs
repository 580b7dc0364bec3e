//! Ghost routine HTTP handlers.
//!
//! ```text
//! GET  /api/shadow/routine/dry-run/today    Preview today's ghost timetable
//! POST /api/shadow/routine/dry-run/today    Same preview, POST alias
//! POST /api/shadow/routine/duplicate/today  Materialise today's instances
//! ```

use actix_web::{get, post, web};

use crate::domain::{DryRunPlan, Error, MaterialiseOutcome};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Preview today's ghost timetable without writing anything.
#[utoipa::path(
    get,
    path = "/api/shadow/routine/dry-run/today",
    responses(
        (status = 200, description = "Planned timetable", body = DryRunPlan),
        (status = 400, description = "No shadow profile", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 503, description = "Service unavailable", body = Error)
    ),
    tags = ["routine"],
    operation_id = "dryRunToday",
    security(("SessionCookie" = []))
)]
#[get("/routine/dry-run/today")]
pub async fn dry_run_today(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<DryRunPlan>> {
    let user = session.require_user_id()?;
    Ok(web::Json(state.scheduler.dry_run_today(&user).await?))
}

/// POST alias kept for clients that cannot issue the GET.
#[utoipa::path(
    post,
    path = "/api/shadow/routine/dry-run/today",
    responses(
        (status = 200, description = "Planned timetable", body = DryRunPlan),
        (status = 400, description = "No shadow profile", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 503, description = "Service unavailable", body = Error)
    ),
    tags = ["routine"],
    operation_id = "dryRunTodayPost",
    security(("SessionCookie" = []))
)]
#[post("/routine/dry-run/today")]
pub async fn dry_run_today_post(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<DryRunPlan>> {
    let user = session.require_user_id()?;
    Ok(web::Json(state.scheduler.dry_run_today(&user).await?))
}

/// Materialise today's ghost instances for the authenticated user.
#[utoipa::path(
    post,
    path = "/api/shadow/routine/duplicate/today",
    responses(
        (status = 200, description = "Instances materialised", body = MaterialiseOutcome),
        (status = 400, description = "No shadow profile", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 503, description = "Service unavailable", body = Error)
    ),
    tags = ["routine"],
    operation_id = "duplicateToday",
    security(("SessionCookie" = []))
)]
#[post("/routine/duplicate/today")]
pub async fn duplicate_today(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<MaterialiseOutcome>> {
    let user = session.require_user_id()?;
    Ok(web::Json(state.scheduler.materialise_today(&user).await?))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test, web};
    use chrono::Duration;
    use serde_json::Value;
    use uuid::Uuid;

    use crate::domain::UserId;
    use crate::domain::ports::ShadowProfile;
    use crate::domain::schedule::{MirroredTask, TimeAnchor};
    use crate::inbound::http::test_utils::{TestPorts, frozen_now, login, test_session_middleware};

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

    fn mirror(title: &str, anchor: TimeAnchor, hint: i32) -> MirroredTask {
        MirroredTask {
            shadow_task_id: Uuid::new_v4(),
            title: title.to_owned(),
            anchor: Some(anchor),
            order_hint: Some(hint),
            created_at: frozen_now() - Duration::days(3),
        }
    }

    #[actix_web::test]
    async fn dry_run_without_profile_is_a_bad_request() {
        let mut ports = TestPorts::default();
        ports
            .shadow_tasks
            .expect_profile_for_user()
            .returning(|_| Ok(None));

        let app = actix_test::init_service(test_app(ports)).await;
        let cookie = login(&app, &UserId::random()).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/shadow/routine/dry-run/today")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn dry_run_lists_slots_in_timetable_order() {
        let user = UserId::random();
        let profile = ShadowProfile {
            id: Uuid::new_v4(),
            user_id: user.clone(),
        };

        let mut ports = TestPorts::default();
        let returned = profile.clone();
        ports
            .shadow_tasks
            .expect_profile_for_user()
            .returning(move |_| Ok(Some(returned.clone())));
        ports.shadow_tasks.expect_active_mirrors().returning(|_| {
            Ok(vec![
                mirror("Evening stretch", TimeAnchor::Evening, 1),
                mirror("Morning pages", TimeAnchor::Morning, 1),
            ])
        });

        let app = actix_test::init_service(test_app(ports)).await;
        let cookie = login(&app, &user).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/shadow/routine/dry-run/today")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["plannedDateLocal"], "2025-06-01");
        let slots = body["slots"].as_array().expect("slots array");
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0]["title"], "Morning pages");
        assert_eq!(slots[1]["title"], "Evening stretch");
    }

    #[actix_web::test]
    async fn duplicate_reports_created_instances() {
        let user = UserId::random();
        let profile = ShadowProfile {
            id: Uuid::new_v4(),
            user_id: user.clone(),
        };

        let mut ports = TestPorts::default();
        let returned = profile.clone();
        ports
            .shadow_tasks
            .expect_profile_for_user()
            .returning(move |_| Ok(Some(returned.clone())));
        ports
            .shadow_tasks
            .expect_active_mirrors()
            .returning(|_| Ok(vec![mirror("Morning pages", TimeAnchor::Morning, 1)]));
        ports
            .shadow_tasks
            .expect_insert_instances()
            .returning(|instances| Ok(instances.len()));

        let app = actix_test::init_service(test_app(ports)).await;
        let cookie = login(&app, &user).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/shadow/routine/duplicate/today")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["createdInstances"], 1);
        assert_eq!(body["totalCandidates"], 1);
    }
}
