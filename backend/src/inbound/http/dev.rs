//! Development-only session endpoint.
//!
//! ```text
//! POST /api/dev/session  Open a session for an arbitrary user id
//! ```
//!
//! In production the session cookie is issued by the main application's
//! auth flow; this endpoint exists so local development and tests can mint
//! one. Outside dev mode it does not exist as far as clients can tell.

use actix_web::{HttpResponse, post, web};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::{Error, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Dev session request body.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpenSessionRequest {
    /// User to impersonate.
    #[schema(format = "uuid")]
    pub user_id: String,
}

/// Open a session for the given user id (dev mode only).
#[utoipa::path(
    post,
    path = "/api/dev/session",
    request_body = OpenSessionRequest,
    responses(
        (status = 204, description = "Session cookie issued"),
        (status = 400, description = "Invalid user id", body = Error),
        (status = 404, description = "Not running in dev mode", body = Error)
    ),
    tags = ["dev"],
    operation_id = "openDevSession"
)]
#[post("/session")]
pub async fn open_session(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<OpenSessionRequest>,
) -> ApiResult<HttpResponse> {
    if !state.dev_mode {
        return Err(Error::not_found("not found"));
    }
    let user = UserId::new(&payload.user_id)
        .map_err(|_| Error::invalid_request("userId must be a UUID"))?;
    session.persist_user(&user)?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test, web};
    use serde_json::json;

    use crate::inbound::http::test_utils::{TestPorts, test_session_middleware};

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
    async fn issues_a_cookie_in_dev_mode() {
        let app = actix_test::init_service(test_app(TestPorts::default())).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/dev/session")
                .set_json(json!({ "userId": "7b1c4c22-92d0-4f0b-8f0e-2f3f9af1a001" }))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(
            response
                .response()
                .cookies()
                .any(|cookie| cookie.name() == "session")
        );
    }

    #[actix_web::test]
    async fn hides_itself_outside_dev_mode() {
        let ports = TestPorts {
            dev_mode: false,
            ..TestPorts::default()
        };
        let app = actix_test::init_service(test_app(ports)).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/dev/session")
                .set_json(json!({ "userId": "7b1c4c22-92d0-4f0b-8f0e-2f3f9af1a001" }))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn rejects_malformed_user_ids() {
        let app = actix_test::init_service(test_app(TestPorts::default())).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/dev/session")
                .set_json(json!({ "userId": "not-a-uuid" }))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
