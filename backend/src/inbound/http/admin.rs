//! Administrator batch HTTP handlers.
//!
//! ```text
//! POST /api/admin/shadow/run-today-all  Run the pipeline for every racer
//! ```

use actix_web::{post, web};

use crate::domain::ports::UserDirectoryError;
use crate::domain::{Error, RunTrigger, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::wire::BatchRunResponse;

/// Require the system-administrator flag, relaxed in dev mode.
async fn ensure_admin(state: &HttpState, user: &UserId) -> Result<(), Error> {
    if state.dev_mode {
        return Ok(());
    }
    let is_admin = state
        .directory
        .is_sysadmin(user)
        .await
        .map_err(map_directory_error)?;
    if is_admin {
        Ok(())
    } else {
        Err(Error::forbidden("administrator access required"))
    }
}

fn map_directory_error(err: UserDirectoryError) -> Error {
    tracing::error!(error = %err, "user directory failure");
    match err {
        UserDirectoryError::Connection { .. } => {
            Error::service_unavailable("user directory unavailable")
        }
        UserDirectoryError::Query { .. } => Error::internal("user directory query failed"),
    }
}

/// Run the pacing pipeline for every racer on behalf of an administrator.
#[utoipa::path(
    post,
    path = "/api/admin/shadow/run-today-all",
    responses(
        (status = 200, description = "Per-user batch report", body = BatchRunResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Not an administrator", body = Error),
        (status = 503, description = "Service unavailable", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminRunTodayAll",
    security(("SessionCookie" = []))
)]
#[post("/run-today-all")]
pub async fn run_today_all(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<BatchRunResponse>> {
    let user = session.require_user_id()?;
    ensure_admin(&state, &user).await?;
    let report = state.pacing.run_batch(RunTrigger::AdminBatch).await?;
    Ok(web::Json(report.into()))
}
