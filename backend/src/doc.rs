//! OpenAPI documentation configuration.
//!
//! Defines the [`ApiDoc`] struct which generates the OpenAPI specification
//! for the shadow pacing API. It registers the HTTP paths from the inbound
//! layer, the domain response schemas, and the session cookie security
//! scheme. The generated specification backs Swagger UI in debug builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::decision::DecisionKind;
use crate::domain::{DryRunPlan, Error, ErrorCode, GateReason, MaterialiseOutcome};
use crate::inbound::http::dev::OpenSessionRequest;
use crate::inbound::http::wire::{
    BatchRunEntry, BatchRunResponse, CommitBody, CommitRequest, CommitResponse,
    MaterialiseBatchEntry, MaterialiseBatchResponse, RunTodayResponse, TodayCommitResponse,
};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by the main application's auth flow.",
            ))),
        );
    }
}

/// OpenAPI document for the shadow pacing API.
/// Swagger UI is enabled in debug builds only.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Nourish shadow pacing API",
        description = "Pacing pipeline, ghost scheduling and progress commits."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::progress::today_commit,
        crate::inbound::http::progress::commit_today,
        crate::inbound::http::progress::run_today,
        crate::inbound::http::routine::dry_run_today,
        crate::inbound::http::routine::dry_run_today_post,
        crate::inbound::http::routine::duplicate_today,
        crate::inbound::http::admin::run_today_all,
        crate::inbound::http::cron::run_today_all,
        crate::inbound::http::cron::generate_events_today_all,
        crate::inbound::http::dev::open_session,
    ),
    components(schemas(
        Error,
        ErrorCode,
        DecisionKind,
        GateReason,
        RunTodayResponse,
        CommitRequest,
        CommitBody,
        CommitResponse,
        TodayCommitResponse,
        BatchRunEntry,
        BatchRunResponse,
        MaterialiseBatchEntry,
        MaterialiseBatchResponse,
        DryRunPlan,
        MaterialiseOutcome,
        OpenSessionRequest,
    )),
    tags(
        (name = "progress", description = "Progress commits and pacing runs"),
        (name = "routine", description = "Ghost routine planning"),
        (name = "admin", description = "Administrator batch operations"),
        (name = "cron", description = "Scheduled-job entry points"),
        (name = "dev", description = "Development-only helpers")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use utoipa::OpenApi;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    use super::*;

    /// Assert that an Object schema contains a field with the given name.
    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[test]
    fn openapi_error_schema_has_required_fields() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let error_schema = schemas.get("Error").expect("Error schema");

        assert_object_schema_has_field(error_schema, "code");
        assert_object_schema_has_field(error_schema, "message");
    }

    #[test]
    fn openapi_run_today_schema_uses_snake_case_fields() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let schema = schemas
            .get("RunTodayResponse")
            .expect("RunTodayResponse schema");

        assert_object_schema_has_field(schema, "ok");
        assert_object_schema_has_field(schema, "decision_kind");
        assert_object_schema_has_field(schema, "target_today");
        assert_object_schema_has_field(schema, "completed_today");
        assert_object_schema_has_field(schema, "nudged");
    }

    #[test]
    fn openapi_lists_every_pacing_path() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/shadow/progress/commit",
            "/api/shadow/progress/run-today",
            "/api/shadow/routine/dry-run/today",
            "/api/shadow/routine/duplicate/today",
            "/api/admin/shadow/run-today-all",
            "/api/cron/shadow/run-today-all",
            "/api/cron/shadow/generate-events-today-all",
        ] {
            assert!(
                doc.paths.paths.contains_key(path),
                "missing path '{path}' in OpenAPI document"
            );
        }
    }
}
