//! Nourish shadow-pacing backend library modules.
//!
//! The crate follows a hexagonal layout: `domain` holds the pacing pipeline
//! and its ports, `inbound` exposes the HTTP adapter, and `outbound` holds
//! the Diesel persistence and push-delivery adapters.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
/// Request-scoped tracing middleware.
pub use middleware::trace::Trace;
