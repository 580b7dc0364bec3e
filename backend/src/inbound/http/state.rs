//! Shared HTTP adapter state.
//!
//! Handlers receive this via `actix_web::web::Data` so they depend only on
//! the domain services and stay testable without I/O.

use std::sync::Arc;

use crate::domain::ports::UserDirectory;
use crate::domain::{PacingService, SchedulerService};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// The pacing pipeline.
    pub pacing: Arc<PacingService>,
    /// Ghost timetable planning.
    pub scheduler: Arc<SchedulerService>,
    /// Account lookups for the admin gate.
    pub directory: Arc<dyn UserDirectory>,
    /// Shared secret for the cron endpoints; `None` disables them.
    pub cron_secret: Option<String>,
    /// Relaxes the admin gate and enables the dev session endpoint.
    pub dev_mode: bool,
}
