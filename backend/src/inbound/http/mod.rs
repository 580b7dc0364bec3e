//! HTTP inbound adapter exposing the pacing REST endpoints.

use actix_web::web;

pub mod admin;
pub mod cron;
pub mod dev;
pub mod error;
pub mod progress;
pub mod routine;
pub mod session;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod wire;

pub use error::ApiResult;

/// Register every route under `/api`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(
                web::scope("/shadow")
                    .service(progress::today_commit)
                    .service(progress::commit_today)
                    .service(progress::run_today)
                    .service(routine::dry_run_today)
                    .service(routine::dry_run_today_post)
                    .service(routine::duplicate_today),
            )
            .service(web::scope("/admin/shadow").service(admin::run_today_all))
            .service(
                web::scope("/cron/shadow")
                    .service(cron::run_today_all)
                    .service(cron::generate_events_today_all),
            )
            .service(web::scope("/dev").service(dev::open_session)),
    );
}
