use crate::{
    api::{attendance, leave_request, timesheet},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-scope limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let api_limiter = Arc::new(build_limiter(config.rate_api_per_min));

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(api_limiter)
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(
                        web::resource("")
                            .route(web::post().to(attendance::mark_attendance))
                            .route(web::put().to(attendance::checkout)),
                    )
                    .service(
                        web::resource("/today/{employee_id}")
                            .route(web::get().to(attendance::today_status)),
                    )
                    .service(
                        web::resource("/employee/{employee_id}")
                            .route(web::get().to(attendance::attendance_history)),
                    )
                    .service(
                        web::resource("/summary/{employee_id}")
                            .route(web::get().to(attendance::monthly_summary)),
                    )
                    .service(
                        web::resource("/performance/{employee_id}")
                            .route(web::get().to(attendance::performance)),
                    ),
            )
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave_request::leave_list))
                            .route(web::post().to(leave_request::create_leave)),
                    )
                    // /leave/{id}
                    .service(web::resource("/{id}").route(web::get().to(leave_request::get_leave)))
                    // /leave/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(leave_request::approve_leave)),
                    )
                    // /leave/{id}/reject
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(leave_request::reject_leave)),
                    ),
            )
            .service(
                web::scope("/timesheet")
                    .service(
                        web::resource("/employee/{employee_id}")
                            .route(web::get().to(timesheet::employee_timesheet)),
                    )
                    // Fixed segments before the /team/{hr_id} catch-all.
                    .service(
                        web::resource("/team/summary/{hr_id}")
                            .route(web::get().to(timesheet::team_summary)),
                    )
                    .service(
                        web::resource("/team/export")
                            .route(web::post().to(timesheet::export_team_timesheet)),
                    )
                    .service(
                        web::resource("/team/{hr_id}")
                            .route(web::get().to(timesheet::team_timesheet)),
                    )
                    .service(
                        web::resource("/company")
                            .route(web::get().to(timesheet::company_timesheet)),
                    )
                    .service(
                        web::resource("/company/export")
                            .route(web::post().to(timesheet::export_company_timesheet)),
                    )
                    .service(
                        web::resource("/export")
                            .route(web::post().to(timesheet::export_employee_timesheet)),
                    ),
            ),
    );
}
