use crate::{
    api::{attendance, audit, employee, leave, leave_balance, regularisation, team},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
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

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter.clone())
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/attendance")
                    // /attendance/punch
                    .service(
                        web::resource("/punch").route(web::post().to(attendance::punch)),
                    )
                    // /attendance/today
                    .service(web::resource("/today").route(web::get().to(attendance::today)))
                    // /attendance/history
                    .service(web::resource("/history").route(web::get().to(attendance::history)))
                    // /attendance/regularisation
                    .service(
                        web::resource("/regularisation")
                            .route(web::post().to(regularisation::apply))
                            .route(web::get().to(regularisation::list_own)),
                    )
                    // /attendance/regularisation/{id}/approve
                    .service(
                        web::resource("/regularisation/{id}/approve")
                            .route(web::put().to(regularisation::approve)),
                    )
                    // /attendance/regularisation/{id}/reject
                    .service(
                        web::resource("/regularisation/{id}/reject")
                            .route(web::put().to(regularisation::reject)),
                    ),
            )
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave::history))
                            .route(web::post().to(leave::apply)),
                    )
                    // /leave/balance
                    .service(
                        web::resource("/balance")
                            .route(web::get().to(leave_balance::get_balances)),
                    )
                    // /leave/balance/adjust
                    .service(
                        web::resource("/balance/adjust")
                            .route(web::post().to(leave_balance::adjust)),
                    )
                    // /leave/{id}/approve
                    .service(
                        web::resource("/{id}/approve").route(web::put().to(leave::approve)),
                    )
                    // /leave/{id}/reject
                    .service(web::resource("/{id}/reject").route(web::put().to(leave::reject))),
            )
            .service(
                web::scope("/team")
                    // /team/leave/pending
                    .service(
                        web::resource("/leave/pending")
                            .route(web::get().to(team::pending_leaves)),
                    )
                    // /team/regularisation/pending
                    .service(
                        web::resource("/regularisation/pending")
                            .route(web::get().to(team::pending_regularisations)),
                    )
                    // /team/attendance
                    .service(
                        web::resource("/attendance").route(web::get().to(team::attendance)),
                    ),
            )
            .service(
                web::scope("/employee")
                    // /employee/managers
                    .service(
                        web::resource("/managers").route(web::get().to(employee::list_managers)),
                    )
                    // /employee
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    // /employee/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(employee::update_employee))
                            .route(web::get().to(employee::get_employee))
                            .route(web::delete().to(employee::delete_employee)),
                    ),
            )
            .service(
                web::scope("/audit")
                    // /audit
                    .service(web::resource("").route(web::get().to(audit::list_logs))),
            ),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)

// API REQUEST
//  └─ Authorization: Bearer access_token

// ACCESS EXPIRED
//  └─ POST /refresh with refresh_token
//       └─ returns new access_token
