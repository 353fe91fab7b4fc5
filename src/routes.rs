use crate::{api::leave_request, auth::middleware::auth_middleware, config::Config};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

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

    let protected_limiter = build_limiter(config.rate_protected_per_min);

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/leave")
                    // /leave/requests
                    .service(
                        web::resource("/requests")
                            .route(web::get().to(leave_request::my_leaves))
                            .route(web::post().to(leave_request::create_leave)),
                    )
                    // /leave/requests/{id}
                    .service(
                        web::resource("/requests/{id}")
                            .route(web::get().to(leave_request::get_leave))
                            .route(web::delete().to(leave_request::delete_leave)),
                    )
                    // /leave/quota
                    .service(
                        web::resource("/quota").route(web::get().to(leave_request::my_quota)),
                    )
                    .service(
                        web::scope("/admin")
                            // /leave/admin/requests
                            .service(
                                web::resource("/requests")
                                    .route(web::get().to(leave_request::admin_leave_list)),
                            )
                            // /leave/admin/requests/deleted
                            .service(
                                web::resource("/requests/deleted")
                                    .route(web::get().to(leave_request::deleted_leave_list)),
                            )
                            // /leave/admin/requests/{id}/status
                            .service(
                                web::resource("/requests/{id}/status")
                                    .route(web::patch().to(leave_request::update_leave_status)),
                            )
                            // /leave/admin/requests/{id}/restore
                            .service(
                                web::resource("/requests/{id}/restore")
                                    .route(web::post().to(leave_request::restore_leave)),
                            ),
                    ),
            ),
    );
}
