use crate::{
    api::{home, image, inform, leave_request, staff},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use anyhow::anyhow;

pub type LoginLimiter = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-peer limiter allowing `requests_per_min` requests with an equal burst.
pub fn build_limiter(requests_per_min: u32) -> anyhow::Result<LoginLimiter> {
    let requests_per_min = requests_per_min.max(1);
    GovernorConfigBuilder::default()
        .milliseconds_per_request((60_000 / requests_per_min as u64).max(1))
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit: {requests_per_min}/min"))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, login_limiter: &LoginLimiter) {
    // Everything lives under the prefix; the middleware lets the public
    // paths (login, activation, media, health) through without a token.
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .service(
                web::scope("/auth")
                    .service(
                        web::resource("/login")
                            .wrap(Governor::new(login_limiter))
                            .route(web::post().to(handlers::login)),
                    )
                    .service(web::resource("/resetpwd").route(web::post().to(handlers::reset_password)))
                    .service(web::resource("/me").route(web::get().to(handlers::me))),
            )
            .service(web::scope("/absent").configure(leave_request::configure))
            .service(web::scope("/inform").configure(inform::configure))
            .service(web::scope("/staff").configure(staff::configure))
            .service(web::scope("/image").configure(image::configure))
            .service(web::scope("/home").configure(home::configure))
            .route("/media/{file}", web::get().to(image::serve_media)),
    );
}
