use actix_web::middleware::{Logger, NormalizePath};
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use std::sync::Arc;

mod api;
mod auth;
mod config;
mod db;
mod directory;
mod docs;
mod error;
mod leave;
mod model;
mod models;
mod routes;
mod utils;

use config::Config;
use db::init_db;
use directory::{Directory, MySqlDirectory};
use leave::{LeaveService, LeaveStore, MySqlLeaveStore};
use utils::mailer::{EmailConfig, Mailer};

use crate::docs::ApiDoc;
use tracing::info;
use tracing_appender::rolling;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    info!(addr = %config.server_addr, prefix = %config.api_prefix, "Server starting...");

    let pool = init_db(&config.database_url).await?;

    let directory: Arc<dyn Directory> = Arc::new(MySqlDirectory::new(pool.clone()));
    let leave_store: Arc<dyn LeaveStore> = Arc::new(MySqlLeaveStore::new(pool.clone()));
    let leave_service = Data::new(LeaveService::new(
        directory.clone(),
        leave_store,
        config.board_department.clone(),
    ));
    let mailer = Data::new(Mailer::new(&EmailConfig::from_env()?)?);
    let login_limiter = routes::build_limiter(config.rate_login_per_min)?;

    let server_addr = config.server_addr.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(pool.clone()))
            .app_data(Data::new(config.clone()))
            .app_data(Data::from(directory.clone()))
            .app_data(leave_service.clone())
            .app_data(mailer.clone())
            .configure(|cfg| routes::configure(cfg, &config, &login_limiter))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
