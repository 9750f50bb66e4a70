use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use dotenvy::dotenv;

mod api;
mod clock;
mod config;
mod db;
mod docs;
mod engine;
mod error;
mod model;
mod routes;
mod store;

use config::Config;
use db::init_db;

use crate::clock::SystemClock;
use crate::docs::ApiDoc;
use crate::engine::aggregate::AggregationEngine;
use crate::engine::reconcile::ReconciliationEngine;
use crate::engine::rules::StatusRules;
use crate::store::{MySqlAttendanceStore, MySqlDirectoryStore, MySqlLeaveStore};
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Hello World!"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url).await;

    let directory = Arc::new(MySqlDirectoryStore::new(pool.clone()));
    let attendance = Arc::new(MySqlAttendanceStore::new(pool.clone()));
    let leaves = Arc::new(MySqlLeaveStore::new(pool.clone()));
    let system_clock = Arc::new(SystemClock);

    let reconciliation = Data::new(ReconciliationEngine::new(
        directory.clone(),
        attendance.clone(),
        leaves,
        system_clock.clone(),
        StatusRules::default(),
    ));
    let aggregation = Data::new(AggregationEngine::new(directory, attendance, system_clock));

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(reconciliation.clone())
            .app_data(aggregation.clone())
            .service(index)
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await
}
