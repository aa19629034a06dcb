use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, error, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use listpull_engine::{mailer::ConfiguredTransport, EmailDispatcher, EmailQueueApi, OrderFlowApi, SqliteDatabase};
use log::*;

use crate::{
    auth::StaffApiToken,
    config::ServerConfig,
    errors::ServerError,
    notifications::start_scheduler,
    routes::{health, EmailQueueRoute, OrderByNumberRoute, SubmitOrderRoute, UpdateOrderStatusRoute},
    workers::start_email_worker,
};

/// Opens (and migrates) the database, starts the background workers and runs the HTTP server until it is shut down.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::open_and_migrate(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    info!("🗃️ Database ready at {}", config.database_url);
    let transport = ConfiguredTransport::from_config(config.mail.clone())
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let dispatcher = Arc::new(EmailDispatcher::new(db.clone(), transport, config.store_name.clone()));
    let _email_worker = start_email_worker(dispatcher);
    let _scheduler = start_scheduler(db.clone(), config.notifications.clone())?;
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let staff_token = StaffApiToken(config.staff_api_token.clone());
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone());
        let queue_api = EmailQueueApi::new(db.clone());
        let staff_scope = web::scope("/api")
            .service(UpdateOrderStatusRoute::<SqliteDatabase>::new())
            .service(EmailQueueRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("listpull::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(queue_api))
            .app_data(web::Data::new(staff_token.clone()))
            .app_data(json_config())
            .app_data(query_config())
            .service(health)
            .service(SubmitOrderRoute::<SqliteDatabase>::new())
            .service(OrderByNumberRoute::<SqliteDatabase>::new())
            .service(staff_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Malformed JSON bodies get the same `{"error": ...}` shape as every other error.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| error::Error::from(ServerError::InvalidRequestBody(err.to_string())))
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| error::Error::from(ServerError::InvalidQuery(err.to_string())))
}
