use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer};
use dotenv::dotenv;
use log::info;

mod auth;
mod config;
mod handlers;
mod models;
mod routes;
mod services;

use auth::AuthConfig;
use config::Config;
use services::{ApprovalService, MongoDBService, NotificationService};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenv().ok();

    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(log_level));

    let config = Config::load()?;

    let mongodb = MongoDBService::init(&config.mongodb_uri)
        .await
        .expect("Failed to initialize MongoDB");
    let mongodb_data = web::Data::new(mongodb);

    let auth_config = web::Data::new(AuthConfig::new(config.jwt_secret.clone()));

    let approval_service = web::Data::new(ApprovalService::new(Arc::new(
        mongodb_data.get_ref().clone(),
    )));
    let notification_service = web::Data::new(NotificationService::new(Arc::new(
        mongodb_data.get_ref().clone(),
    )));

    info!("Starting server at http://{}:{}", config.host, config.port);

    HttpServer::new(move || {
        // Configure CORS middleware
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .expose_headers(vec!["content-type", "content-length", "accept"])
            .max_age(3600);

        App::new()
            .wrap(cors)
            .app_data(mongodb_data.clone())
            .app_data(auth_config.clone())
            .app_data(approval_service.clone())
            .app_data(notification_service.clone())
            .configure(routes::configure)
            .route("/health", web::get().to(|| async {
                info!("Health check");
                HttpResponse::Ok().body("OK")
            }))
    })
    .bind(format!("{}:{}", config.host, config.port))?
    .run()
    .await?;

    info!("Server shutting down");
    Ok(())
}
