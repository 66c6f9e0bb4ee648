mod catalog;
mod config;
mod inference;
mod routes;
mod upload;

use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use catalog::DiseaseCatalog;
use config::AppConfig;
use inference::Model;
use routes::configure_routes;
use std::env;
use std::path::PathBuf;
use upload::UploadHandler;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    dotenv::dotenv().ok();

    if let Ok(current_dir) = env::current_dir() {
        log::info!("Current working directory: {}", current_dir.display());
    } else {
        log::error!("Failed to get the current working directory.");
    }

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Configuration loading failed: {}", e),
            ));
        }
    };

    let static_dir = config.static_assets.dir.clone().unwrap_or_else(|| {
        if let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") {
            PathBuf::from(format!("{}/../static", manifest_dir))
        } else {
            PathBuf::from("static")
        }
    });

    let model = Model::new(config.model.candidates.clone());
    match model.resolve_path() {
        Some(path) => log::info!("Model file found: {}", path.display()),
        None => log::warn!(
            "No model file found yet; /upload will answer 500 until one of the configured paths exists."
        ),
    }

    let catalog = DiseaseCatalog::new();
    let uploads = UploadHandler::new(config.upload.dir.clone(), config.upload.max_bytes);

    let port = env::var("PORT").unwrap_or_else(|_| "8081".to_string());
    let bind_address = format!("0.0.0.0:{}", port);
    log::info!("Starting server on {}", bind_address);

    let config = web::Data::new(config);
    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(config.clone())
            .app_data(web::Data::new(model.clone()))
            .app_data(web::Data::new(catalog.clone()))
            .app_data(web::Data::new(uploads.clone()))
            .configure(|cfg| configure_routes(cfg, static_dir.clone()))
    })
    .bind(&bind_address)?
    .run()
    .await
}
