use actix_files::Files;
use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use log::{error, info};
use serde_json::json;
use std::fs;
use std::path::PathBuf;

use crate::catalog::DiseaseCatalog;
use crate::config::AppConfig;
use crate::inference::{CLASS_NAMES, IMG_SIZE, InferenceError, Model};
use crate::upload::{self, UploadError, UploadHandler};
use shared::{ModelStatsResponse, PredictionResponse};

pub fn configure_routes(cfg: &mut web::ServiceConfig, static_dir: PathBuf) {
    cfg.service(web::resource("/upload").route(web::post().to(handle_upload)))
        .service(web::resource("/disease-info/{name}").route(web::get().to(disease_info)))
        .service(web::resource("/model-stats").route(web::get().to(model_stats)))
        .service(Files::new("/", static_dir).index_file("index.html"));
}

async fn handle_upload(
    catalog: web::Data<DiseaseCatalog>,
    model: web::Data<Model>,
    uploads: web::Data<UploadHandler>,
    mut payload: Multipart,
) -> HttpResponse {
    info!("Upload endpoint called");

    let incoming = match upload::read_upload(&mut payload, uploads.max_bytes()).await {
        Ok(incoming) => incoming,
        Err(e) => {
            error!("Rejected upload: {}", e);
            return upload_error_response(&e);
        }
    };

    info!("Processing file: {}", incoming.filename);

    let saved = match uploads.save(&incoming.filename, &incoming.data) {
        Ok(path) => path,
        Err(e) => {
            error!("Failed to save upload {}: {}", incoming.filename, e);
            return upload_error_response(&e);
        }
    };

    let result = model.predict(&saved);
    uploads.cleanup(&saved);

    match result {
        Ok(prediction) => {
            let disease_info = catalog.enrich(&prediction.label);
            info!(
                "Prediction successful: {} with confidence {:.4}",
                prediction.label, prediction.confidence
            );
            HttpResponse::Ok().json(PredictionResponse {
                success: true,
                prediction: prediction.label,
                confidence: prediction.confidence,
                disease_info,
            })
        }
        Err(e) => {
            error!("Inference failed: {}", e);
            inference_error_response(&e)
        }
    }
}

fn upload_error_response(err: &UploadError) -> HttpResponse {
    let body = json!({ "error": err.to_string() });
    if err.is_client_error() {
        HttpResponse::BadRequest().json(body)
    } else {
        HttpResponse::InternalServerError().json(body)
    }
}

fn inference_error_response(err: &InferenceError) -> HttpResponse {
    let message = match err {
        InferenceError::ModelNotFound | InferenceError::ModelLoad(_) => {
            format!("Failed to load model: {}", err)
        }
        InferenceError::Preprocess(_) | InferenceError::Prediction(_) => {
            format!("Failed to process image: {}", err)
        }
    };
    HttpResponse::InternalServerError().json(json!({ "error": message }))
}

async fn disease_info(catalog: web::Data<DiseaseCatalog>, path: web::Path<String>) -> HttpResponse {
    let name = path.into_inner();
    match catalog.get(&name) {
        Some(record) => {
            info!("Disease info lookup: {} (severity {})", name, record.severity);
            HttpResponse::Ok().json(record)
        }
        None => HttpResponse::NotFound().json(json!({ "error": "Disease not found" })),
    }
}

async fn model_stats(config: web::Data<AppConfig>) -> HttpResponse {
    let training_history = read_first_report(&config.reports.training_history)
        .unwrap_or_else(|| "No training history available".to_string());
    let classification_report = read_first_report(&config.reports.classification_report)
        .unwrap_or_else(|| "No classification report available".to_string());

    HttpResponse::Ok().json(ModelStatsResponse {
        class_names: CLASS_NAMES.iter().map(|s| s.to_string()).collect(),
        image_size: IMG_SIZE,
        training_history,
        classification_report,
    })
}

/// Report files are opaque external artifacts; an unreadable candidate is
/// skipped like a missing one.
fn read_first_report(candidates: &[PathBuf]) -> Option<String> {
    candidates
        .iter()
        .filter(|p| p.exists())
        .find_map(|p| fs::read_to_string(p).ok())
}
