use actix_web::{web, HttpResponse, Responder};
use log::{debug, error};
use serde_json::json;

use crate::repo::Repository;

/// Shared application state for the HTTP server.
pub struct AppState {
    pub repo: Repository,
    pub online: bool,
    pub read_only: bool,
}

/// Registers the local repository routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/status", web::get().to(get_status))
        .route("/blocks", web::post().to(put_block))
        .route("/blocks/{key}", web::get().to(get_block));
}

/// Get node status information
pub async fn get_status(state: web::Data<AppState>) -> impl Responder {
    let repo = &state.repo;
    let blocks = match repo.store().len() {
        Ok(count) => count,
        Err(e) => {
            error!("Failed to count blocks: {}", e);
            return HttpResponse::InternalServerError().json(json!({ "error": e.to_string() }));
        }
    };

    HttpResponse::Ok().json(json!({
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
        "backend": repo.backend().label(),
        "path": repo.backend().path().map(|p| p.display().to_string()),
        "profile": repo.profile(),
        "online": state.online,
        "read_only": state.read_only,
        "blocks": blocks,
    }))
}

/// Store the request body as a block and return its content key
pub async fn put_block(state: web::Data<AppState>, body: web::Bytes) -> impl Responder {
    if state.read_only {
        return HttpResponse::Forbidden().json(json!({ "error": "repository is read only" }));
    }

    match state.repo.store().put(&body) {
        Ok(key) => {
            debug!("Stored block {} ({} bytes)", key, body.len());
            if let Some(analytics) = state.repo.analytics() {
                analytics.record("block.put", json!({ "key": key, "size": body.len() }));
            }
            HttpResponse::Created().json(json!({ "key": key }))
        }
        Err(e) => {
            error!("Failed to store block: {}", e);
            HttpResponse::InternalServerError().json(json!({ "error": e.to_string() }))
        }
    }
}

/// Fetch a block by content key
pub async fn get_block(state: web::Data<AppState>, key: web::Path<String>) -> impl Responder {
    match state.repo.store().get(&key) {
        Ok(Some(bytes)) => HttpResponse::Ok()
            .content_type("application/octet-stream")
            .body(bytes),
        Ok(None) => {
            HttpResponse::NotFound().json(json!({ "error": format!("block {} not found", key) }))
        }
        Err(e) => {
            error!("Failed to read block {}: {}", key, e);
            HttpResponse::InternalServerError().json(json!({ "error": e.to_string() }))
        }
    }
}
