use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use crate::modules::resources::services::ResourceRegistry;

/// Health check response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub resources: Vec<String>,
}

/// Readiness probe response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub resources: usize,
}

/// GET /health - Liveness probe
/// Returns 200 while the proxy can answer requests; upstream is not contacted
pub async fn health_check(registry: web::Data<ResourceRegistry>) -> impl Responder {
    let response = HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        resources: registry.names(),
    };

    HttpResponse::Ok().json(response)
}

/// GET /ready - Readiness probe
/// Ready once at least one resource is registered
pub async fn readiness_check(registry: web::Data<ResourceRegistry>) -> impl Responder {
    let resources = registry.names().len();
    let response = ReadinessResponse {
        ready: resources > 0,
        resources,
    };

    if response.ready {
        HttpResponse::Ok().json(response)
    } else {
        tracing::warn!("Readiness check failed: no resources registered");
        HttpResponse::ServiceUnavailable().json(response)
    }
}

/// Configure health check routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/ready", web::get().to(readiness_check));
}
