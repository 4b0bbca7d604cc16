use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use validator::Validate;
use crate::core::Ranker;
use crate::models::{EngineConfig, ErrorResponse, HealthResponse, PoiQuery, RankEvacuationsRequest, RankingResponse};
use crate::services::{CmopClient, Snapshot};
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub cmop: Arc<CmopClient>,
    pub ranker: Ranker,
    pub poi_radius_m: u32,
}

/// Configure all evacuation-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/evacuations", web::get().to(rank_all))
        .route("/evacuations/rank", web::post().to(rank_inline))
        .route("/evacuations/poi", web::get().to(rank_poi));
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

/// Rank an inline casualty/facility picture
///
/// POST /api/v1/evacuations/rank
///
/// Request body:
/// ```json
/// {
///   "casualties": [{"id": "c1", "name": "string", "triageColor": "RED",
///                   "latitude": 42.88, "longitude": -8.54, "injuredAt": "2026-03-01T10:00:00Z"}],
///   "facilities": [{"id": "f1", "name": "string", "role": "medical_role_2",
///                   "latitude": 42.9, "longitude": -8.5, "available": true}],
///   "now": "2026-03-01T11:10:00Z",
///   "mascalThreshold": 8
/// }
/// ```
async fn rank_inline(
    state: web::Data<AppState>,
    req: web::Json<RankEvacuationsRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for rank request: {:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let ranker = match req.mascal_threshold {
        Some(threshold) => Ranker::new(EngineConfig {
            mascal_threshold: threshold,
            ..*state.ranker.config()
        }),
        None => state.ranker.clone(),
    };
    let now = req.now.unwrap_or_else(Utc::now);

    tracing::info!(
        "Ranking {} casualties against {} facilities",
        req.casualties.len(),
        req.facilities.len()
    );

    let result = ranker.rank(&req.casualties, &req.facilities, now);

    HttpResponse::Ok().json(RankingResponse::from(result))
}

/// Rank the casualties around a point of interest
///
/// GET /api/v1/evacuations/poi?latitude={lat}&longitude={lng}&radiusM={meters}
async fn rank_poi(
    state: web::Data<AppState>,
    query: web::Query<PoiQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let radius_m = query.radius_m.unwrap_or(state.poi_radius_m);

    tracing::info!(
        "Ranking casualties within {}m of ({}, {})",
        radius_m,
        query.latitude,
        query.longitude
    );

    match state.cmop.fetch_poi(query.latitude, query.longitude, radius_m).await {
        Ok(snapshot) => respond_with_ranking(&state, snapshot),
        Err(e) => {
            tracing::error!("Failed to fetch point of interest from CMOP: {}", e);
            upstream_error("Failed to fetch point of interest", e)
        }
    }
}

/// Rank every known casualty against every medical facility
///
/// GET /api/v1/evacuations
async fn rank_all(state: web::Data<AppState>) -> impl Responder {
    match state.cmop.fetch_all().await {
        Ok(snapshot) => respond_with_ranking(&state, snapshot),
        Err(e) => {
            tracing::error!("Failed to fetch casualty picture from CMOP: {}", e);
            upstream_error("Failed to fetch casualty picture", e)
        }
    }
}

fn respond_with_ranking(state: &AppState, snapshot: Snapshot) -> HttpResponse {
    let result = state
        .ranker
        .rank(&snapshot.casualties, &snapshot.facilities, Utc::now());

    HttpResponse::Ok().json(RankingResponse::from(result))
}

fn upstream_error(error: &str, cause: impl std::fmt::Display) -> HttpResponse {
    HttpResponse::BadGateway().json(ErrorResponse {
        error: error.to_string(),
        message: cause.to_string(),
        status_code: 502,
    })
}
