//! Vehicle marketplace backend
//!
//! API REST de anuncios de vehículos: listado con filtros y paginación,
//! CRUD protegido por JWT, subida de imágenes y descripciones generadas.

pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::middleware::cors_layer;
use crate::routes::{auth_routes, vehicle_routes};
use crate::state::AppState;

/// Router completo de la aplicación
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);
    let uploads = ServeDir::new(state.images.root());

    Router::new()
        .route("/health", get(health))
        .nest("/api/vehicles", vehicle_routes::create_vehicle_router(state.clone()))
        .nest("/api/auth", auth_routes::auth_routes(state.clone()))
        .nest_service("/uploads", uploads)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Health check simple
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
