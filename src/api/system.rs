use std::sync::Arc;

use axum::{Json, extract::State};
use serde_json::{Value, json};

use super::AppState;

/// GET / - service metadata
pub async fn index() -> Json<Value> {
    Json(json!({
        "name": "HFRAT API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "endpoints": {
            "auth": "/api/auth",
            "admin": "/api/admin",
            "reporter": "/api/reporter",
            "monitor": "/api/monitor",
            "health": "/health"
        }
    }))
}

/// GET /health - liveness plus database connectivity
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let database = match state.store().ping().await {
        Ok(()) => "connected".to_string(),
        Err(e) => format!("error: {e}"),
    };

    Json(json!({
        "status": "ok",
        "database": database
    }))
}
