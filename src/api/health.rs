//! Health check endpoint
//!
//! - GET /api/health - `{status: "ok"}` once the database answers

use axum::{extract::State, Json};
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    state
        .pool
        .ping()
        .await
        .map_err(|e| ApiError::internal_error(format!("Database ping failed: {:#}", e)))?;
    Ok(Json(HealthResponse { status: "ok" }))
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::test_server;
    use serde_json::json;

    #[tokio::test]
    async fn test_health() {
        let (server, _) = test_server().await;
        let response = server.get("/api/health").await;
        response.assert_status_ok();
        response.assert_json(&json!({ "status": "ok" }));
    }
}
