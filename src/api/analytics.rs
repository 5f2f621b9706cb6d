//! Dashboard analytics endpoint
//!
//! - GET /api/analytics?period=week|month|year (token)

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState};
use crate::services::{AnalyticsReport, Period};

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub period: Option<String>,
}

/// GET /api/analytics
pub async fn get_analytics(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<AnalyticsReport>, ApiError> {
    let period = Period::parse(query.period.as_deref());
    Ok(Json(state.analytics_service.report(period).await?))
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{login_token, test_server};
    use axum::http::StatusCode;
    use chrono::Utc;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_report_shape() {
        let (server, _) = test_server().await;
        let token = login_token(&server).await;

        server
            .post("/api/contact")
            .json(&json!({
                "companyName": "Acme",
                "contactPerson": "Dana",
                "email": "dana@acme.test",
                "reason": "events"
            }))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .get("/api/analytics")
            .add_query_param("period", "week")
            .authorization_bearer(&token)
            .await;
        response.assert_status_ok();
        let body: Value = response.json();

        let today = Utc::now().format("%Y-%m-%d").to_string();
        assert_eq!(body["contactsByPeriod"], json!([{ "date": today, "count": 1 }]));
        assert_eq!(body["articlesByPeriod"], json!([]));
        assert_eq!(body["overview"]["totalContacts"], 1);
        assert_eq!(body["overview"]["totalArticles"], 0);
        assert_eq!(
            body["overview"]["contactsByStatus"],
            json!([{ "status": "new", "count": 1 }])
        );
    }

    #[tokio::test]
    async fn test_requires_token() {
        let (server, _) = test_server().await;
        server
            .get("/api/analytics")
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }
}
