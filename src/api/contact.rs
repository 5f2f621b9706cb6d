//! Contact API endpoints
//!
//! - POST /api/contact - Public contact form submission
//! - GET /api/contact - List submissions (token)
//! - GET /api/contact/{id} - Get submission (token)
//! - PUT /api/contact/{id}/status - Change handling status (token)
//! - POST /api/contact/respond - Email a reply to the submitter (token)
//! - DELETE /api/contact/{id} - Remove submission (token)

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, ApiJson, ApiPath, AppState};
use crate::api::responses::{
    ContactListResponse, ContactMessageResponse, ContactResponse, MessageResponse,
};
use crate::models::{ContactQuery, ContactReason, ContactStatus, CreateContactInput, ListParams};
use crate::services::RespondInput;

#[derive(Debug, Default, Deserialize)]
pub struct ListContactsQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub status: Option<String>,
    pub reason: Option<String>,
}

impl ListContactsQuery {
    fn to_query(&self) -> Result<ContactQuery, ApiError> {
        let status = match non_blank(&self.status) {
            Some(s) => Some(
                ContactStatus::from_str(s)
                    .ok_or_else(|| ApiError::validation_error("סטטוס לא תקין"))?,
            ),
            None => None,
        };
        let reason = match non_blank(&self.reason) {
            Some(r) => Some(
                ContactReason::from_str(r)
                    .ok_or_else(|| ApiError::validation_error("סיבת פנייה לא תקינה"))?,
            ),
            None => None,
        };
        Ok(ContactQuery { status, reason })
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: ContactStatus,
}

/// POST /api/contact
pub async fn submit_contact(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateContactInput>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    state.contact_service.submit(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("הפנייה נשלחה בהצלחה")),
    ))
}

/// GET /api/contact
pub async fn list_contacts(
    State(state): State<AppState>,
    Query(raw): Query<ListContactsQuery>,
) -> Result<Json<ContactListResponse>, ApiError> {
    let query = raw.to_query()?;
    let params = ListParams::from_query(raw.page.as_deref(), raw.limit.as_deref());

    let result = state.contact_service.list(&query, &params).await?;
    Ok(Json(result.into()))
}

/// GET /api/contact/{id}
pub async fn get_contact(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ContactResponse>, ApiError> {
    let contact = state.contact_service.get(id).await?;
    Ok(Json(contact.into()))
}

/// PUT /api/contact/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<StatusUpdateRequest>,
) -> Result<Json<ContactMessageResponse>, ApiError> {
    let contact = state.contact_service.update_status(id, body.status).await?;
    Ok(Json(ContactMessageResponse {
        message: "סטטוס עודכן בהצלחה",
        contact: contact.into(),
    }))
}

/// POST /api/contact/respond
pub async fn respond(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<RespondInput>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.contact_service.respond(input).await?;
    Ok(Json(MessageResponse::new("התגובה נשלחה בהצלחה")))
}

/// DELETE /api/contact/{id}
pub async fn delete_contact(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.contact_service.delete(id).await?;
    Ok(Json(MessageResponse::new("הפנייה נמחקה בהצלחה")))
}
