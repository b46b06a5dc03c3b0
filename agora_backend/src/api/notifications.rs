use super::{ApiError, ApiResult, AppState};
use crate::notifications::{NotificationItem, NotificationService};
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct RecipientParams {
    recipient_id: String,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MarkReadRequest {
    recipient_id: String,
    #[serde(default)]
    ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct MarkReadResponse {
    updated: usize,
}

#[derive(Debug, Serialize)]
pub(crate) struct UnreadCountResponse {
    count: usize,
}

pub(crate) async fn list_notifications(
    State(state): State<AppState>,
    Query(params): Query<RecipientParams>,
) -> ApiResult<Vec<NotificationItem>> {
    if params.recipient_id.trim().is_empty() {
        return Err(ApiError::BadRequest("recipient_id is required".into()));
    }
    let service = NotificationService::new(state.database.clone());
    let items = service.list(&params.recipient_id, params.limit)?;
    Ok(Json(items))
}

pub(crate) async fn unread_count(
    State(state): State<AppState>,
    Query(params): Query<RecipientParams>,
) -> ApiResult<UnreadCountResponse> {
    let service = NotificationService::new(state.database.clone());
    let count = service.unread_count(&params.recipient_id)?;
    Ok(Json(UnreadCountResponse { count }))
}

pub(crate) async fn mark_read(
    State(state): State<AppState>,
    Json(payload): Json<MarkReadRequest>,
) -> ApiResult<MarkReadResponse> {
    let service = NotificationService::new(state.database.clone());
    let updated = service.mark_read(&payload.recipient_id, &payload.ids)?;
    Ok(Json(MarkReadResponse { updated }))
}
