use super::{ApiResult, AppState};
use crate::engagement::{
    EngagementService, ToggleEngagementInput, ToggleOutcome, ViewerEngagementState,
    ViewerStateRequest,
};
use axum::extract::State;
use axum::Json;

pub(crate) async fn toggle_engagement(
    State(state): State<AppState>,
    Json(payload): Json<ToggleEngagementInput>,
) -> ApiResult<ToggleOutcome> {
    let service = EngagementService::new(state.database.clone());
    let outcome = service.toggle(payload)?;
    Ok(Json(outcome))
}

pub(crate) async fn viewer_state(
    State(state): State<AppState>,
    Json(payload): Json<ViewerStateRequest>,
) -> ApiResult<ViewerEngagementState> {
    let service = EngagementService::new(state.database.clone());
    let viewer_state = service.viewer_state(&payload)?;
    Ok(Json(viewer_state))
}
