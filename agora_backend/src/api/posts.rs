use super::{ApiError, ApiResult, AppState};
use crate::content::{
    ContentService, CreateCommentInput, CreatePostInput, CreateReplyInput, CreatedContent,
    Discussion, EditPostInput, PostView,
};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct PostResponse {
    post: PostView,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActorParams {
    actor_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateCommentRequest {
    author_id: String,
    content: String,
    #[serde(default)]
    comment_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateReplyRequest {
    post_id: String,
    author_id: String,
    content: String,
    #[serde(default)]
    reply_to_id: Option<String>,
    #[serde(default)]
    reply_to_author_id: Option<String>,
}

pub(crate) async fn create_post(
    State(state): State<AppState>,
    Json(payload): Json<CreatePostInput>,
) -> Result<(StatusCode, Json<PostResponse>), ApiError> {
    let service = ContentService::new(state.database.clone());
    let post = service.create_post(payload)?;
    Ok((StatusCode::CREATED, Json(PostResponse { post })))
}

pub(crate) async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<PostResponse> {
    let service = ContentService::new(state.database.clone());
    match service.get_post(&id)? {
        Some(post) => Ok(Json(PostResponse { post })),
        None => Err(ApiError::NotFound(format!("post {id} not found"))),
    }
}

pub(crate) async fn record_view(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<PostResponse> {
    let service = ContentService::new(state.database.clone());
    match service.view_post(&id)? {
        Some(post) => Ok(Json(PostResponse { post })),
        None => Err(ApiError::NotFound(format!("post {id} not found"))),
    }
}

pub(crate) async fn edit_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<EditPostInput>,
) -> ApiResult<PostResponse> {
    let service = ContentService::new(state.database.clone());
    let post = service.edit_post(&id, payload)?;
    Ok(Json(PostResponse { post }))
}

pub(crate) async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<ActorParams>,
) -> Result<StatusCode, ApiError> {
    let service = ContentService::new(state.database.clone());
    service.delete_post(&id, &params.actor_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn get_discussion(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Discussion> {
    let service = ContentService::new(state.database.clone());
    match service.discussion(&id)? {
        Some(discussion) => Ok(Json(discussion)),
        None => Err(ApiError::NotFound(format!("post {id} not found"))),
    }
}

pub(crate) async fn create_comment(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CreatedContent>), ApiError> {
    let service = ContentService::new(state.database.clone());
    let created = service.create_comment(CreateCommentInput {
        post_id,
        author_id: payload.author_id,
        content: payload.content,
        comment_key: payload.comment_key,
    })?;
    let status = if created.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(created)))
}

pub(crate) async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<ActorParams>,
) -> Result<StatusCode, ApiError> {
    let service = ContentService::new(state.database.clone());
    service.delete_comment(&id, &params.actor_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn create_reply(
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
    Json(payload): Json<CreateReplyRequest>,
) -> Result<(StatusCode, Json<CreatedContent>), ApiError> {
    let service = ContentService::new(state.database.clone());
    let created = service.create_reply(CreateReplyInput {
        comment_id,
        post_id: payload.post_id,
        author_id: payload.author_id,
        content: payload.content,
        reply_to_id: payload.reply_to_id,
        reply_to_author_id: payload.reply_to_author_id,
    })?;
    Ok((StatusCode::CREATED, Json(created)))
}
