//! Message routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError, extractors::JsonBody};
use pinboard_core::message::{Message, validate_body};

/// Creates the message routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/messages", get(list_messages).post(create_message))
        .route("/messages/", get(list_messages).post(create_message))
        .route(
            "/messages/{id}",
            get(get_message)
                .put(replace_message)
                .patch(update_message)
                .delete(delete_message),
        )
        .route(
            "/messages/{id}/",
            get(get_message)
                .put(replace_message)
                .patch(update_message)
                .delete(delete_message),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating or updating a message.
#[derive(Debug, Default, Deserialize)]
pub struct MessagePayload {
    /// Message text.
    #[serde(default)]
    pub body: Option<String>,
}

/// Response for a message.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Message ID.
    pub id: i32,
    /// Message text.
    pub body: String,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            body: message.body,
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/messages/`
async fn list_messages(
    State(state): State<AppState>,
) -> Result<Json<Vec<MessageResponse>>, ApiError> {
    let messages = state.message_service().list().await?;
    Ok(Json(messages.into_iter().map(Into::into).collect()))
}

/// POST `/messages/`
async fn create_message(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<MessagePayload>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let message = state
        .message_service()
        .create(payload.body.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(message.into())))
}

/// GET `/messages/{id}/`
async fn get_message(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    let message = state.message_service().get(id).await?;
    Ok(Json(message.into()))
}

/// PUT `/messages/{id}/` - `body` is required.
async fn replace_message(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    JsonBody(payload): JsonBody<MessagePayload>,
) -> Result<Json<MessageResponse>, ApiError> {
    let service = state.message_service();
    service.get(id).await?;

    let body = validate_body(payload.body.as_deref())?;
    let message = service.update(id, Some(&body)).await?;
    Ok(Json(message.into()))
}

/// PATCH `/messages/{id}/` - `body` is optional.
async fn update_message(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    JsonBody(payload): JsonBody<MessagePayload>,
) -> Result<Json<MessageResponse>, ApiError> {
    let message = state
        .message_service()
        .update(id, payload.body.as_deref())
        .await?;
    Ok(Json(message.into()))
}

/// DELETE `/messages/{id}/`
async fn delete_message(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    state.message_service().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
