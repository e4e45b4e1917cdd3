//! Mapping of domain errors onto HTTP responses.

use axum::{
    Json,
    extract::{multipart::MultipartError, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pinboard_core::image::ImageError;
use pinboard_core::message::MessageError;
use pinboard_shared::{AppError, ValidationErrors};
use serde_json::json;
use tracing::error;

/// Error returned by handlers.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        if err.is_server_error() {
            error!(error = %err, code = err.error_code(), "Request failed");
        }

        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut body = json!({
            "error": err.error_code(),
            "message": err.public_message(),
        });
        if let AppError::Validation(fields) = &err {
            body["fields"] = json!(fields);
        }

        (status, Json(body)).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self(AppError::Validation(errors))
    }
}

impl From<MessageError> for ApiError {
    fn from(err: MessageError) -> Self {
        Self(match err {
            MessageError::NotFound(id) => AppError::NotFound(format!("message {id}")),
            MessageError::Validation(errors) => AppError::Validation(errors),
            MessageError::Repository(msg) => AppError::Database(msg),
        })
    }
}

impl From<ImageError> for ApiError {
    fn from(err: ImageError) -> Self {
        Self(match err {
            ImageError::NotFound(id) => AppError::NotFound(format!("image {id}")),
            ImageError::Validation(errors) => AppError::Validation(errors),
            ImageError::Storage(e) if e.is_rejected_upload() => {
                AppError::Validation(ValidationErrors::single("image", e.to_string()))
            }
            ImageError::Storage(e) => AppError::Storage(e.to_string()),
            ImageError::Repository(msg) => AppError::Database(msg),
        })
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self(AppError::Validation(ValidationErrors::single(
            "form",
            err.body_text(),
        )))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(err: JsonRejection) -> Self {
        Self(AppError::Validation(ValidationErrors::single(
            "json",
            err.body_text(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use pinboard_core::storage::StorageError;

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_error_lists_fields() {
        let response =
            ApiError::from(ValidationErrors::single("body", "This field is required."))
                .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["fields"]["body"][0], "This field is required.");
    }

    #[tokio::test]
    async fn test_storage_error_hides_detail() {
        let err = ImageError::Storage(StorageError::Write {
            key: "images/a.png".to_string(),
            reason: "AccessDenied: bucket policy".to_string(),
        });
        let response = ApiError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = json_body(response).await;
        assert_eq!(body["error"], "storage_error");
        assert_eq!(body["message"], "Storage operation failed");
        assert!(body.get("fields").is_none());
    }

    #[test]
    fn test_rejected_upload_is_client_error() {
        let err = ImageError::Storage(StorageError::file_too_large(20, 10));
        assert_eq!(ApiError::from(err).0.status_code(), 400);

        let err = ImageError::NotFound(5);
        assert_eq!(ApiError::from(err).0.status_code(), 404);
    }
}
