//! Image routes.
//!
//! Uploads arrive as `multipart/form-data` with an optional `title` text
//! field and an `image` file field.

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::get,
};
use serde::Serialize;
use tracing::info;

use crate::{AppState, error::ApiError, extractors::RequestOrigin};
use pinboard_core::image::{Image, ImageUpdate, ImageUpload, ImageUrlBuilder, NewImage};
use pinboard_shared::ValidationErrors;

/// Creates the image routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/images", get(list_images).post(create_image))
        .route("/images/", get(list_images).post(create_image))
        .route(
            "/images/{id}",
            get(get_image)
                .put(replace_image)
                .patch(update_image)
                .delete(delete_image),
        )
        .route(
            "/images/{id}/",
            get(get_image)
                .put(replace_image)
                .patch(update_image)
                .delete(delete_image),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Response for an image.
#[derive(Debug, Serialize)]
pub struct ImageResponse {
    /// Image ID.
    pub id: i32,
    /// Caption.
    pub title: Option<String>,
    /// Key of the file in the object store.
    pub storage_key: String,
    /// Upload time (RFC 3339).
    pub uploaded_at: String,
    /// Where clients fetch the file; `null` when the row has no file.
    pub image_url: Option<String>,
}

impl ImageResponse {
    fn new(image: Image, urls: &ImageUrlBuilder, origin: &RequestOrigin) -> Self {
        let image_url = urls.image_url(&image.storage_key, origin.as_deref());
        Self {
            id: image.id,
            title: image.title,
            storage_key: image.storage_key,
            uploaded_at: image.uploaded_at.to_rfc3339(),
            image_url,
        }
    }
}

/// Fields read from an image form.
#[derive(Debug, Default)]
struct ImageForm {
    title: Option<String>,
    upload: Option<ImageUpload>,
}

impl ImageForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            match field.name() {
                Some("title") => form.title = Some(field.text().await?),
                Some("image") => {
                    let filename = field.file_name().unwrap_or_default().to_string();
                    let content_type = field.content_type().map(String::from);
                    let content = field.bytes().await?;
                    form.upload = Some(ImageUpload {
                        filename,
                        content_type,
                        content,
                    });
                }
                _ => {}
            }
        }

        Ok(form)
    }

    fn require_upload(upload: Option<ImageUpload>) -> Result<ImageUpload, ApiError> {
        upload.ok_or_else(|| {
            ValidationErrors::single("image", "No file was submitted.").into()
        })
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/images/` - newest first.
async fn list_images(
    State(state): State<AppState>,
    origin: RequestOrigin,
) -> Result<Json<Vec<ImageResponse>>, ApiError> {
    let images = state.image_service().list().await?;
    Ok(Json(
        images
            .into_iter()
            .map(|image| ImageResponse::new(image, &state.image_urls, &origin))
            .collect(),
    ))
}

/// POST `/images/`
async fn create_image(
    State(state): State<AppState>,
    origin: RequestOrigin,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ImageResponse>), ApiError> {
    let form = ImageForm::read(multipart).await?;
    let upload = ImageForm::require_upload(form.upload)?;

    let image = state
        .image_service()
        .commit_image(NewImage {
            title: form.title,
            upload,
        })
        .await?;

    info!(image_id = image.id, key = %image.storage_key, "Image uploaded");
    Ok((
        StatusCode::CREATED,
        Json(ImageResponse::new(image, &state.image_urls, &origin)),
    ))
}

/// GET `/images/{id}/`
async fn get_image(
    State(state): State<AppState>,
    origin: RequestOrigin,
    Path(id): Path<i32>,
) -> Result<Json<ImageResponse>, ApiError> {
    let image = state.image_service().get(id).await?;
    Ok(Json(ImageResponse::new(image, &state.image_urls, &origin)))
}

/// PUT `/images/{id}/` - `image` is required; an absent `title` clears it.
async fn replace_image(
    State(state): State<AppState>,
    origin: RequestOrigin,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<ImageResponse>, ApiError> {
    let service = state.image_service();
    service.get(id).await?;

    let form = ImageForm::read(multipart).await?;
    let upload = ImageForm::require_upload(form.upload)?;

    let image = service
        .update_image(
            id,
            ImageUpdate {
                title: Some(form.title),
                upload: Some(upload),
            },
        )
        .await?;
    Ok(Json(ImageResponse::new(image, &state.image_urls, &origin)))
}

/// PATCH `/images/{id}/` - `title` and `image` are both optional.
async fn update_image(
    State(state): State<AppState>,
    origin: RequestOrigin,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<ImageResponse>, ApiError> {
    let form = ImageForm::read(multipart).await?;

    let image = state
        .image_service()
        .update_image(
            id,
            ImageUpdate {
                title: form.title.map(Some),
                upload: form.upload,
            },
        )
        .await?;
    Ok(Json(ImageResponse::new(image, &state.image_urls, &origin)))
}

/// DELETE `/images/{id}/`
async fn delete_image(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    state.image_service().delete_image(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
