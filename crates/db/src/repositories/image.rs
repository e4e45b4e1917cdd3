//! Image repository for database operations.
//!
//! Implements image CRUD operations using SeaORM.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::images;
use pinboard_core::image::{
    Image, ImageChanges, ImageError, ImageRepository as ImageRepoTrait, NewImageRecord,
};

/// Image repository implementation.
#[derive(Debug, Clone)]
pub struct ImageRepository {
    db: DatabaseConnection,
}

impl ImageRepository {
    /// Create a new image repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl ImageRepoTrait for ImageRepository {
    async fn insert(&self, record: NewImageRecord) -> Result<Image, ImageError> {
        let active_model = images::ActiveModel {
            title: Set(record.title),
            storage_key: Set(record.storage_key),
            uploaded_at: Set(record.uploaded_at.into()),
            ..Default::default()
        };

        let model = active_model
            .insert(&self.db)
            .await
            .map_err(|e| ImageError::repository(e.to_string()))?;

        Ok(to_domain(model))
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Image>, ImageError> {
        let model = images::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| ImageError::repository(e.to_string()))?;

        Ok(model.map(to_domain))
    }

    async fn list(&self) -> Result<Vec<Image>, ImageError> {
        let models = images::Entity::find()
            .order_by_desc(images::Column::UploadedAt)
            .order_by_desc(images::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| ImageError::repository(e.to_string()))?;

        Ok(models.into_iter().map(to_domain).collect())
    }

    async fn update(&self, id: i32, changes: ImageChanges) -> Result<Option<Image>, ImageError> {
        let Some(model) = images::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| ImageError::repository(e.to_string()))?
        else {
            return Ok(None);
        };

        if changes.is_empty() {
            return Ok(Some(to_domain(model)));
        }

        let mut active_model = model.into_active_model();
        if let Some(title) = changes.title {
            active_model.title = Set(title);
        }
        if let Some(storage_key) = changes.storage_key {
            active_model.storage_key = Set(storage_key);
        }

        let model = active_model
            .update(&self.db)
            .await
            .map_err(|e| ImageError::repository(e.to_string()))?;

        Ok(Some(to_domain(model)))
    }

    async fn delete(&self, id: i32) -> Result<bool, ImageError> {
        let result = images::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| ImageError::repository(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    async fn count_by_key(&self, storage_key: &str) -> Result<u64, ImageError> {
        images::Entity::find()
            .filter(images::Column::StorageKey.eq(storage_key))
            .count(&self.db)
            .await
            .map_err(|e| ImageError::repository(e.to_string()))
    }
}

fn to_domain(model: images::Model) -> Image {
    Image {
        id: model.id,
        title: model.title,
        storage_key: model.storage_key,
        uploaded_at: model.uploaded_at.with_timezone(&Utc),
    }
}
