//! Message repository for database operations.

use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryOrder, Set};

use crate::entities::messages;
use pinboard_core::message::{
    Message, MessageError, MessageRepository as MessageRepoTrait,
};

/// Message repository implementation.
#[derive(Debug, Clone)]
pub struct MessageRepository {
    db: DatabaseConnection,
}

impl MessageRepository {
    /// Create a new message repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl MessageRepoTrait for MessageRepository {
    async fn create(&self, body: String) -> Result<Message, MessageError> {
        let active_model = messages::ActiveModel {
            body: Set(body),
            ..Default::default()
        };

        let model = active_model
            .insert(&self.db)
            .await
            .map_err(|e| MessageError::repository(e.to_string()))?;

        Ok(to_domain(model))
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Message>, MessageError> {
        let model = messages::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| MessageError::repository(e.to_string()))?;

        Ok(model.map(to_domain))
    }

    async fn list(&self) -> Result<Vec<Message>, MessageError> {
        let models = messages::Entity::find()
            .order_by_asc(messages::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| MessageError::repository(e.to_string()))?;

        Ok(models.into_iter().map(to_domain).collect())
    }

    async fn update(&self, id: i32, body: String) -> Result<Option<Message>, MessageError> {
        let Some(model) = messages::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| MessageError::repository(e.to_string()))?
        else {
            return Ok(None);
        };

        let mut active_model = model.into_active_model();
        active_model.body = Set(body);
        let model = active_model
            .update(&self.db)
            .await
            .map_err(|e| MessageError::repository(e.to_string()))?;

        Ok(Some(to_domain(model)))
    }

    async fn delete(&self, id: i32) -> Result<bool, MessageError> {
        let result = messages::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| MessageError::repository(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }
}

fn to_domain(model: messages::Model) -> Message {
    Message {
        id: model.id,
        body: model.body,
    }
}
