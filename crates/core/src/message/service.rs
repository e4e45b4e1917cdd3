//! Message service implementation.

use std::sync::Arc;

use super::error::MessageError;
use super::types::{Message, validate_body};

/// Repository trait for message persistence.
///
/// This trait is implemented by the db crate to provide actual database operations.
pub trait MessageRepository: Send + Sync {
    /// Insert a new message.
    fn create(
        &self,
        body: String,
    ) -> impl std::future::Future<Output = Result<Message, MessageError>> + Send;

    /// Find message by ID.
    fn find_by_id(
        &self,
        id: i32,
    ) -> impl std::future::Future<Output = Result<Option<Message>, MessageError>> + Send;

    /// All messages ordered by ID.
    fn list(&self) -> impl std::future::Future<Output = Result<Vec<Message>, MessageError>> + Send;

    /// Replace a message body. Returns `None` if the message does not exist.
    fn update(
        &self,
        id: i32,
        body: String,
    ) -> impl std::future::Future<Output = Result<Option<Message>, MessageError>> + Send;

    /// Delete a message. Returns `false` if it did not exist.
    fn delete(
        &self,
        id: i32,
    ) -> impl std::future::Future<Output = Result<bool, MessageError>> + Send;
}

/// Message service.
pub struct MessageService<R: MessageRepository> {
    repo: Arc<R>,
}

impl<R: MessageRepository> MessageService<R> {
    /// Create a new message service.
    #[must_use]
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// List all messages.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository fails.
    pub async fn list(&self) -> Result<Vec<Message>, MessageError> {
        self.repo.list().await
    }

    /// Get message by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the message is not found or the repository fails.
    pub async fn get(&self, id: i32) -> Result<Message, MessageError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(MessageError::NotFound(id))
    }

    /// Create a message.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a missing or blank body.
    pub async fn create(&self, body: Option<&str>) -> Result<Message, MessageError> {
        let body = validate_body(body)?;
        self.repo.create(body).await
    }

    /// Update a message. With `body` absent (partial update) the message is
    /// returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns not found, validation or repository errors.
    pub async fn update(&self, id: i32, body: Option<&str>) -> Result<Message, MessageError> {
        let Some(body) = body else {
            return self.get(id).await;
        };

        let body = validate_body(Some(body))?;
        self.repo
            .update(id, body)
            .await?
            .ok_or(MessageError::NotFound(id))
    }

    /// Delete a message.
    ///
    /// # Errors
    ///
    /// Returns an error if the message is not found or the repository fails.
    pub async fn delete(&self, id: i32) -> Result<(), MessageError> {
        if self.repo.delete(id).await? {
            Ok(())
        } else {
            Err(MessageError::NotFound(id))
        }
    }
}
