//! Text messages.

mod error;
mod service;
mod types;

pub use error::MessageError;
pub use service::{MessageRepository, MessageService};
pub use types::{Message, validate_body};
