//! `SeaORM` entities.

pub mod images;
pub mod messages;

/// Common imports for working with entities.
pub mod prelude {
    pub use super::images::Entity as Images;
    pub use super::messages::Entity as Messages;
}
