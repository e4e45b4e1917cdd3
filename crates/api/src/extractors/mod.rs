//! Request extractors.

mod json;
mod origin;

pub use json::JsonBody;
pub use origin::RequestOrigin;
