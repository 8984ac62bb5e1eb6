pub mod auth;
pub mod bulk;
pub mod categories;
pub mod dashboard;
pub mod error;
pub mod pagination;
pub mod posts;
pub mod presenter;
pub mod query;
pub mod slug;
pub mod tags;
pub(crate) mod terms;
pub mod thumbnails;
pub mod validation;

pub use error::ServiceError;
