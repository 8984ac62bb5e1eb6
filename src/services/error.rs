use super::validation::ValidationErrors;
use thiserror::Error;

/// Domain failures the web layer maps onto specific status codes.
///
/// Services return `anyhow::Result` and raise these with `bail!`/`Err(..)?`;
/// `web::error::AppError` downcasts them back out.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(ValidationErrors),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("No {0} selected.")]
    NothingSelected(&'static str),
}
