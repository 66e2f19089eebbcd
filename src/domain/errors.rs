use thiserror::Error;

use super::pricing::PricingError;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Pricing(#[from] PricingError),
    #[error("Internal error: {0}")]
    Internal(String),
}
