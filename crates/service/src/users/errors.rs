use thiserror::Error;

use crate::errors::ServiceError;

/// Business errors for user workflows
#[derive(Debug, Error)]
pub enum UserError {
    #[error("{0}")]
    Validation(String),
    #[error("Email already registered")]
    DuplicateEmail,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Not found")]
    NotFound,
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl UserError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            UserError::Validation(_) => 1001,
            UserError::DuplicateEmail => 1002,
            UserError::NotFound => 1003,
            UserError::InvalidCredentials => 1004,
            UserError::Persistence(_) => 1200,
        }
    }
}

impl From<ServiceError> for UserError {
    fn from(e: ServiceError) -> Self {
        UserError::Persistence(e.to_string())
    }
}
