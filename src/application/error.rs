use thiserror::Error;

use crate::{
    application::repos::RepoError, domain::error::DomainError, infra::error::InfraError,
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("resource not found")]
    NotFound,
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Process exit code for the operator binary.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Domain(_) | AppError::NotFound => 2,
            AppError::Infra(InfraError::Configuration { .. }) => 3,
            AppError::Infra(_) | AppError::Repo(_) => 4,
            AppError::Unexpected(_) => 1,
        }
    }
}
