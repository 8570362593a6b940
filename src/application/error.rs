use std::error::Error as StdError;

use thiserror::Error;

use crate::application::repos::RepoError;
use crate::cache::CacheError;
use crate::domain::error::DomainError;
use crate::infra::error::InfraError;

/// Flattened error chain, outermost message first.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self { source, messages }
    }

    pub fn render(&self) -> String {
        self.messages.join(": ")
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("{entity} {op} failed")]
    Storage {
        entity: &'static str,
        op: &'static str,
        #[source]
        source: RepoError,
    },
    #[error("{entity} not found")]
    NotFound { entity: &'static str },
    #[error("validation failed: {0}")]
    Validation(String),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn storage(entity: &'static str, op: &'static str, source: RepoError) -> Self {
        match source {
            RepoError::NotFound => Self::NotFound { entity },
            source => Self::Storage { entity, op, source },
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_)
                | AppError::Domain(DomainError::Validation { .. })
                | AppError::Domain(DomainError::EmptyUpdate { .. })
                | AppError::Domain(DomainError::MissingOrganization { .. })
        )
    }
}
