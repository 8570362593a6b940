//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::application::entity::Entity;
use crate::domain::types::Scope;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
    #[error("stored document could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    CreatedAsc,
    CreatedDesc,
    NameAsc,
}

/// Search, sort and pagination parameters for a listing.
///
/// `item_id` narrows child kinds (image, comment, specification) to one item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub item_id: Option<Uuid>,
    pub sort: SortOrder,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl ListParams {
    pub fn for_item(item_id: Uuid) -> Self {
        Self {
            item_id: Some(item_id),
            ..Self::default()
        }
    }

    /// True for the plain "everything in scope" listing.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Search term with surrounding whitespace removed; blank terms count as absent.
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }
}

/// Source-of-truth store for one entity kind.
///
/// `get_one` returns `Ok(None)` when no visible row exists; soft-deleted rows
/// are invisible to both reads.
#[async_trait]
pub trait EntityStore<E: Entity>: Send + Sync {
    async fn get_all(&self, scope: Scope, params: &ListParams) -> Result<Vec<E>, RepoError>;

    async fn get_one(&self, scope: Scope, id: Uuid) -> Result<Option<E>, RepoError>;

    async fn create(&self, scope: Scope, input: E::Create) -> Result<Uuid, RepoError>;

    async fn update(&self, scope: Scope, input: E::Update) -> Result<(), RepoError>;

    /// Soft or hard delete depending on `E::KIND.delete_policy()`.
    async fn delete(&self, scope: Scope, id: Uuid, actor: Uuid) -> Result<(), RepoError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_search_is_ignored() {
        let params = ListParams {
            search: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(params.search_term(), None);
        assert!(!params.is_default());
    }

    #[test]
    fn default_params_are_default() {
        assert!(ListParams::default().is_default());
        assert!(!ListParams::for_item(Uuid::new_v4()).is_default());
    }
}
