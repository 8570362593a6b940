//! Shared domain enumerations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Every entity kind that flows through the cache-aside layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Category,
    Item,
    Table,
    Order,
    Image,
    Comment,
    Specification,
    Rule,
    Message,
    User,
    Organization,
    Role,
}

impl EntityKind {
    pub const ALL: [EntityKind; 12] = [
        EntityKind::Category,
        EntityKind::Item,
        EntityKind::Table,
        EntityKind::Order,
        EntityKind::Image,
        EntityKind::Comment,
        EntityKind::Specification,
        EntityKind::Rule,
        EntityKind::Message,
        EntityKind::User,
        EntityKind::Organization,
        EntityKind::Role,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Category => "category",
            EntityKind::Item => "item",
            EntityKind::Table => "table",
            EntityKind::Order => "order",
            EntityKind::Image => "image",
            EntityKind::Comment => "comment",
            EntityKind::Specification => "specification",
            EntityKind::Rule => "rule",
            EntityKind::Message => "message",
            EntityKind::User => "user",
            EntityKind::Organization => "organization",
            EntityKind::Role => "role",
        }
    }

    /// Backing table name in the relational store.
    pub fn table(self) -> &'static str {
        match self {
            EntityKind::Category => "categories",
            EntityKind::Item => "items",
            EntityKind::Table => "dining_tables",
            EntityKind::Order => "orders",
            EntityKind::Image => "images",
            EntityKind::Comment => "comments",
            EntityKind::Specification => "specifications",
            EntityKind::Rule => "rules",
            EntityKind::Message => "messages",
            EntityKind::User => "users",
            EntityKind::Organization => "organizations",
            EntityKind::Role => "roles",
        }
    }

    /// Plural name, as used for cache collections. Equals the table name
    /// except for `table`, whose rows live in `dining_tables`.
    pub fn plural(self) -> &'static str {
        match self {
            EntityKind::Table => "tables",
            other => other.table(),
        }
    }

    /// Whether rows of this kind belong to exactly one organization.
    pub fn is_organization_scoped(self) -> bool {
        matches!(
            self,
            EntityKind::Category
                | EntityKind::Item
                | EntityKind::Table
                | EntityKind::Order
                | EntityKind::Image
                | EntityKind::Comment
                | EntityKind::Specification
        )
    }

    pub fn delete_policy(self) -> DeletePolicy {
        match self {
            EntityKind::Specification | EntityKind::Rule | EntityKind::Message => {
                DeletePolicy::Hard
            }
            _ => DeletePolicy::Soft,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown entity kind `{0}`")]
pub struct UnknownEntityKind(pub String);

impl FromStr for EntityKind {
    type Err = UnknownEntityKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        EntityKind::ALL
            .into_iter()
            .find(|kind| {
                kind.as_str() == normalized
                    || kind.plural() == normalized
                    || kind.table() == normalized
            })
            .ok_or_else(|| UnknownEntityKind(value.to_string()))
    }
}

/// How a delete request is applied in the relational store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Row stays; `is_deleted`, `user_deleted` and `deleted_at` are set.
    Soft,
    /// Row is removed.
    Hard,
}

/// Ownership scope a read or write is evaluated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Global,
    Organization(Uuid),
}

impl Scope {
    pub fn organization_id(self) -> Option<Uuid> {
        match self {
            Scope::Global => None,
            Scope::Organization(id) => Some(id),
        }
    }

    /// Whether a row owned by `owner` is visible from this scope.
    pub fn admits(self, owner: Option<Uuid>) -> bool {
        match self {
            Scope::Global => true,
            Scope::Organization(id) => owner == Some(id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Preparing,
    Served,
    Paid,
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_singular_and_table_names() {
        assert_eq!("category".parse::<EntityKind>(), Ok(EntityKind::Category));
        assert_eq!("Categories".parse::<EntityKind>(), Ok(EntityKind::Category));
        assert_eq!("dining_tables".parse::<EntityKind>(), Ok(EntityKind::Table));
        assert!("favorite".parse::<EntityKind>().is_err());
    }

    #[test]
    fn parses_collection_names() {
        assert_eq!("tables".parse::<EntityKind>(), Ok(EntityKind::Table));
        for kind in EntityKind::ALL {
            assert_eq!(kind.plural().parse::<EntityKind>(), Ok(kind));
        }
    }

    #[test]
    fn hard_deleted_kinds() {
        let hard: Vec<_> = EntityKind::ALL
            .into_iter()
            .filter(|kind| kind.delete_policy() == DeletePolicy::Hard)
            .collect();
        assert_eq!(
            hard,
            vec![
                EntityKind::Specification,
                EntityKind::Rule,
                EntityKind::Message
            ]
        );
    }

    #[test]
    fn organization_scope_admits_only_owner() {
        let org = Uuid::new_v4();
        assert!(Scope::Organization(org).admits(Some(org)));
        assert!(!Scope::Organization(org).admits(Some(Uuid::new_v4())));
        assert!(!Scope::Organization(org).admits(None));
        assert!(Scope::Global.admits(None));
    }
}
