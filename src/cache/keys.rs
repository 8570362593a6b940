//! Cache key definitions.
//!
//! Singleton keys are `<prefix><id>`; collection keys are the bare collection
//! prefix for global kinds or `<prefix><organization id>` for
//! organization-scoped kinds. Listings with non-default parameters append
//! `:q.<digest>` to the collection key so every variant still sits under the
//! collection key and one prefix purge drops them all.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::application::repos::ListParams;
use crate::domain::types::{EntityKind, Scope};

/// Prefix of the authorization cache entries (`user_role:<user id>`).
pub const USER_ROLE_PREFIX: &str = "user_role:";

const QUERY_SEPARATOR: &str = ":q.";
const DIGEST_LEN: usize = 16;

/// Key namespace of one entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Namespace {
    pub kind: EntityKind,
    pub singleton: &'static str,
    pub collection: &'static str,
}

const fn ns(kind: EntityKind, singleton: &'static str, collection: &'static str) -> Namespace {
    Namespace {
        kind,
        singleton,
        collection,
    }
}

const CATEGORY: Namespace = ns(EntityKind::Category, "category:", "categories:o.");
const ITEM: Namespace = ns(EntityKind::Item, "item:", "items:o.");
const TABLE: Namespace = ns(EntityKind::Table, "table:", "tables:o.");
const ORDER: Namespace = ns(EntityKind::Order, "order:", "orders:o.");
const IMAGE: Namespace = ns(EntityKind::Image, "image:", "images:o.");
const COMMENT: Namespace = ns(EntityKind::Comment, "comment:", "comments:o.");
const SPECIFICATION: Namespace = ns(
    EntityKind::Specification,
    "specification:",
    "specifications:o.",
);
const RULE: Namespace = ns(EntityKind::Rule, "rule:", "rules");
const MESSAGE: Namespace = ns(EntityKind::Message, "message:", "messages");
const USER: Namespace = ns(EntityKind::User, "user:", "users");
const ORGANIZATION: Namespace = ns(EntityKind::Organization, "organization:", "organizations");
const ROLE: Namespace = ns(EntityKind::Role, "role:", "roles");

impl Namespace {
    pub fn of(kind: EntityKind) -> Namespace {
        match kind {
            EntityKind::Category => CATEGORY,
            EntityKind::Item => ITEM,
            EntityKind::Table => TABLE,
            EntityKind::Order => ORDER,
            EntityKind::Image => IMAGE,
            EntityKind::Comment => COMMENT,
            EntityKind::Specification => SPECIFICATION,
            EntityKind::Rule => RULE,
            EntityKind::Message => MESSAGE,
            EntityKind::User => USER,
            EntityKind::Organization => ORGANIZATION,
            EntityKind::Role => ROLE,
        }
    }

    pub fn singleton_key(&self, id: Uuid) -> String {
        format!("{}{id}", self.singleton)
    }

    /// Collection key of the default listing, also the purge prefix for
    /// every listing in `scope`.
    ///
    /// A global scope on an organization-scoped kind yields the bare
    /// collection prefix, which covers all organizations.
    pub fn collection_prefix(&self, scope: Scope) -> String {
        match scope {
            Scope::Organization(id) if self.kind.is_organization_scoped() => {
                format!("{}{id}", self.collection)
            }
            _ => self.collection.to_string(),
        }
    }

    /// Listing that spans every organization of an organization-scoped kind:
    /// the default key and the prefix of its filtered variants. An
    /// organization purge never reaches these, so writes purge them
    /// separately. `None` for global kinds.
    pub fn cross_organization_listing(&self) -> Option<(String, String)> {
        self.kind.is_organization_scoped().then(|| {
            (
                self.collection.to_string(),
                format!("{}{QUERY_SEPARATOR}", self.collection),
            )
        })
    }

    pub fn collection_key(&self, scope: Scope, params: &ListParams) -> String {
        let prefix = self.collection_prefix(scope);
        if params.is_default() {
            prefix
        } else {
            format!("{prefix}{QUERY_SEPARATOR}{}", hash_list_params(params))
        }
    }
}

pub fn user_role_key(user_id: Uuid) -> String {
    format!("{USER_ROLE_PREFIX}{user_id}")
}

/// Stable digest of listing parameters.
///
/// Shared caches outlive a single process, so the digest must not depend on
/// a per-process hasher seed.
pub fn hash_list_params(params: &ListParams) -> String {
    let mut hasher = Sha256::new();
    hasher.update(params.search_term().unwrap_or_default().as_bytes());
    hasher.update([0]);
    if let Some(item_id) = params.item_id {
        hasher.update(item_id.as_bytes());
    }
    hasher.update([0]);
    hasher.update([params.sort as u8]);
    hasher.update(params.limit.unwrap_or(u32::MAX).to_be_bytes());
    hasher.update(params.offset.unwrap_or(0).to_be_bytes());
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(DIGEST_LEN);
    digest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::repos::SortOrder;

    #[test]
    fn singleton_keys_follow_prefix_scheme() {
        let id = Uuid::nil();
        assert_eq!(
            Namespace::of(EntityKind::Category).singleton_key(id),
            format!("category:{id}")
        );
        assert_eq!(
            Namespace::of(EntityKind::User).singleton_key(id),
            format!("user:{id}")
        );
    }

    #[test]
    fn collection_keys_are_scoped_only_for_organization_kinds() {
        let org = Uuid::new_v4();
        let scope = Scope::Organization(org);
        let params = ListParams::default();

        assert_eq!(
            Namespace::of(EntityKind::Category).collection_key(scope, &params),
            format!("categories:o.{org}")
        );
        assert_eq!(
            Namespace::of(EntityKind::User).collection_key(scope, &params),
            "users"
        );
        assert_eq!(
            Namespace::of(EntityKind::Rule).collection_key(Scope::Global, &params),
            "rules"
        );
    }

    #[test]
    fn filtered_listings_get_distinct_keys_under_the_same_prefix() {
        let scope = Scope::Organization(Uuid::new_v4());
        let items = Namespace::of(EntityKind::Item);
        let prefix = items.collection_prefix(scope);

        let searched = ListParams {
            search: Some("pho".to_string()),
            ..Default::default()
        };
        let sorted = ListParams {
            sort: SortOrder::NameAsc,
            ..Default::default()
        };
        let paged = ListParams {
            limit: Some(10),
            offset: Some(20),
            ..Default::default()
        };

        let keys = [
            items.collection_key(scope, &ListParams::default()),
            items.collection_key(scope, &searched),
            items.collection_key(scope, &sorted),
            items.collection_key(scope, &paged),
        ];

        for key in &keys {
            assert!(key.starts_with(&prefix), "{key} outside {prefix}");
        }
        for (i, a) in keys.iter().enumerate() {
            for b in keys.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn cross_organization_listing_covers_global_variants() {
        let items = Namespace::of(EntityKind::Item);
        let (key, prefix) = items
            .cross_organization_listing()
            .expect("items are organization-scoped");
        let searched = ListParams {
            search: Some("pho".to_string()),
            ..Default::default()
        };

        assert_eq!(key, items.collection_key(Scope::Global, &ListParams::default()));
        assert!(items.collection_key(Scope::Global, &searched).starts_with(&prefix));
        assert!(!format!("items:o.{}", Uuid::new_v4()).starts_with(&prefix));
        assert!(Namespace::of(EntityKind::Rule).cross_organization_listing().is_none());
    }

    #[test]
    fn collection_names_match_kind_plurals() {
        for kind in EntityKind::ALL {
            assert!(Namespace::of(kind).collection.starts_with(kind.plural()));
        }
    }

    #[test]
    fn digest_is_stable_for_equal_params() {
        let a = ListParams {
            search: Some(" pho ".to_string()),
            limit: Some(5),
            ..Default::default()
        };
        let b = ListParams {
            search: Some("pho".to_string()),
            limit: Some(5),
            ..Default::default()
        };
        assert_eq!(hash_list_params(&a), hash_list_params(&b));
        assert_eq!(hash_list_params(&a).len(), 16);
    }

    #[test]
    fn singleton_and_collection_prefixes_do_not_overlap() {
        for kind in EntityKind::ALL {
            let own = Namespace::of(kind);
            for other in EntityKind::ALL {
                let other = Namespace::of(other);
                assert!(
                    !other.singleton.starts_with(own.collection),
                    "{} swallows {}",
                    own.collection,
                    other.singleton
                );
                if own.kind != other.kind {
                    assert!(!other.singleton.starts_with(own.singleton));
                    assert!(!other.collection.starts_with(own.collection));
                }
            }
            assert!(!USER_ROLE_PREFIX.starts_with(own.collection));
            assert!(!USER_ROLE_PREFIX.starts_with(own.singleton));
        }
    }
}
