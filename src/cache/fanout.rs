//! Cross-entity invalidation.
//!
//! Item values embed their images, comments and specifications, and the role
//! cache mirrors `UserRecord::role`. A mutation of one of those kinds must
//! also purge the cache entries that copy it.

use std::collections::BTreeSet;

use uuid::Uuid;

use crate::application::entity::Entity;
use crate::cache::keys::{Namespace, user_role_key};
use crate::domain::types::{EntityKind, Scope};

/// Cache namespace that holds a copy of another kind's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dependent {
    /// Singletons and collections of another entity kind.
    Entity(EntityKind),
    /// `user_role:<id>` entries.
    UserRole,
}

const ITEM_CHILD: &[Dependent] = &[Dependent::Entity(EntityKind::Item)];
const USER: &[Dependent] = &[Dependent::UserRole];

pub fn dependents(kind: EntityKind) -> &'static [Dependent] {
    match kind {
        EntityKind::Comment | EntityKind::Image | EntityKind::Specification => ITEM_CHILD,
        EntityKind::User => USER,
        _ => &[],
    }
}

/// Whether deleting a `kind` row needs its parent id from a pre-read.
pub fn needs_parent(kind: EntityKind) -> bool {
    dependents(kind)
        .iter()
        .any(|dependent| matches!(dependent, Dependent::Entity(_)))
}

/// Keys and prefixes to purge after a mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvalidationPlan {
    pub keys: BTreeSet<String>,
    pub prefixes: BTreeSet<String>,
}

impl InvalidationPlan {
    /// Purges after a create, update or delete of `id`.
    ///
    /// The mutated singleton itself is not part of the plan: writes overwrite
    /// it and deletes remove it explicitly. `entity` is the canonical row when
    /// known; without it, dependents fall back to a namespace-wide purge.
    pub fn for_mutation<E: Entity>(scope: Scope, id: Uuid, entity: Option<&E>) -> Self {
        let scope = effective_scope(scope, entity);
        let mut plan = Self::default();
        plan.purge_collections(Namespace::of(E::KIND), scope);

        for dependent in dependents(E::KIND) {
            match *dependent {
                Dependent::Entity(kind) => {
                    let namespace = Namespace::of(kind);
                    match entity.and_then(|entity| entity.parent(kind)) {
                        Some(parent) => {
                            plan.keys.insert(namespace.singleton_key(parent));
                        }
                        None => {
                            plan.prefixes.insert(namespace.singleton.to_string());
                        }
                    }
                    plan.purge_collections(namespace, scope);
                }
                Dependent::UserRole => {
                    plan.keys.insert(user_role_key(id));
                }
            }
        }

        plan
    }

    /// Purges every entry of `kind` in `scope`, dependents included.
    pub fn for_namespace(kind: EntityKind, scope: Scope) -> Self {
        let namespace = Namespace::of(kind);
        let mut plan = Self::default();
        plan.prefixes.insert(namespace.singleton.to_string());
        plan.purge_collections(namespace, scope);

        for dependent in dependents(kind) {
            match *dependent {
                Dependent::Entity(kind) => {
                    let namespace = Namespace::of(kind);
                    plan.prefixes.insert(namespace.singleton.to_string());
                    plan.purge_collections(namespace, scope);
                }
                Dependent::UserRole => {
                    plan.prefixes
                        .insert(crate::cache::keys::USER_ROLE_PREFIX.to_string());
                }
            }
        }

        plan
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() && self.prefixes.is_empty()
    }

    /// Every listing of `namespace` that can contain a row in `scope`,
    /// including the cross-organization listing.
    fn purge_collections(&mut self, namespace: Namespace, scope: Scope) {
        self.prefixes.insert(namespace.collection_prefix(scope));
        if matches!(scope, Scope::Organization(_))
            && let Some((key, variants)) = namespace.cross_organization_listing()
        {
            self.keys.insert(key);
            self.prefixes.insert(variants);
        }
    }
}

/// The row's own organization wins over a global request scope so a
/// platform-level write only purges the namespace it touched.
fn effective_scope<E: Entity>(scope: Scope, entity: Option<&E>) -> Scope {
    match entity.and_then(Entity::owner) {
        Some(owner) if E::KIND.is_organization_scoped() => Scope::Organization(owner),
        _ => scope,
    }
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;
    use crate::domain::entities::{AuditFields, CommentRecord, RuleRecord, UserRecord};

    fn comment(org: Uuid, item: Uuid) -> CommentRecord {
        CommentRecord {
            id: Uuid::new_v4(),
            organization_id: org,
            item_id: item,
            author_id: None,
            body: "good".to_string(),
            rating: Some(4),
            audit: AuditFields::new(OffsetDateTime::now_utc()),
        }
    }

    #[test]
    fn child_mutation_purges_parent_item() {
        let org = Uuid::new_v4();
        let item = Uuid::new_v4();
        let row = comment(org, item);

        let plan =
            InvalidationPlan::for_mutation(Scope::Organization(org), row.id, Some(&row));

        assert!(plan.keys.contains(&format!("item:{item}")));
        assert!(plan.prefixes.contains(&format!("comments:o.{org}")));
        assert!(plan.prefixes.contains(&format!("items:o.{org}")));
        assert!(!plan.prefixes.contains("item:"));
    }

    #[test]
    fn unknown_parent_purges_whole_item_namespace() {
        let org = Uuid::new_v4();
        let plan = InvalidationPlan::for_mutation::<CommentRecord>(
            Scope::Organization(org),
            Uuid::new_v4(),
            None,
        );

        assert!(plan.prefixes.contains("item:"));
        assert!(plan.prefixes.contains(&format!("items:o.{org}")));
    }

    #[test]
    fn global_scope_child_write_uses_row_organization() {
        let org = Uuid::new_v4();
        let row = comment(org, Uuid::new_v4());

        let plan = InvalidationPlan::for_mutation(Scope::Global, row.id, Some(&row));

        assert!(plan.prefixes.contains(&format!("items:o.{org}")));
        assert!(!plan.prefixes.contains("items:o."));
    }

    #[test]
    fn organization_write_purges_cross_organization_listings() {
        let org = Uuid::new_v4();
        let row = comment(org, Uuid::new_v4());

        let plan = InvalidationPlan::for_mutation(Scope::Organization(org), row.id, Some(&row));

        assert!(plan.keys.contains("comments:o."));
        assert!(plan.prefixes.contains("comments:o.:q."));
        assert!(plan.keys.contains("items:o."));
        assert!(plan.prefixes.contains("items:o.:q."));

        let plan = InvalidationPlan::for_namespace(EntityKind::Image, Scope::Organization(org));
        assert!(plan.keys.contains("images:o."));
        assert!(plan.keys.contains("items:o."));
        assert!(plan.prefixes.contains("items:o.:q."));
    }

    #[test]
    fn user_mutation_purges_role_entry() {
        let id = Uuid::new_v4();
        let plan = InvalidationPlan::for_mutation::<UserRecord>(Scope::Global, id, None);

        assert!(plan.keys.contains(&format!("user_role:{id}")));
        assert!(plan.prefixes.contains("users"));
    }

    #[test]
    fn kinds_without_dependents_only_purge_their_collection() {
        let plan =
            InvalidationPlan::for_mutation::<RuleRecord>(Scope::Global, Uuid::new_v4(), None);

        assert!(plan.keys.is_empty());
        assert_eq!(plan.prefixes.len(), 1);
        assert!(plan.prefixes.contains("rules"));
        assert!(!needs_parent(EntityKind::Rule));
        assert!(needs_parent(EntityKind::Specification));
        assert!(!needs_parent(EntityKind::User));
    }

    #[test]
    fn namespace_purge_covers_singletons_and_dependents() {
        let plan = InvalidationPlan::for_namespace(EntityKind::Image, Scope::Global);

        for prefix in ["image:", "images:o.", "item:", "items:o."] {
            assert!(plan.prefixes.contains(prefix), "missing {prefix}");
        }
    }
}
