//! In-process source-of-truth store.
//!
//! Used by the test suite and by `cache.backend = "memory"` development runs.
//! It follows the same visibility, ordering and delete rules as the Postgres
//! store and counts every call so tests can assert on storage traffic.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::catalog::Stores;
use crate::application::entity::Entity;
use crate::application::inputs::UpdateInput;
use crate::application::repos::{EntityStore, ListParams, RepoError, SortOrder};
use crate::domain::entities::*;
use crate::domain::types::{DeletePolicy, EntityKind, Scope};
use crate::infra::items::ItemAssembler;
use crate::util::lock::{rw_read, rw_write};

const SOURCE: &str = "infra::memory";

/// Per-operation call counts of a [`MemoryStore`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCalls {
    pub get_all: u64,
    pub get_one: u64,
    pub create: u64,
    pub update: u64,
    pub delete: u64,
}

impl StoreCalls {
    pub fn reads(&self) -> u64 {
        self.get_all + self.get_one
    }

    pub fn writes(&self) -> u64 {
        self.create + self.update + self.delete
    }

    pub fn total(&self) -> u64 {
        self.reads() + self.writes()
    }
}

#[derive(Debug, Default)]
struct Counters {
    get_all: AtomicU64,
    get_one: AtomicU64,
    create: AtomicU64,
    update: AtomicU64,
    delete: AtomicU64,
}

#[derive(Debug, Clone)]
struct Row<E> {
    seq: u64,
    record: E,
}

struct Inner<E> {
    rows: RwLock<HashMap<Uuid, Row<E>>>,
    next_seq: AtomicU64,
    counters: Counters,
    fail_writes: AtomicBool,
}

pub struct MemoryStore<E> {
    inner: Arc<Inner<E>>,
}

impl<E> Clone for MemoryStore<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<E: Entity> Default for MemoryStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> MemoryStore<E> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                rows: RwLock::new(HashMap::new()),
                next_seq: AtomicU64::new(0),
                counters: Counters::default(),
                fail_writes: AtomicBool::new(false),
            }),
        }
    }

    pub fn calls(&self) -> StoreCalls {
        let counters = &self.inner.counters;
        StoreCalls {
            get_all: counters.get_all.load(Ordering::Relaxed),
            get_one: counters.get_one.load(Ordering::Relaxed),
            create: counters.create.load(Ordering::Relaxed),
            update: counters.update.load(Ordering::Relaxed),
            delete: counters.delete.load(Ordering::Relaxed),
        }
    }

    /// Make every subsequent create, update and delete fail.
    pub fn fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::Relaxed);
    }

    /// Row as stored, soft-deleted or not. Not counted.
    pub fn raw(&self, id: Uuid) -> Option<E> {
        rw_read(&self.inner.rows, SOURCE, "raw")
            .get(&id)
            .map(|row| row.record.clone())
    }

    /// Number of stored rows, soft-deleted ones included. Not counted.
    pub fn raw_len(&self) -> usize {
        rw_read(&self.inner.rows, SOURCE, "raw_len").len()
    }

    /// Insert a record directly, bypassing validation and counters.
    pub fn seed(&self, record: E) {
        let seq = self.inner.next_seq.fetch_add(1, Ordering::Relaxed);
        rw_write(&self.inner.rows, SOURCE, "seed").insert(record.id(), Row { seq, record });
    }

    fn check_writable(&self) -> Result<(), RepoError> {
        if self.inner.fail_writes.load(Ordering::Relaxed) {
            return Err(RepoError::Persistence("injected write failure".to_string()));
        }
        Ok(())
    }

    fn visible(scope: Scope, record: &E) -> bool {
        !record.audit().is_deleted
            && (!E::KIND.is_organization_scoped() || scope.admits(record.owner()))
    }
}

#[async_trait]
impl<E: Entity> EntityStore<E> for MemoryStore<E> {
    async fn get_all(&self, scope: Scope, params: &ListParams) -> Result<Vec<E>, RepoError> {
        self.inner.counters.get_all.fetch_add(1, Ordering::Relaxed);

        let term = params.search_term().map(str::to_lowercase);
        let mut rows: Vec<Row<E>> = rw_read(&self.inner.rows, SOURCE, "get_all")
            .values()
            .filter(|row| Self::visible(scope, &row.record))
            .filter(|row| {
                params
                    .item_id
                    .is_none_or(|item_id| row.record.parent(EntityKind::Item) == Some(item_id))
            })
            .filter(|row| {
                term.as_deref().is_none_or(|term| {
                    row.record.search_text().to_lowercase().contains(term)
                })
            })
            .cloned()
            .collect();

        match params.sort {
            SortOrder::CreatedAsc => rows.sort_by_key(|row| row.seq),
            SortOrder::CreatedDesc => rows.sort_by_key(|row| std::cmp::Reverse(row.seq)),
            SortOrder::NameAsc => rows.sort_by_cached_key(|row| {
                (row.record.search_text().to_lowercase(), row.seq)
            }),
        }

        let offset = params.offset.unwrap_or(0) as usize;
        let limit = params.limit.map_or(usize::MAX, |limit| limit as usize);
        Ok(rows
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|row| row.record)
            .collect())
    }

    async fn get_one(&self, scope: Scope, id: Uuid) -> Result<Option<E>, RepoError> {
        self.inner.counters.get_one.fetch_add(1, Ordering::Relaxed);

        Ok(rw_read(&self.inner.rows, SOURCE, "get_one")
            .get(&id)
            .map(|row| &row.record)
            .filter(|record| Self::visible(scope, record))
            .cloned())
    }

    async fn create(&self, scope: Scope, input: E::Create) -> Result<Uuid, RepoError> {
        self.inner.counters.create.fetch_add(1, Ordering::Relaxed);
        self.check_writable()?;

        let id = Uuid::new_v4();
        let record = E::build(id, scope.organization_id(), input, OffsetDateTime::now_utc())
            .map_err(|err| RepoError::InvalidInput {
                message: err.to_string(),
            })?;
        self.seed(record);
        Ok(id)
    }

    async fn update(&self, scope: Scope, input: E::Update) -> Result<(), RepoError> {
        self.inner.counters.update.fetch_add(1, Ordering::Relaxed);
        self.check_writable()?;

        let mut rows = rw_write(&self.inner.rows, SOURCE, "update");
        let row = rows
            .get_mut(&input.id())
            .filter(|row| Self::visible(scope, &row.record))
            .ok_or(RepoError::NotFound)?;
        row.record.apply(input);
        row.record.audit_mut().touch(OffsetDateTime::now_utc());
        Ok(())
    }

    async fn delete(&self, scope: Scope, id: Uuid, actor: Uuid) -> Result<(), RepoError> {
        self.inner.counters.delete.fetch_add(1, Ordering::Relaxed);
        self.check_writable()?;

        let mut rows = rw_write(&self.inner.rows, SOURCE, "delete");
        let visible = rows
            .get(&id)
            .is_some_and(|row| Self::visible(scope, &row.record));
        if !visible {
            return Err(RepoError::NotFound);
        }

        match E::KIND.delete_policy() {
            DeletePolicy::Hard => {
                rows.remove(&id);
            }
            DeletePolicy::Soft => {
                if let Some(row) = rows.get_mut(&id) {
                    row.record
                        .audit_mut()
                        .mark_deleted(actor, OffsetDateTime::now_utc());
                }
            }
        }
        Ok(())
    }
}

/// Typed handles to one in-memory store per kind.
#[derive(Clone, Default)]
pub struct MemoryStores {
    pub organizations: MemoryStore<OrganizationRecord>,
    pub categories: MemoryStore<CategoryRecord>,
    pub items: MemoryStore<ItemRecord>,
    pub tables: MemoryStore<TableRecord>,
    pub orders: MemoryStore<OrderRecord>,
    pub images: MemoryStore<ImageRecord>,
    pub comments: MemoryStore<CommentRecord>,
    pub specifications: MemoryStore<SpecificationRecord>,
    pub rules: MemoryStore<RuleRecord>,
    pub messages: MemoryStore<MessageRecord>,
    pub users: MemoryStore<UserRecord>,
    pub roles: MemoryStore<RoleRecord>,
}

impl MemoryStores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trait-object view for [`MenuServices`](crate::application::catalog::MenuServices),
    /// items assembled with their children.
    pub fn stores(&self) -> Stores {
        Stores {
            organizations: Arc::new(self.organizations.clone()),
            categories: Arc::new(self.categories.clone()),
            items: Arc::new(ItemAssembler::new(
                Arc::new(self.items.clone()),
                Arc::new(self.images.clone()),
                Arc::new(self.comments.clone()),
                Arc::new(self.specifications.clone()),
            )),
            tables: Arc::new(self.tables.clone()),
            orders: Arc::new(self.orders.clone()),
            images: Arc::new(self.images.clone()),
            comments: Arc::new(self.comments.clone()),
            specifications: Arc::new(self.specifications.clone()),
            rules: Arc::new(self.rules.clone()),
            messages: Arc::new(self.messages.clone()),
            users: Arc::new(self.users.clone()),
            roles: Arc::new(self.roles.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::inputs::{CreateRuleInput, UpdateRuleInput};
    use crate::domain::entities::RuleRecord;

    fn rule(name: &str) -> CreateRuleInput {
        CreateRuleInput {
            name: name.to_string(),
            description: None,
            enabled: true,
        }
    }

    #[tokio::test]
    async fn lists_in_creation_order_and_filters_by_search() {
        let store = MemoryStore::<RuleRecord>::new();
        for name in ["Dress code", "No pets", "No smoking"] {
            store.create(Scope::Global, rule(name)).await.expect("create");
        }

        let all = store
            .get_all(Scope::Global, &ListParams::default())
            .await
            .expect("list");
        let names: Vec<_> = all.iter().map(|rule| rule.name.as_str()).collect();
        assert_eq!(names, ["Dress code", "No pets", "No smoking"]);

        let filtered = store
            .get_all(
                Scope::Global,
                &ListParams {
                    search: Some("no ".to_string()),
                    sort: SortOrder::CreatedDesc,
                    limit: Some(1),
                    ..Default::default()
                },
            )
            .await
            .expect("list");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "No smoking");
        assert_eq!(store.calls().get_all, 2);
    }

    #[tokio::test]
    async fn update_of_missing_row_is_not_found() {
        let store = MemoryStore::<RuleRecord>::new();
        let result = store
            .update(
                Scope::Global,
                UpdateRuleInput {
                    id: Uuid::new_v4(),
                    enabled: Some(false),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(RepoError::NotFound)));
    }

    #[tokio::test]
    async fn hard_delete_removes_the_row() {
        let store = MemoryStore::<RuleRecord>::new();
        let id = store.create(Scope::Global, rule("x")).await.expect("create");

        store
            .delete(Scope::Global, id, Uuid::new_v4())
            .await
            .expect("delete");

        assert!(store.raw(id).is_none());
        assert!(matches!(
            store.delete(Scope::Global, id, Uuid::new_v4()).await,
            Err(RepoError::NotFound)
        ));
    }
}
