use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::application::entity::Entity;
use crate::application::inputs::UpdateInput;
use crate::application::repos::{EntityStore, ListParams, RepoError, SortOrder};
use crate::domain::entities::ItemRecord;
use crate::domain::types::{DeletePolicy, EntityKind, Scope};

use super::util::{contains_pattern, map_sqlx_error};

/// Document-table store: one row per record, the record itself in `body`,
/// and the columns reads filter and sort on pulled out next to it.
pub struct PgEntityStore<E> {
    pool: PgPool,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for PgEntityStore<E> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> PgEntityStore<E> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    fn table() -> &'static str {
        E::KIND.table()
    }

    fn select_visible<'q>(scope: Scope) -> QueryBuilder<'q, Postgres> {
        let mut qb = QueryBuilder::new("SELECT body FROM ");
        qb.push(Self::table());
        qb.push(" WHERE is_deleted = FALSE");
        push_scope(&mut qb, E::KIND, scope);
        qb
    }

    async fn fetch_for_update(
        tx: &mut Transaction<'_, Postgres>,
        scope: Scope,
        id: Uuid,
    ) -> Result<E, RepoError> {
        let mut qb = Self::select_visible(scope);
        qb.push(" AND id = ");
        qb.push_bind(id);
        qb.push(" FOR UPDATE");

        let body = qb
            .build_query_scalar::<Json<serde_json::Value>>()
            .fetch_optional(&mut **tx)
            .await
            .map_err(map_sqlx_error)?
            .ok_or(RepoError::NotFound)?;
        decode(body)
    }

    async fn write_body(
        tx: &mut Transaction<'_, Postgres>,
        record: &E,
    ) -> Result<(), RepoError> {
        let audit = record.audit();
        let body = encode(record)?;

        let mut qb = QueryBuilder::new("UPDATE ");
        qb.push(Self::table());
        qb.push(" SET body = ");
        qb.push_bind(body);
        qb.push(", search_text = ");
        qb.push_bind(record.search_text());
        qb.push(", is_deleted = ");
        qb.push_bind(audit.is_deleted);
        qb.push(", user_deleted = ");
        qb.push_bind(audit.user_deleted);
        qb.push(", deleted_at = ");
        qb.push_bind(audit.deleted_at);
        qb.push(", updated_at = ");
        qb.push_bind(audit.updated_at);
        qb.push(" WHERE id = ");
        qb.push_bind(record.id());

        qb.build()
            .execute(&mut **tx)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}

fn push_scope(qb: &mut QueryBuilder<'_, Postgres>, kind: EntityKind, scope: Scope) {
    if let Scope::Organization(org) = scope
        && kind.is_organization_scoped()
    {
        qb.push(" AND organization_id = ");
        qb.push_bind(org);
    }
}

fn encode<E: Entity>(record: &E) -> Result<Json<serde_json::Value>, RepoError> {
    let mut value = serde_json::to_value(record)?;
    // Embedded children are assembled at read time, never persisted with the item.
    if E::KIND == EntityKind::Item
        && let Some(object) = value.as_object_mut()
    {
        for field in ItemRecord::EMBEDDED {
            object.remove(*field);
        }
    }
    Ok(Json(value))
}

fn decode<E: Entity>(body: Json<serde_json::Value>) -> Result<E, RepoError> {
    Ok(serde_json::from_value(body.0)?)
}

fn invalid_input(err: impl std::fmt::Display) -> RepoError {
    RepoError::InvalidInput {
        message: err.to_string(),
    }
}

#[async_trait]
impl<E: Entity> EntityStore<E> for PgEntityStore<E> {
    async fn get_all(&self, scope: Scope, params: &ListParams) -> Result<Vec<E>, RepoError> {
        let mut qb = Self::select_visible(scope);

        if let Some(item_id) = params.item_id {
            qb.push(" AND item_id = ");
            qb.push_bind(item_id);
        }
        if let Some(term) = params.search_term() {
            qb.push(" AND search_text ILIKE ");
            qb.push_bind(contains_pattern(term));
        }

        qb.push(match params.sort {
            SortOrder::CreatedAsc => " ORDER BY created_at ASC, id ASC",
            SortOrder::CreatedDesc => " ORDER BY created_at DESC, id DESC",
            SortOrder::NameAsc => " ORDER BY LOWER(search_text) ASC, id ASC",
        });

        if let Some(limit) = params.limit {
            qb.push(" LIMIT ");
            qb.push_bind(i64::from(limit));
        }
        if let Some(offset) = params.offset {
            qb.push(" OFFSET ");
            qb.push_bind(i64::from(offset));
        }

        let rows = qb
            .build_query_scalar::<Json<serde_json::Value>>()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter().map(decode).collect()
    }

    async fn get_one(&self, scope: Scope, id: Uuid) -> Result<Option<E>, RepoError> {
        let mut qb = Self::select_visible(scope);
        qb.push(" AND id = ");
        qb.push_bind(id);

        let row = qb
            .build_query_scalar::<Json<serde_json::Value>>()
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(decode).transpose()
    }

    async fn create(&self, scope: Scope, input: E::Create) -> Result<Uuid, RepoError> {
        let now = OffsetDateTime::now_utc();
        let id = Uuid::new_v4();
        let record = E::build(id, scope.organization_id(), input, now).map_err(invalid_input)?;
        let audit = record.audit();

        let mut qb = QueryBuilder::new("INSERT INTO ");
        qb.push(Self::table());
        qb.push(
            " (id, organization_id, item_id, search_text, body, is_deleted, user_deleted, deleted_at, created_at, updated_at) VALUES (",
        );
        {
            let mut values = qb.separated(", ");
            values.push_bind(id);
            values.push_bind(record.owner());
            values.push_bind(record.parent(EntityKind::Item));
            values.push_bind(record.search_text());
            values.push_bind(encode(&record)?);
            values.push_bind(audit.is_deleted);
            values.push_bind(audit.user_deleted);
            values.push_bind(audit.deleted_at);
            values.push_bind(audit.created_at);
            values.push_bind(audit.updated_at);
            values.push_unseparated(")");
        }

        qb.build()
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        debug!(entity = %E::KIND, id = %id, "Inserted row");
        Ok(id)
    }

    async fn update(&self, scope: Scope, input: E::Update) -> Result<(), RepoError> {
        let id = input.id();
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let mut record = Self::fetch_for_update(&mut tx, scope, id).await?;
        record.apply(input);
        record.audit_mut().touch(OffsetDateTime::now_utc());
        Self::write_body(&mut tx, &record).await?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn delete(&self, scope: Scope, id: Uuid, actor: Uuid) -> Result<(), RepoError> {
        match E::KIND.delete_policy() {
            DeletePolicy::Hard => {
                let mut qb = QueryBuilder::new("DELETE FROM ");
                qb.push(Self::table());
                qb.push(" WHERE is_deleted = FALSE");
                push_scope(&mut qb, E::KIND, scope);
                qb.push(" AND id = ");
                qb.push_bind(id);

                let result = qb
                    .build()
                    .execute(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;
                if result.rows_affected() == 0 {
                    return Err(RepoError::NotFound);
                }
            }
            DeletePolicy::Soft => {
                let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
                let mut record = Self::fetch_for_update(&mut tx, scope, id).await?;
                record
                    .audit_mut()
                    .mark_deleted(actor, OffsetDateTime::now_utc());
                Self::write_body(&mut tx, &record).await?;
                tx.commit().await.map_err(map_sqlx_error)?;
            }
        }
        Ok(())
    }
}
