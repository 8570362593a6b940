//! Postgres-backed store implementations.

mod entities;
mod util;

pub use entities::PgEntityStore;
pub use util::map_sqlx_error;

use std::sync::Arc;

use sqlx::{
    query,
    postgres::{PgPool, PgPoolOptions},
};

use crate::application::catalog::Stores;
use crate::application::entity::Entity;
use crate::domain::entities::*;
use crate::infra::items::ItemAssembler;

#[derive(Clone)]
pub struct PostgresStores {
    pool: Arc<PgPool>,
}

impl PostgresStores {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
    }

    /// Pool that opens connections on first use. Commands that only touch
    /// the cache never connect.
    pub fn connect_lazy(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_lazy(url)
    }

    pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        query("SELECT 1").execute(self.pool()).await.map(|_| ())
    }

    pub fn store<E: Entity>(&self) -> Arc<PgEntityStore<E>> {
        Arc::new(PgEntityStore::new(self.pool().clone()))
    }

    /// Every kind's store, items assembled with their children.
    pub fn stores(&self) -> Stores {
        let images = self.store::<ImageRecord>();
        let comments = self.store::<CommentRecord>();
        let specifications = self.store::<SpecificationRecord>();
        Stores {
            organizations: self.store::<OrganizationRecord>(),
            categories: self.store::<CategoryRecord>(),
            items: Arc::new(ItemAssembler::new(
                self.store::<ItemRecord>(),
                images.clone(),
                comments.clone(),
                specifications.clone(),
            )),
            tables: self.store::<TableRecord>(),
            orders: self.store::<OrderRecord>(),
            images,
            comments,
            specifications,
            rules: self.store::<RuleRecord>(),
            messages: self.store::<MessageRecord>(),
            users: self.store::<UserRecord>(),
            roles: self.store::<RoleRecord>(),
        }
    }
}
