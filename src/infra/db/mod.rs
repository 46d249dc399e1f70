//! Postgres-backed repository implementations.

mod comments;
mod posts;
mod tags;
mod util;

pub use util::map_sqlx_error;

use std::sync::Arc;

use sqlx::{
    migrate::MigrateError,
    postgres::{PgPool, PgPoolOptions},
    query,
};

const POST_COLUMNS: &str = "p.id, p.slug, p.title, p.text, p.image, p.published_at, \
    a.id AS author_id, a.username AS author_username";

#[derive(Clone)]
pub struct PostgresRepositories {
    pool: Arc<PgPool>,
}

impl PostgresRepositories {
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

    pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
        sqlx::migrate!("./migrations").run(pool).await
    }

    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        query("SELECT 1").execute(self.pool()).await.map(|_| ())
    }
}
