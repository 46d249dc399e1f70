use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{CommentsRepo, RepoError},
    domain::entities::{AuthorRecord, CommentRecord},
};

use super::{
    PostgresRepositories,
    util::{fill_counts, map_sqlx_error},
};

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: Uuid,
    post_id: Uuid,
    text: String,
    published_at: OffsetDateTime,
    author_id: Uuid,
    author_username: String,
}

impl From<CommentRow> for CommentRecord {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            post_id: row.post_id,
            text: row.text,
            author: AuthorRecord {
                id: row.author_id,
                username: row.author_username,
            },
            published_at: row.published_at,
        }
    }
}

#[async_trait]
impl CommentsRepo for PostgresRepositories {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentRecord>, RepoError> {
        let rows = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT c.id, c.post_id, c.text, c.published_at,
                   a.id AS author_id, a.username AS author_username
            FROM comments c
            INNER JOIN authors a ON a.id = c.author_id
            WHERE c.post_id = $1
            ORDER BY c.published_at ASC, c.id
            "#,
        )
        .bind(post_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CommentRecord::from).collect())
    }

    async fn count_for_posts(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, u64>, RepoError> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(Uuid, i64)> = sqlx::query_as(
            r#"
            SELECT post_id, COUNT(*)
            FROM comments
            WHERE post_id = ANY($1)
            GROUP BY post_id
            "#,
        )
        .bind(post_ids)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        fill_counts(post_ids, rows)
    }
}
