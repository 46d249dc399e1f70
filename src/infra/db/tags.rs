use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    application::repos::{RepoError, TagsRepo},
    domain::entities::{TagRecord, TagWithCount},
};

use super::{
    PostgresRepositories,
    util::{convert_count, fill_counts, map_sqlx_error},
};

#[derive(sqlx::FromRow)]
struct TagRow {
    id: Uuid,
    title: String,
}

impl From<TagRow> for TagRecord {
    fn from(row: TagRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TagCountRow {
    id: Uuid,
    title: String,
    posts: i64,
}

#[derive(sqlx::FromRow)]
struct PostTagRow {
    post_id: Uuid,
    id: Uuid,
    title: String,
}

#[async_trait]
impl TagsRepo for PostgresRepositories {
    async fn list_popular(&self, limit: u32) -> Result<Vec<TagWithCount>, RepoError> {
        let rows = sqlx::query_as::<_, TagCountRow>(
            r#"
            SELECT t.id, t.title, COUNT(pt.post_id) AS posts
            FROM tags t
            LEFT JOIN post_tags pt ON pt.tag_id = t.id
            GROUP BY t.id
            ORDER BY posts DESC, t.title
            LIMIT $1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter()
            .map(|row| {
                Ok(TagWithCount {
                    posts: convert_count(row.posts)?,
                    tag: TagRecord {
                        id: row.id,
                        title: row.title,
                    },
                })
            })
            .collect()
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<TagRecord>, RepoError> {
        let row = sqlx::query_as::<_, TagRow>(
            r#"
            SELECT id, title
            FROM tags
            WHERE title = $1
            "#,
        )
        .bind(title)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(TagRecord::from))
    }

    async fn list_for_posts(
        &self,
        post_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<TagRecord>>, RepoError> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, PostTagRow>(
            r#"
            SELECT pt.post_id, t.id, t.title
            FROM post_tags pt
            INNER JOIN tags t ON t.id = pt.tag_id
            WHERE pt.post_id = ANY($1)
            ORDER BY t.title ASC
            "#,
        )
        .bind(post_ids)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        let mut grouped: HashMap<Uuid, Vec<TagRecord>> = HashMap::new();
        for row in rows {
            grouped.entry(row.post_id).or_default().push(TagRecord {
                id: row.id,
                title: row.title,
            });
        }
        Ok(grouped)
    }

    async fn post_counts(&self, tag_ids: &[Uuid]) -> Result<HashMap<Uuid, u64>, RepoError> {
        if tag_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(Uuid, i64)> = sqlx::query_as(
            r#"
            SELECT tag_id, COUNT(*)
            FROM post_tags
            WHERE tag_id = ANY($1)
            GROUP BY tag_id
            "#,
        )
        .bind(tag_ids)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        fill_counts(tag_ids, rows)
    }
}
