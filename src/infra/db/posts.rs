use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{PostsRepo, RepoError},
    domain::entities::{AuthorRecord, PostRecord, RankedPost},
};

use super::{
    POST_COLUMNS, PostgresRepositories,
    util::{convert_count, map_sqlx_error},
};

#[derive(sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    slug: String,
    title: String,
    text: String,
    image: Option<String>,
    published_at: OffsetDateTime,
    author_id: Uuid,
    author_username: String,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            title: row.title,
            text: row.text,
            image: row.image,
            author: AuthorRecord {
                id: row.author_id,
                username: row.author_username,
            },
            published_at: row.published_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RankedPostRow {
    #[sqlx(flatten)]
    post: PostRow,
    likes: i64,
}

impl PostgresRepositories {
    fn posts_select<'q>() -> QueryBuilder<'q, Postgres> {
        let mut qb = QueryBuilder::new("SELECT ");
        qb.push(POST_COLUMNS);
        qb.push(" FROM posts p INNER JOIN authors a ON a.id = p.author_id ");
        qb
    }
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn list_popular(&self, limit: u32) -> Result<Vec<RankedPost>, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(POST_COLUMNS);
        qb.push(
            ", COUNT(l.author_id) AS likes \
             FROM posts p \
             INNER JOIN authors a ON a.id = p.author_id \
             LEFT JOIN likes l ON l.post_id = p.id \
             GROUP BY p.id, a.id \
             ORDER BY likes DESC, p.id \
             LIMIT ",
        );
        qb.push_bind(i64::from(limit));

        let rows = qb
            .build_query_as::<RankedPostRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter()
            .map(|row| {
                Ok(RankedPost {
                    likes: convert_count(row.likes)?,
                    post: PostRecord::from(row.post),
                })
            })
            .collect()
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<PostRecord>, RepoError> {
        let mut qb = Self::posts_select();
        qb.push("ORDER BY p.published_at DESC, p.id LIMIT ");
        qb.push_bind(i64::from(limit));

        let rows = qb
            .build_query_as::<PostRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn list_for_tag(&self, tag_id: Uuid, limit: u32) -> Result<Vec<PostRecord>, RepoError> {
        let mut qb = Self::posts_select();
        qb.push("INNER JOIN post_tags pt ON pt.post_id = p.id WHERE pt.tag_id = ");
        qb.push_bind(tag_id);
        qb.push(" ORDER BY p.published_at DESC, p.id LIMIT ");
        qb.push_bind(i64::from(limit));

        let rows = qb
            .build_query_as::<PostRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<PostRecord>, RepoError> {
        let mut qb = Self::posts_select();
        qb.push("WHERE p.slug = ");
        qb.push_bind(slug);

        let row = qb
            .build_query_as::<PostRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(PostRecord::from))
    }

    async fn count_likes(&self, post_id: Uuid) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE post_id = $1")
            .bind(post_id)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        convert_count(count)
    }
}
