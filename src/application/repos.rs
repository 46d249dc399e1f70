//! Repository traits describing persistence adapters.
//!
//! Every method that touches a collection of related rows takes the whole
//! batch of ids at once, so a page costs a fixed number of round trips no
//! matter how many posts it shows.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::{CommentRecord, PostRecord, RankedPost, TagRecord, TagWithCount};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// Posts ordered by like count, most liked first.
    async fn list_popular(&self, limit: u32) -> Result<Vec<RankedPost>, RepoError>;

    /// Posts ordered by publication time, newest first.
    async fn list_recent(&self, limit: u32) -> Result<Vec<PostRecord>, RepoError>;

    /// Posts carrying the given tag, newest first.
    async fn list_for_tag(&self, tag_id: Uuid, limit: u32) -> Result<Vec<PostRecord>, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<PostRecord>, RepoError>;

    async fn count_likes(&self, post_id: Uuid) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait TagsRepo: Send + Sync {
    /// Tags ordered by the number of posts referencing them, largest first.
    async fn list_popular(&self, limit: u32) -> Result<Vec<TagWithCount>, RepoError>;

    async fn find_by_title(&self, title: &str) -> Result<Option<TagRecord>, RepoError>;

    /// Tags of every post in `post_ids`, keyed by post id and ordered by
    /// title. Posts without tags may be missing from the map.
    async fn list_for_posts(
        &self,
        post_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<TagRecord>>, RepoError>;

    /// Number of posts referencing each tag in `tag_ids`. Every requested id
    /// is present in the result.
    async fn post_counts(&self, tag_ids: &[Uuid]) -> Result<HashMap<Uuid, u64>, RepoError>;
}

#[async_trait]
pub trait CommentsRepo: Send + Sync {
    /// Comments of a single post, oldest first.
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentRecord>, RepoError>;

    /// Number of comments for each post in `post_ids`. Every requested id is
    /// present in the result.
    async fn count_for_posts(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, u64>, RepoError>;
}
