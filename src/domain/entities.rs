//! Domain entities mirrored from persistent storage.
//!
//! Records carry their own columns plus, where a read always needs it, the
//! referenced author. Collections (tags, comments, likes) are never embedded:
//! they are fetched through the repository traits in bulk and passed around
//! explicitly.

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorRecord {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRecord {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub text: String,
    /// Path of the uploaded image relative to the media root.
    pub image: Option<String>,
    pub author: AuthorRecord,
    pub published_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagRecord {
    pub id: Uuid,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentRecord {
    pub id: Uuid,
    pub post_id: Uuid,
    pub text: String,
    pub author: AuthorRecord,
    pub published_at: OffsetDateTime,
}

/// A post paired with its like count, as produced by the popularity ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedPost {
    pub post: PostRecord,
    pub likes: u64,
}

/// A tag paired with the number of posts referencing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagWithCount {
    pub tag: TagRecord,
    pub posts: u64,
}
