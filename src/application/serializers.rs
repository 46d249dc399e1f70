//! Pure mapping from records plus prefetched aggregates to view records.
//!
//! Nothing here touches a repository: every count a view shows arrives as
//! an argument or through a [`Counts`] mapping built for the same batch.

use chrono_tz::Tz;
use time::OffsetDateTime;

use crate::application::aggregates::{Counts, MissingAggregate};
use crate::domain::entities::{CommentRecord, PostRecord, TagRecord};
use crate::domain::posts::{self, TEASER_LENGTH};
use crate::presentation::views::{CommentView, PostCard, PostDetailView, TagSummary};
use crate::util::timezone;

/// Builds public URLs for stored media files.
#[derive(Debug, Clone)]
pub struct MediaLocator {
    prefix: String,
}

impl MediaLocator {
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let trimmed = prefix.trim_end_matches('/');
        Self {
            prefix: format!("{trimmed}/"),
        }
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.prefix, path.trim_start_matches('/'))
    }
}

/// Display settings shared by every serializer call of a request.
#[derive(Debug, Clone)]
pub struct SerializeContext {
    pub timezone: Tz,
    pub media: MediaLocator,
}

impl SerializeContext {
    fn image_url(&self, post: &PostRecord) -> Option<String> {
        post.image
            .as_deref()
            .filter(|path| !path.trim().is_empty())
            .map(|path| self.media.url_for(path))
    }

    fn dates(&self, at: OffsetDateTime) -> (String, String) {
        let localized = timezone::localized_datetime(at, self.timezone);
        let date = timezone::localized_date(at, self.timezone);
        (posts::format_human_date(date), localized.to_rfc3339())
    }
}

pub fn serialize_tag(tag: &TagRecord, posts_with_tag: u64) -> TagSummary {
    TagSummary {
        title: tag.title.clone(),
        posts_with_tag,
    }
}

pub fn serialize_tags(
    tags: &[TagRecord],
    tag_counts: &Counts,
) -> Result<Vec<TagSummary>, MissingAggregate> {
    tags.iter()
        .map(|tag| Ok(serialize_tag(tag, tag_counts.get(tag.id)?)))
        .collect()
}

pub fn serialize_post(
    ctx: &SerializeContext,
    post: &PostRecord,
    tags: &[TagRecord],
    comments_amount: u64,
    tag_counts: &Counts,
) -> Result<PostCard, MissingAggregate> {
    let (published_at, iso_date) = ctx.dates(post.published_at);

    Ok(PostCard {
        slug: post.slug.clone(),
        title: post.title.clone(),
        teaser_text: posts::teaser(&post.text, TEASER_LENGTH).to_string(),
        author: post.author.username.clone(),
        comments_amount,
        image_url: ctx.image_url(post),
        published_at,
        iso_date,
        tags: serialize_tags(tags, tag_counts)?,
        first_tag_title: tags.first().map(|tag| tag.title.clone()),
    })
}

pub fn serialize_comment(ctx: &SerializeContext, comment: &CommentRecord) -> CommentView {
    let (published_at, iso_date) = ctx.dates(comment.published_at);

    CommentView {
        text: comment.text.clone(),
        published_at,
        iso_date,
        author: comment.author.username.clone(),
    }
}

pub fn serialize_post_detail(
    ctx: &SerializeContext,
    post: &PostRecord,
    likes_amount: u64,
    comments: &[CommentRecord],
    tags: &[TagRecord],
    tag_counts: &Counts,
) -> Result<PostDetailView, MissingAggregate> {
    let (published_at, iso_date) = ctx.dates(post.published_at);

    Ok(PostDetailView {
        slug: post.slug.clone(),
        title: post.title.clone(),
        text: post.text.clone(),
        author: post.author.username.clone(),
        comments: comments
            .iter()
            .map(|comment| serialize_comment(ctx, comment))
            .collect(),
        likes_amount,
        image_url: ctx.image_url(post),
        published_at,
        iso_date,
        tags: serialize_tags(tags, tag_counts)?,
    })
}
