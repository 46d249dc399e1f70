use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use metrics::histogram;
use serde_json::json;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::application::aggregates::{AggregateKind, Counts, MissingAggregate};
use crate::application::repos::{CommentsRepo, PostsRepo, RepoError, TagsRepo};
use crate::application::serializers::{
    SerializeContext, serialize_post, serialize_post_detail, serialize_tag,
};
use crate::domain::entities::{PostRecord, TagRecord};
use crate::presentation::views::{
    ContactsContext, IndexContext, PostCard, PostDetailContext, TagFilterContext, TagSummary,
};

pub const POPULAR_POSTS_LIMIT: u32 = 5;
pub const FRESH_POSTS_LIMIT: u32 = 5;
pub const POPULAR_TAGS_LIMIT: u32 = 5;
pub const TAG_POSTS_LIMIT: u32 = 20;

const METRIC_PREFETCH_BATCH_POSTS: &str = "postroll_prefetch_batch_posts";

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("unknown post `{0}`")]
    UnknownPost(String),
    #[error("unknown tag `{0}`")]
    UnknownTag(String),
    #[error(transparent)]
    MissingAggregate(#[from] MissingAggregate),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct FeedSettings {
    pub serialize: SerializeContext,
    pub public_site_url: String,
    pub site_title: String,
}

#[derive(Clone)]
pub struct FeedService {
    posts: Arc<dyn PostsRepo>,
    tags: Arc<dyn TagsRepo>,
    comments: Arc<dyn CommentsRepo>,
    settings: FeedSettings,
}

/// Everything a batch of post cards needs, loaded in a fixed number of
/// queries regardless of the batch size.
struct Prefetched {
    tags_by_post: HashMap<Uuid, Vec<TagRecord>>,
    comment_counts: Counts,
    tag_counts: Counts,
}

impl Prefetched {
    fn tags_of(&self, post_id: Uuid) -> &[TagRecord] {
        self.tags_by_post
            .get(&post_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl FeedService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        tags: Arc<dyn TagsRepo>,
        comments: Arc<dyn CommentsRepo>,
        settings: FeedSettings,
    ) -> Self {
        Self {
            posts,
            tags,
            comments,
            settings,
        }
    }

    pub async fn index(&self) -> Result<IndexContext, FeedError> {
        let popular = self.posts.list_popular(POPULAR_POSTS_LIMIT).await?;
        let fresh = self.posts.list_recent(FRESH_POSTS_LIMIT).await?;
        let popular_tags = self.popular_tags().await?;

        let batch: Vec<&PostRecord> = popular
            .iter()
            .map(|ranked| &ranked.post)
            .chain(fresh.iter())
            .collect();
        let prefetched = self.prefetch(&batch).await?;

        let most_popular_posts = self.cards(&prefetched, popular.iter().map(|r| &r.post))?;
        let page_posts = self.cards(&prefetched, fresh.iter())?;
        let posts_ld_json = build_posts_ld_json(
            &page_posts,
            &self.settings.public_site_url,
            &self.settings.site_title,
        );

        Ok(IndexContext {
            most_popular_posts,
            page_posts,
            popular_tags,
            posts_ld_json,
        })
    }

    pub async fn post_detail(&self, slug: &str) -> Result<PostDetailContext, FeedError> {
        let post = self
            .posts
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| FeedError::UnknownPost(slug.to_string()))?;

        let likes = self.posts.count_likes(post.id).await?;
        let comments = self.comments.list_for_post(post.id).await?;
        let popular = self.posts.list_popular(POPULAR_POSTS_LIMIT).await?;
        let popular_tags = self.popular_tags().await?;

        let batch: Vec<&PostRecord> = std::iter::once(&post)
            .chain(popular.iter().map(|ranked| &ranked.post))
            .collect();
        let prefetched = self.prefetch(&batch).await?;

        let detail = serialize_post_detail(
            &self.settings.serialize,
            &post,
            likes,
            &comments,
            prefetched.tags_of(post.id),
            &prefetched.tag_counts,
        )?;

        Ok(PostDetailContext {
            post: detail,
            popular_tags,
            most_popular_posts: self.cards(&prefetched, popular.iter().map(|r| &r.post))?,
        })
    }

    pub async fn tag_filter(&self, tag_title: &str) -> Result<TagFilterContext, FeedError> {
        let tag = self
            .tags
            .find_by_title(tag_title)
            .await?
            .ok_or_else(|| FeedError::UnknownTag(tag_title.to_string()))?;

        let related = self.posts.list_for_tag(tag.id, TAG_POSTS_LIMIT).await?;
        let popular = self.posts.list_popular(POPULAR_POSTS_LIMIT).await?;
        let popular_tags = self.popular_tags().await?;

        let batch: Vec<&PostRecord> = related
            .iter()
            .chain(popular.iter().map(|ranked| &ranked.post))
            .collect();
        let prefetched = self.prefetch(&batch).await?;

        Ok(TagFilterContext {
            tag: tag.title,
            popular_tags,
            posts: self.cards(&prefetched, related.iter())?,
            most_popular_posts: self.cards(&prefetched, popular.iter().map(|r| &r.post))?,
        })
    }

    pub fn contacts(&self) -> ContactsContext {
        ContactsContext
    }

    async fn popular_tags(&self) -> Result<Vec<TagSummary>, FeedError> {
        let tags = self.tags.list_popular(POPULAR_TAGS_LIMIT).await?;
        Ok(tags
            .iter()
            .map(|entry| serialize_tag(&entry.tag, entry.posts))
            .collect())
    }

    async fn prefetch(&self, posts: &[&PostRecord]) -> Result<Prefetched, FeedError> {
        let post_ids = unique_ids(posts.iter().map(|post| post.id));

        let tags_by_post = self.tags.list_for_posts(&post_ids).await?;
        let comment_counts = self.comments.count_for_posts(&post_ids).await?;

        let tag_ids = unique_ids(tags_by_post.values().flatten().map(|tag| tag.id));
        let tag_counts = if tag_ids.is_empty() {
            HashMap::new()
        } else {
            self.tags.post_counts(&tag_ids).await?
        };

        histogram!(METRIC_PREFETCH_BATCH_POSTS).record(post_ids.len() as f64);
        debug!(
            target = "postroll::feed::prefetch",
            posts = post_ids.len(),
            tags = tag_ids.len(),
            "prefetched aggregates"
        );

        Ok(Prefetched {
            tags_by_post,
            comment_counts: Counts::new(AggregateKind::CommentsPerPost, comment_counts),
            tag_counts: Counts::new(AggregateKind::PostsPerTag, tag_counts),
        })
    }

    fn cards<'a>(
        &self,
        prefetched: &Prefetched,
        posts: impl Iterator<Item = &'a PostRecord>,
    ) -> Result<Vec<PostCard>, FeedError> {
        posts
            .map(|post| {
                let comments_amount = prefetched.comment_counts.get(post.id)?;
                serialize_post(
                    &self.settings.serialize,
                    post,
                    prefetched.tags_of(post.id),
                    comments_amount,
                    &prefetched.tag_counts,
                )
                .map_err(FeedError::from)
            })
            .collect()
    }
}

/// Ids in first-seen order, duplicates removed.
fn unique_ids(ids: impl Iterator<Item = Uuid>) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.filter(|id| seen.insert(*id)).collect()
}

fn build_posts_ld_json(
    cards: &[PostCard],
    public_site_url: &str,
    blog_name: &str,
) -> Option<String> {
    if cards.is_empty() {
        return None;
    }

    let site_url = normalize_public_site_url(public_site_url);

    let blog_posts = cards
        .iter()
        .map(|card| {
            json!({
                "@type": "BlogPosting",
                "headline": card.title,
                "description": card.teaser_text,
                "author": card.author,
                "datePublished": card.iso_date,
                "url": format!("{site_url}post/{}", card.slug),
            })
        })
        .collect::<Vec<_>>();

    serde_json::to_string(&json!({
        "@context": "https://schema.org",
        "@type": "Blog",
        "name": blog_name,
        "url": site_url,
        "blogPost": blog_posts,
    }))
    .ok()
    .map(|json| json.replace("</", "<\\/"))
}

fn normalize_public_site_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    format!("{trimmed}/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_ids_keep_first_seen_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();

        let ids = unique_ids([b, a, b, c, a, c].into_iter());

        assert_eq!(ids, vec![b, a, c]);
    }

    #[test]
    fn unique_ids_of_nothing_is_empty() {
        assert!(unique_ids(std::iter::empty()).is_empty());
    }
}
