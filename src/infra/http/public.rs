use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::{Path, State},
    http::{
        HeaderValue, Request, StatusCode,
        header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE},
    },
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use bytes::Bytes;
use tracing::error;
use url::Url;

use crate::{
    application::{
        chrome::ChromeService,
        error::HttpError,
        feed::{FeedError, FeedService},
    },
    infra::{db::PostgresRepositories, media::MediaStore},
    presentation::views::{
        ContactsTemplate, IndexTemplate, LayoutChrome, LayoutContext, PostTemplate,
        PostsListTemplate, render_not_found_response, render_template_response,
    },
};

use super::{
    db_health_response,
    middleware::{log_responses, set_request_context},
};

#[derive(Clone)]
pub struct HttpState {
    pub feed: Arc<FeedService>,
    pub chrome: Arc<ChromeService>,
    pub db: Arc<PostgresRepositories>,
    pub media: Arc<MediaStore>,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/post/{slug}", get(post_detail))
        .route("/tag/{tag_title}", get(tag_filter))
        .route("/contacts", get(contacts))
        .route("/media/{*path}", get(serve_media))
        .route("/_health/db", get(public_health))
        .fallback(fallback)
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

async fn index(State(state): State<HttpState>) -> Response {
    let chrome = state.chrome.load();

    match state.feed.index().await {
        Ok(content) => {
            let canonical = canonical_url(&chrome.meta.canonical, &[]);
            let view = LayoutContext::new(chrome.with_canonical(canonical), content);
            render_template_response(IndexTemplate { view }, StatusCode::OK)
        }
        Err(err) => feed_error_to_response(err, chrome),
    }
}

async fn post_detail(State(state): State<HttpState>, Path(slug): Path<String>) -> Response {
    let chrome = state.chrome.load();

    match state.feed.post_detail(&slug).await {
        Ok(content) => {
            let canonical = canonical_url(&chrome.meta.canonical, &["post", &slug]);
            let meta = chrome
                .meta
                .clone()
                .with_title(format!("{} | {}", content.post.title, chrome.brand.title))
                .with_canonical(canonical);
            let view = LayoutContext::new(chrome.with_meta(meta), content);
            render_template_response(PostTemplate { view }, StatusCode::OK)
        }
        Err(err) => feed_error_to_response(err, chrome),
    }
}

async fn tag_filter(State(state): State<HttpState>, Path(tag_title): Path<String>) -> Response {
    let chrome = state.chrome.load();

    match state.feed.tag_filter(&tag_title).await {
        Ok(content) => {
            let canonical = canonical_url(&chrome.meta.canonical, &["tag", &tag_title]);
            let meta = chrome
                .meta
                .clone()
                .with_title(format!("#{} | {}", content.tag, chrome.brand.title))
                .with_canonical(canonical);
            let view = LayoutContext::new(chrome.with_meta(meta), content);
            render_template_response(PostsListTemplate { view }, StatusCode::OK)
        }
        Err(err) => feed_error_to_response(err, chrome),
    }
}

async fn contacts(State(state): State<HttpState>) -> Response {
    let chrome = state.chrome.load();
    let canonical = canonical_url(&chrome.meta.canonical, &["contacts"]);
    let meta = chrome
        .meta
        .clone()
        .with_title(format!("Contacts | {}", chrome.brand.title))
        .with_canonical(canonical);
    let view = LayoutContext::new(chrome.with_meta(meta), state.feed.contacts());
    render_template_response(ContactsTemplate { view }, StatusCode::OK)
}

async fn serve_media(State(state): State<HttpState>, Path(path): Path<String>) -> Response {
    const SOURCE: &str = "infra::http::public::serve_media";

    match state.media.read(&path).await {
        Ok(bytes) => build_media_response(&path, bytes),
        Err(err) if err.is_not_found() => HttpError::new(
            SOURCE,
            StatusCode::NOT_FOUND,
            "Media not found",
            format!("no stored media at `{path}`"),
        )
        .into_response(),
        Err(err) => {
            error!(
                target = SOURCE,
                path = %path,
                error = %err,
                "failed to read stored media"
            );
            HttpError::from_error(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read media file",
                &err,
            )
            .into_response()
        }
    }
}

async fn fallback(State(state): State<HttpState>, request: Request<Body>) -> Response {
    let detail = format!("no route for `{}`", request.uri().path());
    render_not_found_response(state.chrome.load(), &detail)
}

fn feed_error_to_response(err: FeedError, chrome: LayoutChrome) -> Response {
    match err {
        FeedError::UnknownPost(_) | FeedError::UnknownTag(_) => {
            render_not_found_response(chrome, &err.to_string())
        }
        err => HttpError::from(err).into_response(),
    }
}

async fn public_health(State(state): State<HttpState>) -> Response {
    db_health_response(state.db.health_check().await)
}

fn build_media_response(path: &str, bytes: Bytes) -> Response {
    let length = bytes.len();
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&length.to_string()) {
        headers.insert(CONTENT_LENGTH, value);
    }
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=86400"),
    );

    response
}

/// Join percent-encoded path segments onto the public site URL.
pub(crate) fn canonical_url(base: &str, segments: &[&str]) -> String {
    let root = normalize_public_site_url(base);
    if segments.is_empty() {
        return root;
    }

    match Url::parse(&root) {
        Ok(mut url) => {
            if let Ok(mut path) = url.path_segments_mut() {
                path.pop_if_empty().extend(segments);
            }
            url.into()
        }
        Err(_) => format!("{root}{}", segments.join("/")),
    }
}

fn normalize_public_site_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    format!("{trimmed}/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_root_keeps_trailing_slash() {
        assert_eq!(
            canonical_url("https://blog.example.com", &[]),
            "https://blog.example.com/"
        );
    }

    #[test]
    fn canonical_segments_are_encoded() {
        assert_eq!(
            canonical_url("https://blog.example.com/", &["tag", "rust lang"]),
            "https://blog.example.com/tag/rust%20lang"
        );
    }

    #[test]
    fn canonical_respects_base_path() {
        assert_eq!(
            canonical_url("https://example.com/blog/", &["post", "hello"]),
            "https://example.com/blog/post/hello"
        );
    }

    #[test]
    fn media_response_guesses_content_type() {
        let response = build_media_response("covers/a.png", Bytes::from_static(b"png"));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
            Some("image/png")
        );
        assert_eq!(
            response
                .headers()
                .get(CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok()),
            Some("3")
        );
    }
}
