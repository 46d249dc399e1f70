use crate::application::error::{ErrorReport, HttpError};
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response(chrome: LayoutChrome, detail: &str) -> Response {
    let content = ErrorPageView::not_found();
    let view = LayoutContext::new(chrome, content);
    let mut response = render_template_response(ErrorTemplate { view }, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        detail,
    )
    .attach(&mut response);
    response
}

#[derive(Clone)]
pub struct NavigationView {
    pub entries: Vec<NavigationLinkView>,
}

#[derive(Clone)]
pub struct NavigationLinkView {
    pub label: String,
    pub href: String,
}

#[derive(Clone)]
pub struct FooterView {
    pub copy: String,
}

#[derive(Clone)]
pub struct BrandView {
    pub title: String,
    pub href: String,
}

#[derive(Clone)]
pub struct PageMetaView {
    pub title: String,
    pub description: String,
    pub canonical: String,
}

impl PageMetaView {
    pub fn with_canonical(self, canonical: String) -> Self {
        Self { canonical, ..self }
    }

    pub fn with_title(self, title: String) -> Self {
        Self { title, ..self }
    }
}

#[derive(Clone)]
pub struct LayoutChrome {
    pub brand: BrandView,
    pub navigation: NavigationView,
    pub footer: FooterView,
    pub meta: PageMetaView,
}

impl LayoutChrome {
    pub fn with_canonical(self, canonical: String) -> Self {
        Self {
            meta: self.meta.with_canonical(canonical),
            ..self
        }
    }

    pub fn with_meta(self, meta: PageMetaView) -> Self {
        Self { meta, ..self }
    }
}

#[derive(Clone)]
pub struct LayoutContext<T> {
    pub brand: BrandView,
    pub navigation: NavigationView,
    pub footer: FooterView,
    pub meta: PageMetaView,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(chrome: LayoutChrome, content: T) -> Self {
        Self {
            brand: chrome.brand,
            navigation: chrome.navigation,
            footer: chrome.footer,
            meta: chrome.meta,
            content,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSummary {
    pub title: String,
    pub posts_with_tag: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostCard {
    pub slug: String,
    pub title: String,
    pub teaser_text: String,
    pub author: String,
    pub comments_amount: u64,
    pub image_url: Option<String>,
    pub published_at: String,
    pub iso_date: String,
    pub tags: Vec<TagSummary>,
    /// Title of the first tag, absent when the post carries none.
    pub first_tag_title: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentView {
    pub text: String,
    pub published_at: String,
    pub iso_date: String,
    pub author: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostDetailView {
    pub slug: String,
    pub title: String,
    pub text: String,
    pub author: String,
    pub comments: Vec<CommentView>,
    pub likes_amount: u64,
    pub image_url: Option<String>,
    pub published_at: String,
    pub iso_date: String,
    pub tags: Vec<TagSummary>,
}

#[derive(Debug, Clone)]
pub struct IndexContext {
    pub most_popular_posts: Vec<PostCard>,
    pub page_posts: Vec<PostCard>,
    pub popular_tags: Vec<TagSummary>,
    pub posts_ld_json: Option<String>,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub view: LayoutContext<IndexContext>,
}

#[derive(Debug, Clone)]
pub struct PostDetailContext {
    pub post: PostDetailView,
    pub popular_tags: Vec<TagSummary>,
    pub most_popular_posts: Vec<PostCard>,
}

#[derive(Template)]
#[template(path = "post_details.html")]
pub struct PostTemplate {
    pub view: LayoutContext<PostDetailContext>,
}

#[derive(Debug, Clone)]
pub struct TagFilterContext {
    pub tag: String,
    pub popular_tags: Vec<TagSummary>,
    pub posts: Vec<PostCard>,
    pub most_popular_posts: Vec<PostCard>,
}

#[derive(Template)]
#[template(path = "posts_list.html")]
pub struct PostsListTemplate {
    pub view: LayoutContext<TagFilterContext>,
}

#[derive(Debug, Clone, Default)]
pub struct ContactsContext;

#[derive(Template)]
#[template(path = "contacts.html")]
pub struct ContactsTemplate {
    pub view: LayoutContext<ContactsContext>,
}

pub struct ErrorPageView {
    pub title: String,
    pub message: String,
    pub primary_action: Option<ErrorAction>,
}

impl ErrorPageView {
    pub fn not_found() -> Self {
        Self {
            title: "Page Not Found".to_string(),
            message: "The page you requested does not exist. Try returning to the homepage to keep reading.".to_string(),
            primary_action: Some(ErrorAction::home()),
        }
    }
}

pub struct ErrorAction {
    pub href: String,
    pub label: String,
}

impl ErrorAction {
    pub fn home() -> Self {
        Self {
            href: "/".to_string(),
            label: "Back to home".to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub view: LayoutContext<ErrorPageView>,
}
