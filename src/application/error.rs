use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{application::feed::FeedError, infra::error::InfraError};

/// Diagnostic chain attached to a response so the logging middleware can
/// report what went wrong without leaking it to the client.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    public_message: &'static str,
    report: ErrorReport,
}

impl HttpError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        let report = ErrorReport::from_message(source, status, detail);
        Self {
            status,
            public_message,
            report,
        }
    }

    pub fn from_error(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        error: &dyn StdError,
    ) -> Self {
        let report = ErrorReport::from_error(source, status, error);
        Self {
            status,
            public_message,
            report,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.public_message).into_response();
        self.report.attach(&mut response);
        response
    }
}

impl From<FeedError> for HttpError {
    fn from(error: FeedError) -> Self {
        const SOURCE: &str = "application::error::feed_error_to_http_error";

        match &error {
            FeedError::UnknownPost(_) => {
                HttpError::from_error(SOURCE, StatusCode::NOT_FOUND, "Post not found", &error)
            }
            FeedError::UnknownTag(_) => {
                HttpError::from_error(SOURCE, StatusCode::NOT_FOUND, "Unknown tag", &error)
            }
            FeedError::MissingAggregate(_) | FeedError::Repo(_) => HttpError::from_error(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                &error,
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::aggregates::{AggregateKind, MissingAggregate};
    use crate::application::repos::RepoError;
    use uuid::Uuid;

    #[test]
    fn unknown_post_maps_to_not_found() {
        let err = HttpError::from(FeedError::UnknownPost("nope".into()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn missing_aggregate_is_an_internal_error() {
        let err = HttpError::from(FeedError::MissingAggregate(MissingAggregate {
            kind: AggregateKind::CommentsPerPost,
            id: Uuid::nil(),
        }));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = err.into_response();
        let report = response
            .extensions()
            .get::<ErrorReport>()
            .expect("report attached");
        assert!(report.messages[0].contains("comments-per-post"));
    }

    #[test]
    fn report_collects_source_chain() {
        let err = FeedError::Repo(RepoError::Timeout);
        let report = ErrorReport::from_error("test", StatusCode::SERVICE_UNAVAILABLE, &err);
        assert_eq!(report.messages, vec!["database timeout".to_string()]);
    }
}
