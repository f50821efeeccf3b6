//! API error responses.
//!
//! Every error is rendered as `{ code, message, status }` with `status`
//! mirrored as the HTTP status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::content::StoreError;
use crate::resolver::ResolveError;

/// Errors returned by the API handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The URL does not resolve to any content.
    #[error("Invalid url to post")]
    NoPost,

    /// No menu with the given id, name or slug.
    #[error("Menu with that id|name|slug doesn't exist")]
    NoMenu,

    /// No handler for this path and method.
    #[error("No route was found matching the URL and request method.")]
    NoRoute,

    /// A request parameter is out of range or malformed.
    #[error("Invalid parameter(s): {0}")]
    InvalidParam(String),

    /// The content store failed; never reported as a 404.
    #[error("The content store failed to answer the request.")]
    Upstream(#[from] StoreError),

    /// The resolver could not run, e.g. a bad site base slipped past
    /// validation. Malformed client URLs are `NoPost`, not this.
    #[error("The URL resolver is misconfigured.")]
    Resolver(#[source] ResolveError),
}

/// Wire shape of an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub status: u16,
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NoPost => "no_post",
            ApiError::NoMenu => "no_menu",
            ApiError::NoRoute => "rest_no_route",
            ApiError::InvalidParam(_) => "rest_invalid_param",
            ApiError::Upstream(_) => "upstream_failure",
            ApiError::Resolver(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NoPost | ApiError::NoMenu | ApiError::NoRoute => StatusCode::NOT_FOUND,
            ApiError::InvalidParam(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) | ApiError::Resolver(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code().to_string(),
            message: self.to_string(),
            status: self.status().as_u16(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Upstream(source) => tracing::error!(error = %source, "Content store failure"),
            ApiError::Resolver(source) => tracing::error!(error = %source, "Resolver failure"),
            _ => {}
        }
        (self.status(), Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_bodies() {
        let body = ApiError::NoPost.body();
        assert_eq!(
            body,
            ErrorBody {
                code: "no_post".into(),
                message: "Invalid url to post".into(),
                status: 404,
            }
        );
        assert_eq!(ApiError::NoMenu.body().message, "Menu with that id|name|slug doesn't exist");
    }

    #[test]
    fn test_upstream_is_server_error() {
        let err = ApiError::from(StoreError::Unavailable("down".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "upstream_failure");
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_resolver_failure_is_not_a_store_error() {
        let err = ApiError::Resolver(ResolveError::InvalidBase("example.com".into()));
        assert_eq!(err.code(), "internal_error");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!matches!(err, ApiError::Upstream(_)));
        let body = err.body();
        assert_eq!(body.status, 500);
        assert!(!body.message.contains("content store"));
    }
}
