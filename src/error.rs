//! Crate-wide error taxonomy

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the content pipeline and handlers.
#[derive(Debug, Error)]
pub enum SiteError {
    /// The requested markdown file does not exist. Maps to HTTP 404.
    #[error("page not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("syntax highlighting failed")]
    Highlight(#[from] syntect::Error),

    #[error("template rendering failed")]
    Template(#[from] tera::Error),

    #[error("content listing failed")]
    Walk(#[from] walkdir::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SiteError {
    /// Wrap an I/O error for `path`, keeping not-found distinguishable.
    pub fn from_io(path: PathBuf, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            SiteError::NotFound(path)
        } else {
            SiteError::Io { path, source }
        }
    }
}

impl IntoResponse for SiteError {
    fn into_response(self) -> Response {
        match self {
            SiteError::NotFound(ref path) => {
                tracing::warn!(path = %path.display(), "markdown file not found");
                (StatusCode::NOT_FOUND, "404 page not found").into_response()
            }
            err => {
                tracing::error!(err = %err, source = ?std::error::Error::source(&err), "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "error: something went wrong",
                )
                    .into_response()
            }
        }
    }
}
