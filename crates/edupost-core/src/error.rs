//! Errors surfaced by the post client.

use miette::Diagnostic;
use serde::Serialize;

/// Failure of a REST call, as shown to the UI.
#[derive(thiserror::Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum ApiError {
    /// The backend answered with a non-success status.
    #[error("{message}")]
    #[diagnostic(code(edupost::api::status))]
    Status { status: u16, message: String },

    /// Neither the parent nor the draft supplied an author email.
    #[error("User authentication required")]
    #[diagnostic(code(edupost::api::unauthenticated))]
    Unauthenticated,

    /// `update_post` was called without a slug.
    #[error("Slug is required for updating a post")]
    #[diagnostic(code(edupost::api::missing_slug))]
    MissingSlug,

    /// The request never got a response.
    #[error(transparent)]
    #[diagnostic(code(edupost::api::transport))]
    Transport(#[from] reqwest::Error),

    /// The response body wasn't the JSON we expected.
    #[error("Invalid response format from server: {0}")]
    #[diagnostic(code(edupost::api::decode))]
    Decode(#[source] serde_json::Error),
}

/// `{ message, status }` as handed to the UI layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub status: u16,
}

impl ApiError {
    /// HTTP-style status for the error. Failures without a response map to 500.
    pub fn status(&self) -> u16 {
        match self {
            ApiError::Status { status, .. } => *status,
            ApiError::Unauthenticated => 401,
            ApiError::MissingSlug => 400,
            ApiError::Transport(e) => e.status().map_or(500, |s| s.as_u16()),
            ApiError::Decode(_) => 500,
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            message: self.to_string(),
            status: self.status(),
        }
    }
}
