//! Error types for the band API client.
//!
//! # Design
//! `NotFound` gets a dedicated variant because callers frequently distinguish
//! "the band does not exist" from "the server refused the request." Both carry
//! the human-readable message the server put in its error envelope (or a
//! synthesized `HTTP <status>`), and that message is exactly what `Display`
//! prints, so a view-model can record `err.to_string()` as-is.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never completed (connection refused, DNS, TLS, ...).
    #[error("transport failure: {0}")]
    Transport(String),

    /// The server returned 404.
    #[error("{message}")]
    NotFound { message: String },

    /// The server returned a non-2xx status other than 404.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The response body was not well-formed XML.
    #[error("XML parse error: {0}")]
    Parse(String),

    /// User input was rejected before any request was issued.
    #[error("{0}")]
    Validation(String),
}

impl ApiError {
    /// HTTP status of the failed response, if the failure came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound { .. } => Some(404),
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<quick_xml::Error> for ApiError {
    fn from(err: quick_xml::Error) -> Self {
        ApiError::Parse(err.to_string())
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_failures_display_their_message() {
        let err = ApiError::Http {
            status: 400,
            message: "Band with band-id 3 has one participant".to_string(),
        };
        assert_eq!(err.to_string(), "Band with band-id 3 has one participant");
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn not_found_reports_404() {
        let err = ApiError::NotFound {
            message: "HTTP 404".to_string(),
        };
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), "HTTP 404");
    }

    #[test]
    fn local_failures_have_no_status() {
        assert_eq!(ApiError::Parse("eof".to_string()).status(), None);
        assert_eq!(ApiError::Validation("bad id".to_string()).status(), None);
        assert_eq!(ApiError::Transport("refused".to_string()).status(), None);
    }
}
