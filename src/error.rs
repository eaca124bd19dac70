//! Unified error type.

use thiserror::Error;
use tracing::error;

use crate::response::{IntoResponse, Message, Response};
use crate::status::Status;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while serving a request or starting up.
///
/// The first four kinds are the caller's fault and render their message to
/// the client. The rest are infrastructure failures: they are logged and the
/// client only sees `500 Internal server error`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Validation(String),

    // -------------------------------------------------------------------------
    // Infrastructure
    // -------------------------------------------------------------------------
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("serialization: {0}")]
    Json(#[from] serde_json::Error),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn unauthorized(why: impl Into<String>) -> Self {
        Self::Unauthorized(why.into())
    }

    /// HTTP status the error renders with.
    ///
    /// A duplicate user answers `400` rather than `409`: existing clients of
    /// `/users/register` only know `400`.
    pub fn status(&self) -> Status {
        match self {
            Self::NotFound(_) => Status::NotFound,
            Self::Conflict(_) | Self::Validation(_) => Status::BadRequest,
            Self::Unauthorized(_) => Status::Unauthorized,
            Self::Store(_)
            | Self::Io(_)
            | Self::Hash(_)
            | Self::Json(_)
            | Self::Task(_)
            | Self::Config(_) => {
                Status::InternalServerError
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!(error = %self, "request failed");
            Message::new("Internal server error")
        } else {
            Message::new(self.to_string())
        };
        Response::builder().status(status).serialize(&message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_render_their_message() {
        let res = Error::not_found("Book not found").into_response();
        assert_eq!(res.status_code(), 404);
        assert_eq!(res.body(), br#"{"message":"Book not found"}"#);
    }

    #[test]
    fn duplicate_user_is_bad_request() {
        let res = Error::Conflict("User already exists".into()).into_response();
        assert_eq!(res.status_code(), 400);
    }

    #[test]
    fn store_errors_hide_details() {
        let res = Error::Store(rusqlite::Error::InvalidQuery).into_response();
        assert_eq!(res.status_code(), 500);
        assert_eq!(res.body(), br#"{"message":"Internal server error"}"#);
    }
}
