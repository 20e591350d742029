//! Error values returned by form parsing.
//!
//! Every failure is classified into an [`ErrorKind`], which maps onto the HTTP
//! status family the caller is expected to answer with. The message carried by a
//! [`ParseError`] is meant to be shown to the client as is.

use http::{HeaderValue, Response, StatusCode};
use std::fmt;
use thiserror::Error;

/// The classification of a [`ParseError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The `Content-Type` header is missing or names an encoding we don't decode.
    UnsupportedMediaType,
    /// The body is malformed, violates the JSON schema, or carries trailing data.
    BadRequest,
    /// The body exceeded the configured ceiling for its encoding.
    PayloadTooLarge,
    /// A decode failure that could not be attributed to the client.
    InternalFailure,
}

impl ErrorKind {
    /// The HTTP status a caller should respond with for this kind of failure.
    pub fn status_code(self) -> StatusCode {
        match self {
            ErrorKind::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorKind::InternalFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::UnsupportedMediaType => "unsupported media type",
            ErrorKind::BadRequest => "bad request",
            ErrorKind::PayloadTooLarge => "payload too large",
            ErrorKind::InternalFailure => "internal failure",
        };
        f.write_str(name)
    }
}

/// The error returned when a request body can't be turned into form content.
///
/// It's constructed where the failure happens and handed back unchanged, so the
/// caller can build a response from [`kind`](ParseError::kind) and
/// [`message`](ParseError::message) alone.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ParseError {
    kind: ErrorKind,
    message: String,
}

impl ParseError {
    pub fn new<S: ToString>(kind: ErrorKind, message: S) -> Self {
        Self { kind, message: message.to_string() }
    }

    pub fn unsupported_media_type<S: ToString>(str: S) -> Self {
        Self::new(ErrorKind::UnsupportedMediaType, str)
    }

    pub fn bad_request<S: ToString>(str: S) -> Self {
        Self::new(ErrorKind::BadRequest, str)
    }

    pub fn payload_too_large<S: ToString>(str: S) -> Self {
        Self::new(ErrorKind::PayloadTooLarge, str)
    }

    pub fn internal<S: ToString>(str: S) -> Self {
        Self::new(ErrorKind::InternalFailure, str)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status_code(&self) -> StatusCode {
        self.kind.status_code()
    }

    /// Builds a plain text response carrying the status and message of this error.
    pub fn into_response(self) -> Response<String> {
        let mut response = Response::new(self.message);
        *response.status_mut() = self.kind.status_code();
        response.headers_mut().insert(http::header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
        response
    }
}
