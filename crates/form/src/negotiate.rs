//! Content negotiation: picks the decoder for a request from its `Content-Type` header.
//!
//! JSON and URL encoded bodies are matched by exact header value. Multipart bodies are
//! matched by prefix, because the header carries the `boundary` parameter after the
//! media type.

use crate::ParseError;
use http::HeaderMap;
use http::header::CONTENT_TYPE;
use std::fmt;

/// The body encodings a form can be submitted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormEncoding {
    Json,
    UrlEncoded,
    Multipart,
}

impl FormEncoding {
    /// Whether bodies of this encoding may carry uploaded files.
    ///
    /// This decides which size ceiling guards the body.
    #[inline]
    pub fn carries_files(self) -> bool {
        matches!(self, FormEncoding::Multipart)
    }

    pub fn media_type(self) -> &'static str {
        match self {
            FormEncoding::Json => "application/json",
            FormEncoding::UrlEncoded => "application/x-www-form-urlencoded",
            FormEncoding::Multipart => "multipart/form-data",
        }
    }
}

impl fmt::Display for FormEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.media_type())
    }
}

/// Returns the raw `Content-Type` value, or an empty string when the header is absent.
///
/// Only the first header is consulted when the client sent several.
pub fn content_type(headers: &HeaderMap) -> Result<&str, ParseError> {
    match headers.get(CONTENT_TYPE) {
        None => Ok(""),
        Some(value) => value
            .to_str()
            .map_err(|e| ParseError::unsupported_media_type(format!("Content-Type header is unsupported: {e}"))),
    }
}

/// Selects the encoding for a raw `Content-Type` header value.
pub fn negotiate(content_type: &str) -> Result<FormEncoding, ParseError> {
    if content_type.is_empty() {
        return Err(ParseError::unsupported_media_type("Content-Type header is required"));
    }

    if content_type == FormEncoding::Json.media_type() {
        Ok(FormEncoding::Json)
    } else if content_type == FormEncoding::UrlEncoded.media_type() {
        Ok(FormEncoding::UrlEncoded)
    } else if content_type.starts_with(FormEncoding::Multipart.media_type()) {
        Ok(FormEncoding::Multipart)
    } else {
        Err(ParseError::unsupported_media_type(format!("Content-Type header {content_type} is unsupported")))
    }
}
