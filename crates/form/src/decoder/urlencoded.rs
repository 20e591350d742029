//! `application/x-www-form-urlencoded` bodies.
//!
//! Only the body is read. Query parameters on the request target never end up in the
//! result.

use crate::body::{BoxError, LimitedBody};
use crate::{FormValues, ParseError};
use bytes::Bytes;
use http_body::Body;
use http_body_util::BodyExt;
use percent_encoding::percent_decode;
use tracing::{debug, trace};

const INVALID_FORM: &str = "invalid URL encoded form";

pub(crate) async fn decode_urlencoded<B>(body: LimitedBody<'_, B>) -> Result<FormValues, ParseError>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.is_limit_exceeded() => return Err(ParseError::payload_too_large("body too large")),
        Err(e) => {
            debug!(cause = %e, "failed to read url encoded body");
            return Err(ParseError::bad_request(INVALID_FORM));
        }
    };

    parse_urlencoded(&bytes)
}

pub(crate) fn parse_urlencoded(body: &[u8]) -> Result<FormValues, ParseError> {
    validate(body)?;

    let pairs = serde_urlencoded::from_bytes::<Vec<(String, String)>>(body).map_err(|e| {
        debug!(cause = %e, "failed to decode url encoded body");
        ParseError::bad_request(INVALID_FORM)
    })?;

    let mut values = FormValues::new();
    for (name, value) in pairs {
        if name.is_empty() {
            trace!("skip url encoded pair without a name");
            continue;
        }
        values.append(name, value);
    }

    values.reduce_unanswered();
    Ok(values)
}

/// Rejects what the lenient pair splitter would silently accept: `;` separators, `%`
/// not followed by two hex digits, and content that doesn't decode to UTF-8.
fn validate(body: &[u8]) -> Result<(), ParseError> {
    let mut i = 0;
    while i < body.len() {
        match body[i] {
            b';' => return Err(ParseError::bad_request(INVALID_FORM)),
            b'%' => {
                let escape = body.get(i + 1..i + 3).ok_or_else(|| ParseError::bad_request(INVALID_FORM))?;
                if !escape.iter().all(u8::is_ascii_hexdigit) {
                    return Err(ParseError::bad_request(INVALID_FORM));
                }
                i += 3;
            }
            _ => i += 1,
        }
    }

    // `&`, `=` and `+` are ascii, so the body decodes to utf8 exactly when every name
    // and value does
    percent_decode(body).decode_utf8().map_err(|e| {
        debug!(cause = %e, "url encoded body is not utf8");
        ParseError::bad_request(INVALID_FORM)
    })?;
    Ok(())
}
