//! `application/json` bodies.
//!
//! The body must hold exactly one JSON object whose values are strings or arrays of
//! strings, the same shape the browser encodings produce natively. The document is
//! first decoded into a [`serde_json::Value`] and then narrowed field by field.
//!
//! Unlike the browser encodings, empty strings and empty arrays are rejected instead of
//! being dropped: a JSON client has no reason to send a placeholder for a missing value.

use crate::body::{BoxError, LimitedBody};
use crate::{FormValues, ParseError};
use bytes::Bytes;
use http_body::Body;
use http_body_util::BodyExt;
use serde_json::error::Category;
use serde_json::{Map, Value};
use tracing::warn;

const SINGLE_OBJECT: &str = "body must contain a single JSON object";

pub(crate) async fn decode_json<B>(body: LimitedBody<'_, B>) -> Result<FormValues, ParseError>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.is_limit_exceeded() => return Err(ParseError::payload_too_large("body too large")),
        Err(e) => {
            warn!(cause = %e, "failed to read json body");
            return Err(ParseError::internal("JSON parsing error"));
        }
    };

    parse_json(&bytes)
}

pub(crate) fn parse_json(body: &[u8]) -> Result<FormValues, ParseError> {
    let mut documents = serde_json::Deserializer::from_slice(body).into_iter::<Value>();

    let value = match documents.next() {
        Some(Ok(value)) => value,
        Some(Err(e)) => return Err(malformed(&e)),
        None => return Err(ParseError::bad_request("body must not be empty")),
    };

    // anything after the first document, even another valid one, is rejected
    if documents.next().is_some() {
        return Err(ParseError::bad_request(SINGLE_OBJECT));
    }

    match value {
        Value::Object(object) => narrow(object),
        _ => Err(ParseError::bad_request(SINGLE_OBJECT)),
    }
}

fn malformed(error: &serde_json::Error) -> ParseError {
    match error.classify() {
        Category::Eof => ParseError::bad_request("malformed JSON"),
        Category::Syntax | Category::Data => {
            ParseError::bad_request(format!("malformed JSON (at line {} column {})", error.line(), error.column()))
        }
        Category::Io => ParseError::internal("JSON parsing error"),
    }
}

fn narrow(object: Map<String, Value>) -> Result<FormValues, ParseError> {
    if object.is_empty() {
        return Err(ParseError::bad_request("JSON object contains no fields"));
    }

    let mut values = FormValues::new();
    for (field, value) in object {
        let narrowed = match value {
            Value::String(string) if string.is_empty() => {
                return Err(invalid_value(&field, "cannot use an empty string"));
            }
            Value::String(string) => vec![string],
            Value::Array(array) if array.is_empty() => {
                return Err(invalid_value(&field, "cannot use an empty array"));
            }
            Value::Array(array) => narrow_array(&field, array)?,
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::Object(_) => {
                return Err(invalid_value(&field, "values must be string or array of string types"));
            }
        };
        values.insert(field, narrowed);
    }

    Ok(values)
}

fn narrow_array(field: &str, array: Vec<Value>) -> Result<Vec<String>, ParseError> {
    array
        .into_iter()
        .map(|element| match element {
            Value::String(string) => Ok(string),
            _ => Err(ParseError::bad_request(format!(
                r#"JSON object contains invalid array for field "{field}", array values must be exclusively strings"#
            ))),
        })
        .collect()
}

fn invalid_value(field: &str, reason: &str) -> ParseError {
    ParseError::bad_request(format!(r#"JSON object contains invalid value for field "{field}", {reason}"#))
}
