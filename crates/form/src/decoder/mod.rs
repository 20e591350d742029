//! One decoder per supported body encoding.
//!
//! Each decoder reads a [`LimitedBody`](crate::body::LimitedBody) to the end and turns
//! it into [`FormValues`](crate::FormValues), plus [`FormFiles`](crate::FormFiles) for
//! multipart bodies.

mod json;
mod multipart;
mod urlencoded;

pub(crate) use json::decode_json;
pub(crate) use multipart::decode_multipart;
pub(crate) use urlencoded::decode_urlencoded;
