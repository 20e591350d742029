//! Normalizes form submissions into one representation.
//!
//! A request body sent as `application/x-www-form-urlencoded`, `multipart/form-data` or
//! `application/json` is decoded into [`FormValues`] (field name to one or more string
//! values) and [`FormFiles`] (field name to one or more uploaded files), so business
//! code validates all three encodings the same way.
//!
//! # Features
//!
//! - Decoder picked from the `Content-Type` header
//! - Body size ceilings enforced while reading, not trusted from `Content-Length`
//! - Multipart file uploads spill to temporary files past a memory budget
//! - Strict JSON shape: one object of strings and arrays of strings
//! - Unanswered browser fields dropped, so presence is a single key lookup
//! - Errors carry a kind that maps to an HTTP status and a client-facing message
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use http::Request;
//! use http_body_util::Full;
//! use micro_form::{parse_form, ErrorKind};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let request = Request::post("/contact")
//!     .header("content-type", "application/x-www-form-urlencoded")
//!     .body(Full::new(Bytes::from_static(b"name=charlie&topic=billing&topic=support&notes=")))
//!     .unwrap();
//!
//! let content = parse_form(request, &()).await.unwrap();
//! assert_eq!(content.values.first("name"), Some("charlie"));
//! assert_eq!(content.values.get("topic").unwrap(), ["billing", "support"]);
//! assert!(!content.values.contains("notes"));
//!
//! let request = Request::post("/contact")
//!     .header("content-type", "application/json")
//!     .body(Full::new(Bytes::from_static(br#"{"age": 5}"#)))
//!     .unwrap();
//!
//! let error = parse_form(request, &()).await.unwrap_err();
//! assert_eq!(error.kind(), ErrorKind::BadRequest);
//! assert_eq!(error.status_code(), http::StatusCode::BAD_REQUEST);
//! # }
//! ```

mod body;
mod config;
mod decoder;
mod error;
mod file;
mod negotiate;
mod parser;
mod values;

pub use body::fn_sink;
pub use body::BodyLimitSink;
pub use body::BoxError;
pub use body::LimitError;
pub use body::LimitedBody;
pub use config::FormConfig;
pub use config::DEFAULT_MAX_FORM_SIZE;
pub use config::DEFAULT_MAX_FORM_WITH_FILES_SIZE;
pub use config::DEFAULT_MAX_MEMORY;
pub use config::MEGABYTE;
pub use error::ErrorKind;
pub use error::ParseError;
pub use file::FileReader;
pub use file::UploadedFile;
pub use negotiate::negotiate;
pub use negotiate::FormEncoding;
pub use parser::parse_form;
pub use parser::parse_form_with_config;
pub use parser::FormParser;
pub use values::FormContent;
pub use values::FormFiles;
pub use values::FormValues;
