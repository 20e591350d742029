//! The entry points: negotiate the encoding, bound the body, decode.

use crate::body::{BodyLimitSink, BoxError, LimitedBody};
use crate::decoder::{decode_json, decode_multipart, decode_urlencoded};
use crate::negotiate::{content_type, negotiate};
use crate::{FormConfig, FormContent, FormEncoding, ParseError};
use bytes::Bytes;
use http::{HeaderMap, Request};
use http_body::Body;
use tracing::debug;

/// Parses request bodies into [`FormContent`] under a fixed [`FormConfig`].
///
/// A parser holds no state besides its configuration, so one instance can serve any
/// number of concurrent requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormParser {
    config: FormConfig,
}

impl FormParser {
    pub fn new(config: FormConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    /// Parses the body of `request`.
    ///
    /// Only the `Content-Type` header and the body are looked at; the query string of
    /// the request target is ignored. `sink` is told when the body goes past its ceiling.
    pub async fn parse<B>(&self, request: Request<B>, sink: &dyn BodyLimitSink) -> Result<FormContent, ParseError>
    where
        B: Body<Data = Bytes> + Send,
        B::Error: Into<BoxError>,
    {
        let (parts, body) = request.into_parts();
        self.parse_body(&parts.headers, body, sink).await
    }

    /// Same as [`parse`](FormParser::parse), for callers holding the headers and the
    /// body separately.
    pub async fn parse_body<B>(
        &self,
        headers: &HeaderMap,
        body: B,
        sink: &dyn BodyLimitSink,
    ) -> Result<FormContent, ParseError>
    where
        B: Body<Data = Bytes> + Send,
        B::Error: Into<BoxError>,
    {
        let content_type = content_type(headers)?;
        let encoding = negotiate(content_type)?;

        let limit = self.limit_for(encoding);
        debug!(%encoding, limit, "parse form body");
        let body = LimitedBody::new(body, limit, sink);

        match encoding {
            FormEncoding::Json => decode_json(body).await.map(FormContent::from),
            FormEncoding::UrlEncoded => decode_urlencoded(body).await.map(FormContent::from),
            FormEncoding::Multipart => decode_multipart(content_type, body, self.config.get_max_memory()).await,
        }
    }

    /// The body ceiling applied to `encoding`.
    pub fn limit_for(&self, encoding: FormEncoding) -> u64 {
        if encoding.carries_files() {
            self.config.get_max_form_with_files_size()
        } else {
            self.config.get_max_form_size()
        }
    }
}

impl From<FormConfig> for FormParser {
    fn from(config: FormConfig) -> Self {
        Self::new(config)
    }
}

/// Parses the body of `request` with the default ceilings: 1 MiB for JSON and URL
/// encoded bodies, 10 MiB for multipart bodies, of which up to 10 MiB of files are
/// held in memory.
pub async fn parse_form<B>(request: Request<B>, sink: &dyn BodyLimitSink) -> Result<FormContent, ParseError>
where
    B: Body<Data = Bytes> + Send,
    B::Error: Into<BoxError>,
{
    FormParser::default().parse(request, sink).await
}

/// Creates a parser with the given ceilings, all in bytes.
///
/// - `max_form_size`: ceiling for JSON and URL encoded bodies, which can't carry files
/// - `max_form_with_files_size`: ceiling for multipart bodies
/// - `max_memory`: how many bytes of uploaded files are kept in memory before the
///   remaining files are written to temporary files
pub fn parse_form_with_config(max_form_size: u64, max_form_with_files_size: u64, max_memory: u64) -> FormParser {
    FormParser::new(
        FormConfig::new()
            .max_form_size(max_form_size)
            .max_form_with_files_size(max_form_with_files_size)
            .max_memory(max_memory),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorKind, MEGABYTE};
    use http::header::CONTENT_TYPE;
    use http_body_util::Full;

    fn request(content_type: &str, body: &'static str) -> Request<Full<Bytes>> {
        Request::post("/submit?ignored=1")
            .header(CONTENT_TYPE, content_type)
            .body(Full::new(Bytes::from_static(body.as_bytes())))
            .unwrap()
    }

    #[test]
    fn test_limit_for() {
        let parser = parse_form_with_config(10, 20, 30);
        assert_eq!(parser.limit_for(FormEncoding::Json), 10);
        assert_eq!(parser.limit_for(FormEncoding::UrlEncoded), 10);
        assert_eq!(parser.limit_for(FormEncoding::Multipart), 20);
        assert_eq!(parser.config().get_max_memory(), 30);
    }

    #[test]
    fn test_default_parser() {
        let parser = FormParser::default();
        assert_eq!(parser.limit_for(FormEncoding::Json), MEGABYTE);
        assert_eq!(parser.limit_for(FormEncoding::Multipart), 10 * MEGABYTE);
    }

    #[tokio::test]
    async fn test_query_string_is_ignored() {
        let content = parse_form(request("application/x-www-form-urlencoded", "field1=value1"), &()).await.unwrap();

        assert!(!content.values.contains("ignored"));
        assert_eq!(content.values.first("field1"), Some("value1"));
    }

    #[tokio::test]
    async fn test_json_uses_form_ceiling() {
        let parser = parse_form_with_config(8, 1024, 1024);
        let error = parser.parse(request("application/json", r#"{"field1": "value1"}"#), &()).await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::PayloadTooLarge);
        assert_eq!(error.message(), "body too large");
    }

    #[tokio::test]
    async fn test_missing_content_type() {
        let request = Request::post("/").body(Full::new(Bytes::from_static(b"field1=value1"))).unwrap();
        let error = parse_form(request, &()).await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::UnsupportedMediaType);
    }
}
