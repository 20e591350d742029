//! `multipart/form-data` bodies.
//!
//! Parts with a non-empty `filename` become [`UploadedFile`]s, every other named part
//! becomes a value. File content is buffered in memory while the request stays within
//! its memory budget; a file that doesn't fit is moved, whole, to a named temporary
//! file. Files that stay in memory are charged to the budget, so the budget covers the
//! sum of all in-memory files of the request.
//!
//! Spill writes go through the blocking file handle, so decoding needs no particular
//! async runtime.

use crate::body::{BoxError, LimitError, LimitedBody};
use crate::file::UploadedFile;
use crate::{FormContent, FormFiles, FormValues, ParseError};
use bytes::{Bytes, BytesMut};
use http_body::Body;
use http_body_util::BodyExt;
use mime::Mime;
use multer::{Field, Multipart};
use std::io::Write;
use tempfile::NamedTempFile;
use tracing::{debug, trace, warn};

const INVALID_FORM: &str = "invalid multipart form";

pub(crate) async fn decode_multipart<B>(
    content_type: &str,
    body: LimitedBody<'_, B>,
    max_memory: u64,
) -> Result<FormContent, ParseError>
where
    B: Body<Data = Bytes> + Send,
    B::Error: Into<BoxError>,
{
    let boundary = multer::parse_boundary(content_type).map_err(|e| {
        debug!(cause = %e, content_type, "multipart content type has no usable boundary");
        ParseError::bad_request(INVALID_FORM)
    })?;

    let mut multipart = Multipart::new(body.into_data_stream(), boundary);
    let mut values = FormValues::new();
    let mut files = FormFiles::new();
    let mut memory_budget = max_memory;

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name().filter(|name| !name.is_empty()).map(str::to_owned) else {
            trace!(index = field.index(), "skip multipart part without a name");
            continue;
        };

        // browsers send an unselected file input as a part with an empty filename
        let file_name = field.file_name().filter(|file_name| !file_name.is_empty()).map(str::to_owned);
        match file_name {
            Some(file_name) => {
                let content_type = field.content_type().cloned();
                let file = read_file(&mut field, file_name, content_type, &mut memory_budget).await?;
                files.push(name, file);
            }
            None => {
                let bytes = field.bytes().await.map_err(multipart_error)?;
                let value = String::from_utf8(bytes.into()).map_err(|e| {
                    debug!(cause = %e, field = %name, "multipart value is not utf8");
                    ParseError::bad_request(INVALID_FORM)
                })?;
                values.append(name, value);
            }
        }
    }

    values.reduce_unanswered();
    Ok(FormContent::new(values, files))
}

async fn read_file(
    field: &mut Field<'_>,
    file_name: String,
    content_type: Option<Mime>,
    memory_budget: &mut u64,
) -> Result<UploadedFile, ParseError> {
    let mut buffer = BytesMut::new();
    let mut spilled: Option<NamedTempFile> = None;
    let mut size: u64 = 0;

    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        size += chunk.len() as u64;

        if let Some(temp_file) = spilled.as_mut() {
            temp_file.write_all(&chunk).map_err(storage_error)?;
            continue;
        }

        if size > *memory_budget {
            let mut temp_file = create_spill_file()?;
            temp_file.write_all(&buffer).map_err(storage_error)?;
            temp_file.write_all(&chunk).map_err(storage_error)?;
            buffer = BytesMut::new();
            spilled = Some(temp_file);
        } else {
            buffer.extend_from_slice(&chunk);
        }
    }

    match spilled {
        Some(mut temp_file) => {
            temp_file.flush().map_err(storage_error)?;
            trace!(file_name = %file_name, size, path = ?temp_file.path(), "spilled uploaded file to disk");
            Ok(UploadedFile::on_disk(file_name, content_type, size, temp_file))
        }
        None => {
            *memory_budget -= size;
            Ok(UploadedFile::in_memory(file_name, content_type, buffer.freeze()))
        }
    }
}

fn create_spill_file() -> Result<NamedTempFile, ParseError> {
    tempfile::Builder::new().prefix("micro-form-").tempfile().map_err(storage_error)
}

fn storage_error(error: std::io::Error) -> ParseError {
    warn!(cause = %error, "failed to store uploaded file");
    ParseError::internal("failed to store uploaded file")
}

fn multipart_error(error: multer::Error) -> ParseError {
    if let multer::Error::StreamReadFailed(source) = &error
        && source.downcast_ref::<LimitError>().is_some_and(LimitError::is_limit_exceeded)
    {
        return ParseError::payload_too_large(INVALID_FORM);
    }

    debug!(cause = %error, "failed to decode multipart body");
    ParseError::bad_request(INVALID_FORM)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use http_body_util::Full;
    use indoc::indoc;

    const CONTENT_TYPE: &str = "multipart/form-data; boundary=X-BOUNDARY";

    fn body(raw: &str) -> Full<Bytes> {
        Full::new(Bytes::from(raw.replace('\n', "\r\n")))
    }

    async fn decode(raw: &str, limit: u64, max_memory: u64) -> Result<FormContent, ParseError> {
        decode_multipart(CONTENT_TYPE, LimitedBody::new(body(raw), limit, &()), max_memory).await
    }

    const VALUE_AND_FILE: &str = indoc! {r#"
        --X-BOUNDARY
        Content-Disposition: form-data; name="field1"

        value1
        --X-BOUNDARY
        Content-Disposition: form-data; name="file1"; filename="a.png"
        Content-Type: image/png

        not really a png
        --X-BOUNDARY--
    "#};

    #[tokio::test]
    async fn test_value_and_file() {
        let content = decode(VALUE_AND_FILE, 1024, 1024).await.unwrap();

        assert_eq!(content.values.get("field1").unwrap(), ["value1"]);

        let file = &content.files.get("file1").unwrap()[0];
        assert_eq!(file.file_name(), "a.png");
        assert_eq!(file.content_type(), Some(&mime::IMAGE_PNG));
        assert_eq!(file.size(), 16);
        assert!(file.is_in_memory());
        assert_eq!(file.bytes().unwrap(), "not really a png");
    }

    #[tokio::test]
    async fn test_spill_to_disk() {
        let content = decode(VALUE_AND_FILE, 1024, 8).await.unwrap();

        let file = &content.files.get("file1").unwrap()[0];
        assert!(!file.is_in_memory());
        assert_eq!(file.size(), 16);
        assert_eq!(file.bytes().unwrap(), "not really a png");
        assert!(file.path().unwrap().exists());
    }

    #[tokio::test]
    async fn test_budget_is_shared_between_files() {
        let raw = indoc! {r#"
            --X-BOUNDARY
            Content-Disposition: form-data; name="photos"; filename="1.txt"

            0123456789
            --X-BOUNDARY
            Content-Disposition: form-data; name="photos"; filename="2.txt"

            0123456789
            --X-BOUNDARY--
        "#};

        let content = decode(raw, 1024, 15).await.unwrap();

        let photos = content.files.get("photos").unwrap();
        assert_eq!(photos.len(), 2);
        assert!(photos[0].is_in_memory());
        assert!(!photos[1].is_in_memory());
    }

    #[tokio::test]
    async fn test_repeated_values_and_unanswered() {
        let raw = indoc! {r#"
            --X-BOUNDARY
            Content-Disposition: form-data; name="topping"

            cheese
            --X-BOUNDARY
            Content-Disposition: form-data; name="topping"

            olives
            --X-BOUNDARY
            Content-Disposition: form-data; name="notes"


            --X-BOUNDARY
            Content-Disposition: form-data; name="attachment"; filename=""
            Content-Type: application/octet-stream


            --X-BOUNDARY--
        "#};

        let content = decode(raw, 1024, 1024).await.unwrap();

        assert_eq!(content.values.get("topping").unwrap(), ["cheese", "olives"]);
        assert!(!content.values.contains("notes"));
        assert!(!content.values.contains("attachment"));
        assert!(content.files.is_empty());
    }

    #[tokio::test]
    async fn test_empty_form() {
        let content = decode("--X-BOUNDARY--\n", 1024, 1024).await.unwrap();
        assert!(content.values.is_empty());
        assert!(content.files.is_empty());
    }

    #[tokio::test]
    async fn test_missing_boundary() {
        let error = decode_multipart("multipart/form-data", LimitedBody::new(body(VALUE_AND_FILE), 1024, &()), 1024)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::BadRequest);
        assert_eq!(error.message(), "invalid multipart form");
    }

    #[tokio::test]
    async fn test_truncated_body() {
        let raw = indoc! {r#"
            --X-BOUNDARY
            Content-Disposition: form-data; name="field1"

            value1
        "#};

        let error = decode(raw, 1024, 1024).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::BadRequest);
    }

    #[tokio::test]
    async fn test_parts_without_a_name_are_skipped() {
        let raw = indoc! {r#"
            --X-BOUNDARY
            Content-Disposition: form-data

            anonymous
            --X-BOUNDARY
            Content-Disposition: form-data; name=""

            empty name
            --X-BOUNDARY
            Content-Disposition: form-data; name=""; filename="orphan.txt"

            orphan
            --X-BOUNDARY
            Content-Disposition: form-data; name="field1"

            value1
            --X-BOUNDARY--
        "#};

        let content = decode(raw, 1024, 1024).await.unwrap();

        assert_eq!(content.values.len(), 1);
        assert_eq!(content.values.first("field1"), Some("value1"));
        assert!(!content.values.contains(""));
        assert!(content.files.is_empty());
    }

    #[tokio::test]
    async fn test_value_must_be_utf8() {
        let mut raw = b"--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"field1\"\r\n\r\n".to_vec();
        raw.extend_from_slice(b"caf\xe9");
        raw.extend_from_slice(b"\r\n--X-BOUNDARY--\r\n");

        let body = LimitedBody::new(Full::new(Bytes::from(raw)), 1024, &());
        let error = decode_multipart(CONTENT_TYPE, body, 1024).await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::BadRequest);
        assert_eq!(error.message(), "invalid multipart form");
    }

    #[test]
    fn test_spill_without_tokio_runtime() {
        let content = futures::executor::block_on(decode(VALUE_AND_FILE, 1024, 8)).unwrap();

        let file = &content.files.get("file1").unwrap()[0];
        assert!(!file.is_in_memory());
        assert_eq!(file.bytes().unwrap(), "not really a png");
    }

    #[tokio::test]
    async fn test_exactly_at_limit() {
        let limit = VALUE_AND_FILE.replace('\n', "\r\n").len() as u64;

        let content = decode(VALUE_AND_FILE, limit, 1024).await.unwrap();
        assert_eq!(content.values.first("field1"), Some("value1"));

        let error = decode(VALUE_AND_FILE, limit - 1, 1024).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::PayloadTooLarge);
    }

    #[tokio::test]
    async fn test_over_limit() {
        let error = decode(VALUE_AND_FILE, 64, 1024).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::PayloadTooLarge);
    }
}
