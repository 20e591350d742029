//! Bounded request bodies.
//!
//! [`LimitedBody`] wraps any [`http_body::Body`] and counts the data bytes flowing
//! through it. The first frame that pushes the running total past the ceiling is
//! replaced by [`LimitError::LengthLimitExceeded`], and every later poll returns the
//! same error. The ceiling is enforced on what is actually read, so a misreported
//! `Content-Length` can't get a larger body through.

use bytes::Bytes;
use http_body::{Body, Frame, SizeHint};
use pin_project_lite::pin_project;
use std::fmt;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use thiserror::Error;
use tracing::debug;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Receives the signal that a request body went past its ceiling.
///
/// The HTTP layer can use it to stop reading from the connection and close it once the
/// response has been written. It is called at most once per body.
pub trait BodyLimitSink: Send + Sync {
    fn body_limit_exceeded(&self, limit: u64);
}

/// Ignores the signal.
impl BodyLimitSink for () {
    #[inline]
    fn body_limit_exceeded(&self, _limit: u64) {}
}

/// A sink that wraps a closure.
struct FnSink<F>(F);

impl<F: Fn(u64) + Send + Sync> BodyLimitSink for FnSink<F> {
    fn body_limit_exceeded(&self, limit: u64) {
        (self.0)(limit);
    }
}

/// Creates a [`BodyLimitSink`] from a closure.
///
/// # Example
/// ```
/// use micro_form::{fn_sink, BodyLimitSink};
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// let close_connection = AtomicBool::new(false);
/// let sink = fn_sink(|_limit| close_connection.store(true, Ordering::Relaxed));
/// sink.body_limit_exceeded(1024);
/// assert!(close_connection.load(Ordering::Relaxed));
/// ```
pub fn fn_sink<F>(f: F) -> impl BodyLimitSink
where
    F: Fn(u64) + Send + Sync,
{
    FnSink(f)
}

#[derive(Error, Debug)]
pub enum LimitError {
    #[error("body exceeded the limit of {limit} bytes")]
    LengthLimitExceeded { limit: u64 },

    #[error("body read failed: {source}")]
    Body { source: BoxError },
}

impl LimitError {
    pub fn is_limit_exceeded(&self) -> bool {
        matches!(self, LimitError::LengthLimitExceeded { .. })
    }
}

pin_project! {
    /// A body that fails once more than `limit` data bytes have been read from it.
    pub struct LimitedBody<'s, B> {
        #[pin]
        inner: B,
        limit: u64,
        read: u64,
        exceeded: bool,
        sink: &'s dyn BodyLimitSink,
    }
}

impl<'s, B> LimitedBody<'s, B> {
    pub fn new(inner: B, limit: u64, sink: &'s dyn BodyLimitSink) -> Self {
        Self { inner, limit, read: 0, exceeded: false, sink }
    }

    #[inline]
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// The number of data bytes read so far.
    #[inline]
    pub fn read_bytes(&self) -> u64 {
        self.read
    }
}

impl<B: fmt::Debug> fmt::Debug for LimitedBody<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LimitedBody")
            .field("inner", &self.inner)
            .field("limit", &self.limit)
            .field("read", &self.read)
            .field("exceeded", &self.exceeded)
            .finish_non_exhaustive()
    }
}

impl<B> Body for LimitedBody<'_, B>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    type Data = Bytes;
    type Error = LimitError;

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.project();
        if *this.exceeded {
            return Poll::Ready(Some(Err(LimitError::LengthLimitExceeded { limit: *this.limit })));
        }

        match ready!(this.inner.poll_frame(cx)) {
            Some(Ok(frame)) => {
                if let Some(data) = frame.data_ref() {
                    *this.read = this.read.saturating_add(data.len() as u64);
                    if *this.read > *this.limit {
                        *this.exceeded = true;
                        debug!(limit = *this.limit, read = *this.read, "request body exceeded the limit");
                        this.sink.body_limit_exceeded(*this.limit);
                        return Poll::Ready(Some(Err(LimitError::LengthLimitExceeded { limit: *this.limit })));
                    }
                }
                Poll::Ready(Some(Ok(frame)))
            }
            Some(Err(e)) => Poll::Ready(Some(Err(LimitError::Body { source: e.into() }))),
            None => Poll::Ready(None),
        }
    }

    fn is_end_stream(&self) -> bool {
        !self.exceeded && self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        let inner = self.inner.size_hint();
        let mut hint = SizeHint::new();
        hint.set_lower(inner.lower().min(self.limit));
        if let Some(upper) = inner.upper() {
            hint.set_upper(upper.min(self.limit));
        }
        hint
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use http_body_util::{BodyExt, Full, StreamBody};
    use std::io;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn chunked(chunks: &[&'static str]) -> StreamBody<impl futures::Stream<Item = Result<Frame<Bytes>, io::Error>>> {
        let frames: Vec<Result<Frame<Bytes>, io::Error>> =
            chunks.iter().map(|c| Ok(Frame::data(Bytes::from_static(c.as_bytes())))).collect();
        StreamBody::new(stream::iter(frames))
    }

    #[tokio::test]
    async fn test_exactly_at_limit() {
        let body = LimitedBody::new(Full::new(Bytes::from_static(b"0123456789")), 10, &());
        let bytes = body.collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"0123456789");
    }

    #[tokio::test]
    async fn test_one_byte_over_limit() {
        let body = LimitedBody::new(Full::new(Bytes::from_static(b"0123456789a")), 10, &());
        let error = body.collect().await.unwrap_err();
        assert!(error.is_limit_exceeded());
    }

    #[tokio::test]
    async fn test_limit_across_chunks_signals_once() {
        let signals = AtomicU64::new(0);
        let sink = fn_sink(|limit| {
            assert_eq!(limit, 5);
            signals.fetch_add(1, Ordering::SeqCst);
        });

        let mut body = LimitedBody::new(chunked(&["abc", "def", "ghi"]), 5, &sink);

        assert_eq!(body.frame().await.unwrap().unwrap().into_data().unwrap(), "abc");
        assert!(body.frame().await.unwrap().unwrap_err().is_limit_exceeded());
        assert!(body.frame().await.unwrap().unwrap_err().is_limit_exceeded());
        assert_eq!(body.read_bytes(), 6);
        assert_eq!(signals.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_inner_error_is_wrapped() {
        let frames: Vec<Result<Frame<Bytes>, io::Error>> =
            vec![Ok(Frame::data(Bytes::from_static(b"ab"))), Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))];
        let body = LimitedBody::new(StreamBody::new(stream::iter(frames)), 1024, &());

        let error = body.collect().await.unwrap_err();
        assert!(!error.is_limit_exceeded());
        assert!(matches!(error, LimitError::Body { .. }));
    }

    #[test]
    fn test_size_hint_is_clamped() {
        let body = LimitedBody::new(Full::new(Bytes::from_static(b"0123456789")), 4, &());
        assert_eq!(body.size_hint().upper(), Some(4));
        assert_eq!(body.limit(), 4);
    }
}
