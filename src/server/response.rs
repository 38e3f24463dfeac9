use crate::record::Record;
use futures::future::{self, BoxFuture};
use parking_lot::Mutex;
use serde::Serialize;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Maximum number of headers stored inline before spilling to the heap.
pub const MAX_INLINE_HEADERS: usize = 8;

/// Response headers. Names are lowercase and shared.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Default content type of a fresh response.
pub const DEFAULT_CONTENT_TYPE: &str = "text/html";

/// A complete response handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderVec,
    pub body: Vec<u8>,
}

impl HttpResponse {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn body_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Convert into an `http::Response` for transports built on the `http`
    /// crate.
    ///
    /// # Errors
    ///
    /// Returns an error if the status or a header is not valid HTTP.
    pub fn into_http(self) -> Result<http::Response<Vec<u8>>, http::Error> {
        let mut builder = http::Response::builder().status(self.status);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_ref(), value.as_str());
        }
        builder.body(self.body)
    }
}

/// Errors raised while writing a response.
#[derive(Debug, Error)]
pub enum ResponseError {
    /// Another clone of the same response context already sent a response.
    #[error("response already sent")]
    AlreadySent,

    #[error("failed to write response: {0}")]
    Io(#[from] io::Error),

    #[error("failed to serialize response body: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Where responses go. Implemented by the transport.
pub trait ResponseSink: Send + Sync {
    fn send(&self, response: HttpResponse) -> BoxFuture<'_, io::Result<()>>;
}

/// Sink that keeps every response in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    responses: Mutex<Vec<HttpResponse>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    #[must_use]
    pub fn responses(&self) -> Vec<HttpResponse> {
        self.responses.lock().clone()
    }

    #[must_use]
    pub fn last(&self) -> Option<HttpResponse> {
        self.responses.lock().last().cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.responses.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.responses.lock().is_empty()
    }

    /// Remove and return everything captured so far.
    pub fn take(&self) -> Vec<HttpResponse> {
        std::mem::take(&mut *self.responses.lock())
    }
}

impl ResponseSink for MemorySink {
    fn send(&self, response: HttpResponse) -> BoxFuture<'_, io::Result<()>> {
        self.responses.lock().push(response);
        Box::pin(future::ready(Ok(())))
    }
}

/// Sink that forwards responses over a tokio channel, for transports that
/// write from a separate task.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<HttpResponse>,
}

impl ChannelSink {
    #[must_use]
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<HttpResponse>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

impl ResponseSink for ChannelSink {
    fn send(&self, response: HttpResponse) -> BoxFuture<'_, io::Result<()>> {
        let result = self
            .tx
            .send(response)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "response channel closed"));
        Box::pin(future::ready(result))
    }
}

/// Set once by whichever clone sends first.
#[derive(Debug, Default)]
struct CommitCell {
    sent: AtomicBool,
    status: AtomicU16,
}

impl CommitCell {
    fn claim(&self, status: u16) -> bool {
        let claimed = self
            .sent
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if claimed {
            self.status.store(status, Ordering::Release);
        }
        claimed
    }
}

/// Response under construction for one request.
///
/// Cloning snapshots the status and headers; all clones share one commit
/// cell, so at most one of them reaches the sink.
#[derive(Clone)]
pub struct ResponseContext {
    sink: Arc<dyn ResponseSink>,
    status: u16,
    headers: HeaderVec,
    commit: Arc<CommitCell>,
}

impl std::fmt::Debug for ResponseContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseContext")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("committed", &self.is_committed())
            .finish_non_exhaustive()
    }
}

impl ResponseContext {
    /// Fresh response: status 200, `content-type: text/html`.
    #[must_use]
    pub fn new(sink: Arc<dyn ResponseSink>) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), DEFAULT_CONTENT_TYPE.to_string()));
        Self {
            sink,
            status: 200,
            headers,
            commit: Arc::new(CommitCell::default()),
        }
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderVec {
        &self.headers
    }

    /// Set header `name`, replacing any existing value.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(slot) = self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            slot.1 = value;
        } else {
            self.headers
                .push((Arc::from(name.to_ascii_lowercase()), value));
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    /// Whether any clone of this context has sent its response.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.commit.sent.load(Ordering::Acquire)
    }

    /// Status of the response that was sent, if any.
    #[must_use]
    pub fn committed_status(&self) -> Option<u16> {
        self.is_committed()
            .then(|| self.commit.status.load(Ordering::Acquire))
    }

    /// Send the response with `body`.
    ///
    /// # Errors
    ///
    /// [`ResponseError::AlreadySent`] if a clone already sent a response,
    /// [`ResponseError::Io`] if the sink fails.
    pub async fn send(self, body: impl Into<Vec<u8>>) -> Result<(), ResponseError> {
        let body = body.into();
        if !self.commit.claim(self.status) {
            warn!(status = self.status, "Response already sent, dropping second response");
            return Err(ResponseError::AlreadySent);
        }
        debug!(status = self.status, body_size = body.len(), "Sending response");
        let response = HttpResponse {
            status: self.status,
            headers: self.headers,
            body,
        };
        self.sink.send(response).await?;
        Ok(())
    }

    /// Send `body` as `text/plain`.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn text(self, body: impl Into<String>) -> Result<(), ResponseError> {
        let body = body.into();
        self.with_header("content-type", "text/plain; charset=utf-8")
            .send(body)
            .await
    }

    /// Serialize `value` and send it as `application/json`.
    ///
    /// # Errors
    ///
    /// [`ResponseError::Serialize`] if `value` cannot be serialized, or see
    /// [`send`](Self::send).
    pub async fn json<T: Serialize + ?Sized>(self, value: &T) -> Result<(), ResponseError> {
        let body = serde_json::to_vec(value)?;
        self.with_header("content-type", "application/json")
            .send(body)
            .await
    }

    /// Send a record as a JSON object.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn json_record(self, record: &Record) -> Result<(), ResponseError> {
        let body = serde_json::to_vec(&record.to_json())?;
        self.with_header("content-type", "application/json")
            .send(body)
            .await
    }
}
