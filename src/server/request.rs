use crate::fixed_str::FieldName;
use crate::ids::RequestId;
use crate::record::{algebra, ConversionPolicy, Extensions, Record, RecordError};
use http::header::{HeaderName, HeaderValue, COOKIE};
use http::{HeaderMap, Method, Version};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Mixin name under which [`CookieParser`](crate::middleware::CookieParser)
/// stores parsed cookies.
pub const COOKIES_MIXIN: FieldName = FieldName::from_static("cookies");

/// A fully decoded request as handed over by the transport.
#[derive(Debug, Clone)]
pub struct DecodedRequest {
    pub method: Method,
    /// Request target as received, query string included.
    pub target: String,
    pub version: Version,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl DecodedRequest {
    #[must_use]
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        Self {
            method,
            target: target.into(),
            version: Version::HTTP_11,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    /// Append a header. Names or values that are not valid HTTP are skipped.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            _ => warn!(header = %name, "Skipping invalid header"),
        }
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}

impl From<http::Request<Vec<u8>>> for DecodedRequest {
    fn from(request: http::Request<Vec<u8>>) -> Self {
        let (parts, body) = request.into_parts();
        let target = parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path().to_string(), |pq| pq.as_str().to_string());
        Self {
            method: parts.method,
            target,
            version: parts.version,
            headers: parts.headers,
            body,
        }
    }
}

/// Request data that never changes while a request descends the tree.
#[derive(Debug)]
pub struct RequestHead {
    method: Method,
    target: String,
    /// Byte length of the path part of `target`.
    path_len: usize,
    version: Version,
    headers: HeaderMap,
    request_id: RequestId,
    query: Record,
    raw_body: Arc<[u8]>,
}

impl RequestHead {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn path(&self) -> &str {
        &self.target[..self.path_len]
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }
}

/// Request body as seen by a route stage.
#[derive(Debug, Clone)]
pub enum Body {
    /// Bytes as received.
    Raw(Arc<[u8]>),
    /// Fields extracted by a body parser.
    Structured(Record),
}

impl Body {
    #[must_use]
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Body::Structured(record) => Some(record),
            Body::Raw(_) => None,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Body::Raw(bytes) => Some(bytes),
            Body::Structured(_) => None,
        }
    }
}

/// Per-request state threaded through route nodes.
///
/// The head is shared; everything a stage may extend (params, body, mixins,
/// extensions, the path cursor) is owned. Every `with_*` and [`consume`]
/// call takes the context by value and returns the extended one, so a stage
/// never observes a later stage's additions.
///
/// [`consume`]: RequestContext::consume
#[derive(Debug)]
pub struct RequestContext {
    head: Arc<RequestHead>,
    cursor: usize,
    params: Record,
    body: Body,
    mixins: Vec<(FieldName, Record)>,
    extensions: Extensions,
    conversion_policy: ConversionPolicy,
}

impl RequestContext {
    /// Build the initial context for a request. The query string is split
    /// off the target and decoded here.
    #[must_use]
    pub fn new(request: DecodedRequest, request_id: RequestId) -> Self {
        let DecodedRequest {
            method,
            target,
            version,
            headers,
            body,
        } = request;

        let path_len = target.find('?').unwrap_or(target.len());
        let query = parse_query(&target[path_len..]);
        let raw_body: Arc<[u8]> = Arc::from(body);

        debug!(
            method = %method,
            path = %&target[..path_len],
            query_params = query.len(),
            body_size = raw_body.len(),
            request_id = %request_id,
            "Request context created"
        );

        Self {
            head: Arc::new(RequestHead {
                method,
                target,
                path_len,
                version,
                headers,
                request_id,
                query,
                raw_body: Arc::clone(&raw_body),
            }),
            cursor: 0,
            params: Record::empty(),
            body: Body::Raw(raw_body),
            mixins: Vec::new(),
            extensions: Extensions::new(),
            conversion_policy: ConversionPolicy::default(),
        }
    }

    #[must_use]
    pub fn head(&self) -> &Arc<RequestHead> {
        &self.head
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.head.method
    }

    /// Path without the query string.
    #[must_use]
    pub fn path(&self) -> &str {
        self.head.path()
    }

    /// The part of the path not yet consumed by binders.
    #[must_use]
    pub fn remaining(&self) -> &str {
        &self.head.path()[self.cursor..]
    }

    /// The part of the path consumed so far.
    #[must_use]
    pub fn consumed(&self) -> &str {
        &self.head.path()[..self.cursor]
    }

    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.head.request_id
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.head.headers
    }

    /// First value of header `name`, if it is valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.headers.get(name).and_then(|v| v.to_str().ok())
    }

    #[must_use]
    pub fn query(&self) -> &Record {
        &self.head.query
    }

    #[must_use]
    pub fn params(&self) -> &Record {
        &self.params
    }

    #[must_use]
    pub fn body(&self) -> &Body {
        &self.body
    }

    #[must_use]
    pub fn raw_body(&self) -> &[u8] {
        &self.head.raw_body
    }

    #[must_use]
    pub fn mixin(&self, name: &str) -> Option<&Record> {
        self.mixins
            .binary_search_by(|(k, _)| k.as_str().cmp(name))
            .ok()
            .map(|i| &self.mixins[i].1)
    }

    /// Cookies attached by a cookie parser above this stage.
    #[must_use]
    pub fn cookies(&self) -> Option<&Record> {
        self.mixin(COOKIES_MIXIN.as_str())
    }

    #[must_use]
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Policy endpoints use for param conversion unless they set their own.
    #[must_use]
    pub fn conversion_policy(&self) -> ConversionPolicy {
        self.conversion_policy
    }

    /// Typed view of the path parameters.
    ///
    /// # Errors
    ///
    /// [`RecordError::Deserialize`] when the parameters do not fit `T`.
    pub fn params_as<T: DeserializeOwned>(&self) -> Result<T, RecordError> {
        self.params.deserialize()
    }

    /// Typed view of a structured body.
    ///
    /// # Errors
    ///
    /// [`RecordError::NotAnObject`] when no body parser ran above this stage,
    /// [`RecordError::Deserialize`] when the fields do not fit `T`.
    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T, RecordError> {
        match &self.body {
            Body::Structured(record) => record.deserialize(),
            Body::Raw(_) => Err(RecordError::NotAnObject { found: "raw bytes" }),
        }
    }

    /// Advance the path cursor by `len` bytes.
    #[must_use]
    pub fn consume(mut self, len: usize) -> Self {
        let path_len = self.head.path_len;
        self.cursor = (self.cursor + len).min(path_len);
        debug_assert!(self.head.path().is_char_boundary(self.cursor));
        self
    }

    /// Merge `captures` into the params; captured values replace existing
    /// ones with the same name.
    #[must_use]
    pub fn with_params(mut self, captures: &Record) -> Self {
        self.params = self.params.union(captures);
        self
    }

    /// Replace the params wholesale.
    #[must_use]
    pub fn replace_params(mut self, params: Record) -> Self {
        self.params = params;
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    /// Attach a named mixin, replacing any mixin with the same name.
    #[must_use]
    pub fn with_mixin(mut self, name: impl Into<FieldName>, value: Record) -> Self {
        let single = [(name.into(), value)];
        self.mixins = algebra::union(&self.mixins, &single);
        self
    }

    #[must_use]
    pub fn with_conversion_policy(mut self, policy: ConversionPolicy) -> Self {
        self.conversion_policy = policy;
        self
    }

    #[must_use]
    pub fn with_extensions(mut self, extensions: Extensions) -> Self {
        self.extensions.absorb(extensions);
        self
    }
}

/// Parse every `cookie` header into a record of cookie name to value.
///
/// Entries are split on `;`; each entry is `name=value`, with an entry that
/// has no `=` yielding an empty value. When a name repeats, the last entry
/// wins.
#[must_use]
pub fn parse_cookies(headers: &HeaderMap) -> Record {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| {
            let mut parts = pair.trim().splitn(2, '=');
            let name = parts.next()?.trim();
            if name.is_empty() {
                return None;
            }
            let value = parts.next().unwrap_or("").trim();
            Some((
                FieldName::from(name.to_string()),
                Value::String(value.to_string()),
            ))
        })
        .collect()
}

/// Decode a query string (with or without its leading `?`). When a name
/// repeats, the last value wins.
#[must_use]
pub fn parse_query(query: &str) -> Record {
    let query = query.strip_prefix('?').unwrap_or(query);
    if query.is_empty() {
        return Record::empty();
    }
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (FieldName::from(k.into_owned()), Value::String(v.into_owned())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(target: &str) -> RequestContext {
        RequestContext::new(DecodedRequest::new(Method::GET, target), RequestId::new())
    }

    #[test]
    fn test_parse_cookies() {
        let mut h = HeaderMap::new();
        h.insert(COOKIE, HeaderValue::from_static("a=b; c=d; flag"));
        let cookies = parse_cookies(&h);
        assert_eq!(cookies.get_str("a"), Some("b"));
        assert_eq!(cookies.get_str("c"), Some("d"));
        assert_eq!(cookies.get_str("flag"), Some(""));
    }

    #[test]
    fn test_parse_cookies_last_wins() {
        let mut h = HeaderMap::new();
        h.append(COOKIE, HeaderValue::from_static("session=old"));
        h.append(COOKIE, HeaderValue::from_static("session=new; ;"));
        let cookies = parse_cookies(&h);
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies.get_str("session"), Some("new"));
    }

    #[test]
    fn test_parse_query() {
        let q = parse_query("?limit=10&name=a%20b&limit=20");
        assert_eq!(q.get_str("limit"), Some("20"));
        assert_eq!(q.get_str("name"), Some("a b"));
        assert!(parse_query("").is_empty());
    }

    #[test]
    fn test_query_split_from_path() {
        let c = ctx("/items?limit=5");
        assert_eq!(c.path(), "/items");
        assert_eq!(c.remaining(), "/items");
        assert_eq!(c.query().get_str("limit"), Some("5"));
    }

    #[test]
    fn test_consume_advances_cursor() {
        let c = ctx("/user/42/name").consume(8);
        assert_eq!(c.remaining(), "/name");
        assert_eq!(c.consumed(), "/user/42");
        let c = c.consume(100);
        assert_eq!(c.remaining(), "");
    }

    #[test]
    fn test_with_params_merges() {
        let first = Record::from_pairs([("org", "acme"), ("id", "1")]).unwrap();
        let second = Record::from_pairs([("id", "42")]).unwrap();
        let c = ctx("/").with_params(&first).with_params(&second);
        assert_eq!(c.params().get_str("id"), Some("42"));
        assert_eq!(c.params().get_str("org"), Some("acme"));
    }

    #[test]
    fn test_mixins_replace_by_name() {
        let a = Record::from_pairs([("x", "1")]).unwrap();
        let b = Record::from_pairs([("x", "2")]).unwrap();
        let c = ctx("/")
            .with_mixin("zeta", a.clone())
            .with_mixin(COOKIES_MIXIN, a)
            .with_mixin("cookies", b);
        assert_eq!(c.cookies().and_then(|r| r.get_str("x")), Some("2"));
        assert!(c.mixin("zeta").is_some());
        assert!(c.mixin("missing").is_none());
    }

    #[test]
    fn test_from_http_request_keeps_query() {
        let req = http::Request::builder()
            .method(Method::POST)
            .uri("http://localhost/a/b?x=1")
            .header("x-test", "yes")
            .body(b"{}".to_vec())
            .unwrap();
        let decoded = DecodedRequest::from(req);
        assert_eq!(decoded.method, Method::POST);
        assert_eq!(decoded.target, "/a/b?x=1");
        assert_eq!(decoded.body, b"{}");
        assert_eq!(decoded.headers.get("x-test").unwrap(), "yes");
    }

    #[test]
    fn test_body_as_requires_structured_body() {
        let c = ctx("/");
        assert!(c.body().as_bytes().is_some());
        assert!(c.body_as::<serde_json::Value>().is_err());
    }
}
