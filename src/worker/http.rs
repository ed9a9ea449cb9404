//! Request and response values seen by the worker.
//!
//! A [`Response`] body can be read exactly once: the type is deliberately not
//! `Clone`, and reading the body consumes it. Anything that needs two readable
//! copies (the fetch path returns one and caches the other) must call
//! [`Response::duplicate`] as soon as the response arrives.

use std::fmt;
use url::Url;

/// HTTP request method.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Other(String),
}

impl Method {
    /// Parse a method name, case-insensitively.
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "GET" => Method::Get,
            "HEAD" => Method::Head,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "PATCH" => Method::Patch,
            "DELETE" => Method::Delete,
            "OPTIONS" => Method::Options,
            other => Method::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
            Method::Other(name) => name,
        }
    }

    /// Only plain reads go through the cache.
    pub fn is_read(&self) -> bool {
        matches!(self, Method::Get)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Method,
    url: Url,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self { method, url }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::Get, url)
    }

    /// Build a request from a method name and an absolute URL string.
    pub fn parse(method: &str, url: &str) -> Result<Self, url::ParseError> {
        Ok(Self::new(Method::parse(method), Url::parse(url)?))
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Whether the URL can be fetched over the network at all.
    pub fn is_network_scheme(&self) -> bool {
        matches!(self.url.scheme(), "http" | "https")
    }

    /// Normalized cache key for this request.
    pub fn key(&self) -> RequestKey {
        RequestKey::new(self.method.clone(), &self.url)
    }
}

/// Cache key: method plus absolute URL with the fragment removed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestKey {
    method: Method,
    url: Url,
}

impl RequestKey {
    pub fn new(method: Method, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self { method, url }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// Response classification, mirroring the fetch API's `Response.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseKind {
    #[default]
    Basic,
    Cors,
    Opaque,
    /// Network-level error placeholder; never cached.
    Error,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Response {
    status: u16,
    status_text: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    kind: ResponseKind,
}

impl Response {
    pub fn new(status: u16, status_text: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            headers: Vec::new(),
            body: body.into(),
            kind: ResponseKind::Basic,
        }
    }

    /// `200 OK` with the given body and content type.
    pub fn ok(body: impl Into<Vec<u8>>, content_type: &str) -> Self {
        Self::new(200, "OK", body).with_header("Content-Type", content_type)
    }

    /// Equivalent of `Response.error()`: status 0, kind `Error`, empty body.
    pub fn network_error() -> Self {
        Self::new(0, "", Vec::new()).with_kind(ResponseKind::Error)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_kind(mut self, kind: ResponseKind) -> Self {
        self.kind = kind;
        self
    }

    pub(crate) fn from_parts(
        status: u16,
        status_text: String,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    ) -> Self {
        Self {
            status,
            status_text,
            headers,
            body,
            kind: ResponseKind::Basic,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// `true` for any 2xx status.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn kind(&self) -> ResponseKind {
        self.kind
    }

    /// First header value with this name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body_len(&self) -> usize {
        self.body.len()
    }

    /// Split into two independently readable copies.
    pub fn duplicate(self) -> (Response, Response) {
        let copy = Response {
            status: self.status,
            status_text: self.status_text.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
            kind: self.kind,
        };
        (self, copy)
    }

    /// Consume the response and return its body.
    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    /// Consume the response and return its body as text (lossy UTF-8).
    pub fn into_text(self) -> String {
        String::from_utf8(self.body)
            .unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned())
    }

    pub(crate) fn into_parts(self) -> (u16, String, Vec<(String, String)>, Vec<u8>) {
        (self.status, self.status_text, self.headers, self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_parse_is_case_insensitive() {
        assert_eq!(Method::parse("get"), Method::Get);
        assert_eq!(Method::parse("Post"), Method::Post);
        assert_eq!(Method::parse("propfind"), Method::Other("PROPFIND".into()));
    }

    #[test]
    fn only_get_is_a_read() {
        assert!(Method::Get.is_read());
        assert!(!Method::Head.is_read());
        assert!(!Method::Post.is_read());
        assert!(!Method::Other("GET2".into()).is_read());
    }

    #[test]
    fn network_schemes() {
        assert!(Request::parse("GET", "http://a.test/").unwrap().is_network_scheme());
        assert!(Request::parse("GET", "https://a.test/").unwrap().is_network_scheme());
        assert!(!Request::parse("GET", "data:text/plain,hi").unwrap().is_network_scheme());
        assert!(!Request::parse("GET", "chrome-extension://abc/x.js").unwrap().is_network_scheme());
    }

    #[test]
    fn key_drops_fragment_but_keeps_query() {
        let a = Request::parse("GET", "https://a.test/page?x=1#top").unwrap();
        let b = Request::parse("GET", "https://a.test/page?x=1").unwrap();
        assert_eq!(a.key(), b.key());
        assert_eq!(a.key().url().query(), Some("x=1"));
    }

    #[test]
    fn key_includes_method() {
        let get = Request::parse("GET", "https://a.test/").unwrap();
        let head = Request::parse("HEAD", "https://a.test/").unwrap();
        assert_ne!(get.key(), head.key());
        assert_eq!(get.key().to_string(), "GET https://a.test/");
    }

    #[test]
    fn duplicate_yields_identical_independent_copies() {
        let response = Response::ok("hello", "text/plain");
        let (a, b) = response.duplicate();
        assert_eq!(a, b);
        assert_eq!(a.into_body(), b"hello");
        assert_eq!(b.into_text(), "hello");
    }

    #[test]
    fn header_lookup_ignores_case() {
        let response = Response::ok("x", "text/css");
        assert_eq!(response.header("content-type"), Some("text/css"));
        assert_eq!(response.header("etag"), None);
    }

    #[test]
    fn network_error_is_not_ok() {
        let response = Response::network_error();
        assert_eq!(response.kind(), ResponseKind::Error);
        assert!(!response.is_ok());
    }
}
