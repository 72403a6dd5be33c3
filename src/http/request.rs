use std::borrow::Cow;
use std::fmt;

/// Request methods the server distinguishes.
///
/// Only `GET` and `HEAD` have behavior; every other token is carried as
/// `Other` and answered with the fixed unsupported-method response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// HEAD - Like GET but without the response body
    HEAD,
    /// Anything else, kept for logging
    Other(String),
}

impl Method {
    /// Classifies a method token. Matching is case-sensitive.
    ///
    /// ```
    /// # use httpserv::http::request::Method;
    /// assert_eq!(Method::parse(b"GET"), Method::GET);
    /// assert_eq!(Method::parse(b"get"), Method::Other("get".to_string()));
    /// ```
    pub fn parse(token: &[u8]) -> Self {
        match token {
            b"GET" => Method::GET,
            b"HEAD" => Method::HEAD,
            other => Method::Other(String::from_utf8_lossy(other).into_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::Other(s) => s,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The parsed first line of a request.
///
/// The target is kept as raw bytes so it reaches the filesystem exactly as
/// the client sent it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: Method,
    /// Request target, untouched (query strings included)
    pub uri: Vec<u8>,
    /// Protocol token, if the client sent one. Logged, never checked.
    pub version: Option<Vec<u8>>,
}

impl RequestLine {
    /// The target for log output; invalid UTF-8 is replaced.
    pub fn uri_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.uri)
    }

    pub fn version_lossy(&self) -> Cow<'_, str> {
        match &self.version {
            Some(v) => String::from_utf8_lossy(v),
            None => Cow::Borrowed("-"),
        }
    }
}
