use bytes::{BufMut, Bytes, BytesMut};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, Take};

use crate::resource::{Resolution, Resource};

pub const HTTP_VERSION: &str = "HTTP/1.1";
const CRLF: &str = "\r\n";

/// Status codes the server can emit.
///
/// This is the whole status table: anything else is degraded to
/// `InternalServerError` by [`status_line`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 404 Not Found
    NotFound,
    /// 500 Internal Server Error
    InternalServerError,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// ```
    /// # use httpserv::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::NotFound => 404,
            StatusCode::InternalServerError => 500,
        }
    }

    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::NotFound => "Not Found",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }

    pub fn from_u16(code: u16) -> Option<Self> {
        match code {
            200 => Some(StatusCode::Ok),
            404 => Some(StatusCode::NotFound),
            500 => Some(StatusCode::InternalServerError),
            _ => None,
        }
    }
}

/// Formats `"HTTP/1.1 <code> <reason>\r\n"`.
///
/// Codes outside the table are logged and answered as 500.
pub fn status_line(code: u16) -> String {
    let status = StatusCode::from_u16(code).unwrap_or_else(|| {
        tracing::error!(code, "Unsupported status code requested");
        StatusCode::InternalServerError
    });

    format!(
        "{} {} {}{}",
        HTTP_VERSION,
        status.as_u16(),
        status.reason_phrase(),
        CRLF
    )
}

/// A response ready to be written: a fully buffered head and an optional
/// file body.
///
/// The body is limited to the length advertised in the head, so a file that
/// grows while it is being sent cannot overrun `Content-Length`.
#[derive(Debug)]
pub struct Response {
    pub head: Bytes,
    pub body: Option<Take<File>>,
}

impl Response {
    /// Builds the preamble for `code`.
    ///
    /// A 200 with a resource gets `Content-Length` and the blank line, and
    /// the resource's file becomes the body. Every other combination is the
    /// bare status line with no body; a resource passed with a non-200 code
    /// is dropped, closing its file.
    pub fn build(code: u16, resource: Option<Resource>) -> Self {
        let mut head = BytesMut::new();
        head.put_slice(status_line(code).as_bytes());

        match resource {
            Some(resource) if code == StatusCode::Ok.as_u16() => {
                head.put_slice(format!("Content-Length: {}{}{}", resource.size, CRLF, CRLF).as_bytes());
                Response {
                    head: head.freeze(),
                    body: Some(resource.file.take(resource.size)),
                }
            }
            _ => Response {
                head: head.freeze(),
                body: None,
            },
        }
    }

    pub fn from_resolution(resolution: Resolution) -> Self {
        match resolution {
            Resolution::Found(resource) => Self::build(StatusCode::Ok.as_u16(), Some(resource)),
            Resolution::NotFound => Self::not_found(),
        }
    }

    /// `"HTTP/1.1 404 Not Found\r\n"` and nothing else.
    pub fn not_found() -> Self {
        Self::build(StatusCode::NotFound.as_u16(), None)
    }

    /// The 404 status line followed by a blank line.
    pub fn unsupported_method() -> Self {
        let mut head = BytesMut::from(status_line(StatusCode::NotFound.as_u16()).as_bytes());
        head.put_slice(CRLF.as_bytes());
        Response {
            head: head.freeze(),
            body: None,
        }
    }

    /// Drops the body, keeping the head (and its `Content-Length`) intact.
    pub fn without_body(mut self) -> Self {
        self.body = None;
        self
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }
}
