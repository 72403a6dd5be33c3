use std::fmt;
use std::io;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::http::request::{Method, RequestLine};

const CRLF: &[u8] = b"\r\n";

#[derive(Debug)]
pub enum ReadError {
    /// The peer failed mid-read. A clean end of stream is not an error.
    Io(io::Error),
    /// No terminator within the configured bound.
    LineTooLong { limit: usize },
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadError::Io(_) => f.write_str("connection read error"),
            ReadError::LineTooLong { limit } => {
                write!(f, "request line exceeds {} bytes", limit)
            }
        }
    }
}

impl std::error::Error for ReadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReadError::Io(e) => Some(e),
            ReadError::LineTooLong { .. } => None,
        }
    }
}

impl From<io::Error> for ReadError {
    fn from(e: io::Error) -> Self {
        ReadError::Io(e)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Fewer than two whitespace-separated tokens.
    Malformed,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Malformed => f.write_str("malformed request line"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Reads until the first `\r\n` or end of stream and returns the bytes before
/// the terminator. Whatever follows the terminator is discarded.
///
/// `max_len` bounds the line including its terminator; a peer that sends
/// more without a terminator gets `LineTooLong`.
pub async fn read_request_line<R>(
    reader: &mut R,
    chunk_size: usize,
    max_len: usize,
) -> Result<Bytes, ReadError>
where
    R: AsyncRead + Unpin,
{
    let mut buffer = BytesMut::with_capacity(chunk_size.min(max_len));
    let mut temp = vec![0u8; chunk_size.max(1)];

    let line_end = loop {
        if let Some(pos) = find_line_end(&buffer) {
            if pos + CRLF.len() > max_len {
                return Err(ReadError::LineTooLong { limit: max_len });
            }
            break pos;
        }
        if buffer.len() >= max_len {
            return Err(ReadError::LineTooLong { limit: max_len });
        }

        let n = reader.read(&mut temp).await?;
        if n == 0 {
            // Peer closed: whatever arrived is the line
            break buffer.len();
        }
        buffer.extend_from_slice(&temp[..n]);
    };

    buffer.truncate(line_end);
    Ok(buffer.freeze())
}

/// Splits a request line into method and URI on ASCII whitespace.
///
/// No decoding happens here: the URI bytes are passed through unchanged.
pub fn parse_request_line(line: &[u8]) -> Result<RequestLine, ParseError> {
    let mut parts = line
        .split(|b| b.is_ascii_whitespace())
        .filter(|token| !token.is_empty());

    let method = parts.next().ok_or(ParseError::Malformed)?;
    let uri = parts.next().ok_or(ParseError::Malformed)?;
    let version = parts.next().map(<[u8]>::to_vec);

    Ok(RequestLine {
        method: Method::parse(method),
        uri: uri.to_vec(),
        version,
    })
}

fn find_line_end(buf: &[u8]) -> Option<usize> {
    buf.windows(CRLF.len()).position(|w| w == CRLF)
}
