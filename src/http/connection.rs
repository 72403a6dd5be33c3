use std::sync::Arc;

use anyhow::Context;
use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::http::parser::{parse_request_line, read_request_line};
use crate::http::request::{Method, RequestLine};
use crate::http::response::Response;
use crate::http::writer::ResponseWriter;
use crate::server::context::ServerContext;

/// One accepted client, handled start to finish.
///
/// The connection owns its stream. `run` shuts it down on every normal
/// exit; if the task unwinds instead, dropping the `Connection` closes it.
pub struct Connection<S> {
    stream: S,
    port: u16,
    ctx: Arc<ServerContext>,
    state: ConnectionState,
    // Declared last so it drops after the stream.
    _close_log: CloseLog,
}

pub enum ConnectionState {
    Reading,
    Parsed(Bytes),
    Dispatching(RequestLine),
    Responding(ResponseWriter),
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, port: u16, ctx: Arc<ServerContext>) -> Self {
        Self {
            stream,
            port,
            ctx,
            state: ConnectionState::Reading,
            _close_log: CloseLog(port),
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Drives the state machine to `Closed`, then shuts the stream down.
    ///
    /// I/O failures are returned after the stream is closed. A malformed
    /// request line is not an error: it just closes without a response.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let result = self.drive().await;
        self.state = ConnectionState::Closed;

        if let Err(e) = self.stream.shutdown().await {
            tracing::debug!(port = self.port, error = %e, "Shutdown failed");
        }

        result
    }

    async fn drive(&mut self) -> anyhow::Result<()> {
        loop {
            let state = std::mem::replace(&mut self.state, ConnectionState::Closed);

            self.state = match state {
                ConnectionState::Reading => {
                    let limits = self.ctx.limits;
                    let line = read_request_line(
                        &mut self.stream,
                        limits.read_chunk_size,
                        limits.max_request_line,
                    )
                    .await
                    .context("request read failed")?;

                    tracing::info!(
                        port = self.port,
                        line = %String::from_utf8_lossy(&line),
                        "Request line"
                    );
                    ConnectionState::Parsed(line)
                }

                ConnectionState::Parsed(line) => match parse_request_line(&line) {
                    Ok(req) => ConnectionState::Dispatching(req),
                    Err(e) => {
                        tracing::warn!(
                            port = self.port,
                            line = %String::from_utf8_lossy(&line),
                            "{}",
                            e
                        );
                        ConnectionState::Closed
                    }
                },

                ConnectionState::Dispatching(req) => {
                    tracing::info!(
                        port = self.port,
                        method = %req.method,
                        uri = %req.uri_lossy(),
                        version = %req.version_lossy(),
                        "Dispatching request"
                    );
                    let response = dispatch(&self.ctx, &req).await;
                    ConnectionState::Responding(ResponseWriter::new(response))
                }

                ConnectionState::Responding(mut writer) => {
                    let sent = writer.write_to_stream(&mut self.stream).await;
                    let n = sent.with_context(|| {
                        format!("sending response failed after {} bytes", writer.written())
                    })?;

                    tracing::info!(port = self.port, bytes = n, "Sent response");
                    // Releases the body file, if any
                    drop(writer);
                    ConnectionState::Closed
                }

                ConnectionState::Closed => {
                    break;
                }
            };
        }

        Ok(())
    }
}

/// Chooses the response for a parsed request line.
pub async fn dispatch(ctx: &ServerContext, req: &RequestLine) -> Response {
    match &req.method {
        Method::GET => Response::from_resolution(ctx.resolver.resolve(&req.uri).await),
        Method::HEAD => Response::from_resolution(ctx.resolver.resolve(&req.uri).await).without_body(),
        Method::Other(method) => {
            tracing::debug!(method = %method, "Unsupported method");
            Response::unsupported_method()
        }
    }
}

struct CloseLog(u16);

impl Drop for CloseLog {
    fn drop(&mut self) {
        tracing::info!(port = self.0, "Closed client connection");
    }
}
