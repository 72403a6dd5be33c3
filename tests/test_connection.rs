//! End-to-end tests over loopback TCP and in-memory streams

use httpserv::config::Limits;
use httpserv::http::connection::{Connection, ConnectionState};
use httpserv::resource::{AliasTable, Resolver};
use httpserv::server::context::ServerContext;
use httpserv::server::listener::{bind, serve, spawn_connection};
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::net::TcpStream;

fn context(root: &std::path::Path, limits: Limits) -> Arc<ServerContext> {
    Arc::new(ServerContext::new(
        Resolver::new(root, AliasTable::from([("/", "/index.html")])),
        limits,
    ))
}

/// Starts a server on an ephemeral loopback port.
async fn start_server(root: &std::path::Path, limits: Limits) -> SocketAddr {
    let listener = bind("127.0.0.1:0".parse().unwrap(), limits.backlog).unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, context(root, limits)));
    addr
}

async fn exchange(addr: SocketAddr, request: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    response
}

fn root_with_index() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "hello world\n").unwrap();
    dir
}

#[tokio::test]
async fn test_get_root_serves_index() {
    let dir = root_with_index();
    let addr = start_server(dir.path(), Limits::default()).await;

    let response = exchange(addr, b"GET / HTTP/1.1\r\n\r\n").await;

    assert_eq!(
        response,
        b"HTTP/1.1 200 OK\r\nContent-Length: 12\r\n\r\nhello world\n"
    );
}

#[tokio::test]
async fn test_get_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let addr = start_server(dir.path(), Limits::default()).await;

    let response = exchange(addr, b"GET /missing.txt HTTP/1.1\r\n\r\n").await;

    assert_eq!(response, b"HTTP/1.1 404 Not Found\r\n");
}

#[tokio::test]
async fn test_head_reports_length_without_body() {
    let dir = root_with_index();
    let addr = start_server(dir.path(), Limits::default()).await;

    let response = exchange(addr, b"HEAD /index.html HTTP/1.1\r\nHost: x\r\n\r\n").await;

    assert_eq!(response, b"HTTP/1.1 200 OK\r\nContent-Length: 12\r\n\r\n");
}

#[tokio::test]
async fn test_head_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let addr = start_server(dir.path(), Limits::default()).await;

    let response = exchange(addr, b"HEAD /nope HTTP/1.1\r\n\r\n").await;

    assert_eq!(response, b"HTTP/1.1 404 Not Found\r\n");
}

#[tokio::test]
async fn test_unsupported_method_ignores_resource() {
    let dir = root_with_index();
    let addr = start_server(dir.path(), Limits::default()).await;

    for method in ["POST", "DELETE", "get"] {
        let request = format!("{} / HTTP/1.1\r\n\r\n", method);
        let response = exchange(addr, request.as_bytes()).await;
        assert_eq!(response, b"HTTP/1.1 404 Not Found\r\n\r\n");
    }
}

#[tokio::test]
async fn test_directory_is_not_found() {
    let dir = root_with_index();
    std::fs::create_dir(dir.path().join("sub")).unwrap();
    let addr = start_server(dir.path(), Limits::default()).await;

    let response = exchange(addr, b"GET /sub HTTP/1.1\r\n\r\n").await;

    assert_eq!(response, b"HTTP/1.1 404 Not Found\r\n");
}

#[tokio::test]
async fn test_malformed_request_line_gets_no_response() {
    let dir = root_with_index();
    let addr = start_server(dir.path(), Limits::default()).await;

    assert!(exchange(addr, b"GET\r\n\r\n").await.is_empty());
    assert!(exchange(addr, b"\r\n").await.is_empty());
}

#[tokio::test]
async fn test_silent_client_gets_no_response() {
    let dir = root_with_index();
    let addr = start_server(dir.path(), Limits::default()).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.shutdown().await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    assert!(response.is_empty());

    // The listener is still serving
    let response = exchange(addr, b"GET / HTTP/1.1\r\n\r\n").await;
    assert!(response.starts_with(b"HTTP/1.1 200 OK\r\n"));
}

#[tokio::test]
async fn test_request_without_terminator_is_served_at_eof() {
    let dir = root_with_index();
    let addr = start_server(dir.path(), Limits::default()).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(b"GET /index.html").await.unwrap();
    stream.shutdown().await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    assert!(response.ends_with(b"\r\n\r\nhello world\n"));
}

#[tokio::test]
async fn test_oversized_request_line_is_dropped() {
    let dir = root_with_index();
    let limits = Limits {
        read_chunk_size: 64,
        max_request_line: 128,
        backlog: 64,
    };
    let addr = start_server(dir.path(), limits).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET /{} HTTP/1.1\r\n\r\n", "a".repeat(256));
    // The server may reset the connection with our bytes still unread
    let _ = stream.write_all(request.as_bytes()).await;

    let mut response = Vec::new();
    let _ = stream.read_to_end(&mut response).await;
    assert!(response.is_empty());
}

#[tokio::test]
async fn test_concurrent_clients() {
    let dir = root_with_index();
    let addr = start_server(dir.path(), Limits::default()).await;

    let clients: Vec<_> = (0..16)
        .map(|_| tokio::spawn(async move { exchange(addr, b"GET / HTTP/1.1\r\n\r\n").await }))
        .collect();

    for client in clients {
        let response = client.await.unwrap();
        assert!(response.ends_with(b"hello world\n"));
    }
}

#[tokio::test]
async fn test_connection_over_duplex_reaches_closed() {
    let dir = root_with_index();
    let ctx = context(dir.path(), Limits::default());
    let (mut client, server) = tokio::io::duplex(1024);

    client.write_all(b"HEAD / HTTP/1.1\r\n\r\n").await.unwrap();

    let mut conn = Connection::new(server, 4000, ctx);
    assert!(matches!(conn.state(), ConnectionState::Reading));
    conn.run().await.unwrap();
    assert!(matches!(conn.state(), ConnectionState::Closed));
    drop(conn);

    let mut response = Vec::new();
    client.read_to_end(&mut response).await.unwrap();
    assert_eq!(response, b"HTTP/1.1 200 OK\r\nContent-Length: 12\r\n\r\n");
}

/// Stream that panics on first read.
struct PanickingStream;

impl AsyncRead for PanickingStream {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        panic!("boom");
    }
}

impl AsyncWrite for PanickingStream {
    fn poll_write(self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

#[tokio::test]
async fn test_panic_in_connection_is_contained() {
    let dir = root_with_index();
    let ctx = context(dir.path(), Limits::default());

    let handle = spawn_connection(PanickingStream, "127.0.0.1:5000".parse().unwrap(), ctx.clone());
    assert!(handle.await.is_ok());

    // Sibling connections are unaffected
    let (mut client, server) = tokio::io::duplex(1024);
    client.write_all(b"GET / HTTP/1.1\r\n\r\n").await.unwrap();
    spawn_connection(server, "127.0.0.1:5001".parse().unwrap(), ctx)
        .await
        .unwrap();

    let mut response = Vec::new();
    client.read_to_end(&mut response).await.unwrap();
    assert!(response.ends_with(b"hello world\n"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_get_serves_non_utf8_file_name() {
    use std::os::unix::ffi::OsStrExt;

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(std::ffi::OsStr::from_bytes(b"\xff.txt")), "raw bytes\n").unwrap();
    let ctx = context(dir.path(), Limits::default());
    let (mut client, server) = tokio::io::duplex(1024);

    client.write_all(b"GET /\xff.txt HTTP/1.1\r\n\r\n").await.unwrap();
    Connection::new(server, 4001, ctx).run().await.unwrap();

    let mut response = Vec::new();
    client.read_to_end(&mut response).await.unwrap();
    assert_eq!(response, b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\nraw bytes\n");
}
