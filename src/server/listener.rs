use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpSocket};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::Config;
use crate::http::connection::Connection;
use crate::server::context::ServerContext;

/// Binds the configured port and serves until the task is dropped.
pub async fn run(cfg: &Config) -> anyhow::Result<()> {
    let ctx = Arc::new(ServerContext::from_config(cfg));
    let listener = bind(cfg.listen_addr(), ctx.limits.backlog)?;
    info!(port = cfg.port, root = %cfg.root.display(), "httpserv is listening");

    serve(listener, ctx).await
}

/// Creates an IPv4 listening socket with `SO_REUSEADDR` set.
pub fn bind(addr: SocketAddr, backlog: u32) -> anyhow::Result<TcpListener> {
    let socket = TcpSocket::new_v4().context("cannot create socket")?;
    socket
        .set_reuseaddr(true)
        .context("cannot set SO_REUSEADDR")?;
    socket
        .bind(addr)
        .with_context(|| format!("cannot bind socket to {}", addr))?;
    let listener = socket
        .listen(backlog)
        .with_context(|| format!("cannot listen on {}", addr))?;

    Ok(listener)
}

/// Accept loop. Accept errors are logged and never end the loop.
pub async fn serve(listener: TcpListener, ctx: Arc<ServerContext>) -> anyhow::Result<()> {
    loop {
        match listener.accept().await {
            Ok((socket, peer)) => {
                info!(port = peer.port(), "Accepted client");
                spawn_connection(socket, peer, ctx.clone());
            }
            Err(e) => {
                error!(error = %e, "Unable to accept connection");
            }
        }
    }
}

/// Runs one connection on its own task.
///
/// The returned handle belongs to a supervisor task that waits on the
/// connection task and logs a panic if there was one, so a fault in one
/// connection never reaches the listener or its siblings.
pub fn spawn_connection<S>(stream: S, peer: SocketAddr, ctx: Arc<ServerContext>) -> JoinHandle<()>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let port = peer.port();

    let task = tokio::spawn(async move {
        let mut conn = Connection::new(stream, port, ctx);
        if let Err(e) = conn.run().await {
            error!(port, "Connection error: {:#}", e);
        }
    });

    tokio::spawn(async move {
        if let Err(e) = task.await {
            if e.is_panic() {
                error!(port, "Panic in client handler: {}", panic_message(e.into_panic()));
            } else {
                error!(port, "Client handler cancelled");
            }
        }
    })
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
