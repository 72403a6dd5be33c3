//! HTTP protocol handling.
//!
//! Only the request line is ever read. Each connection carries exactly one
//! request and is closed once the response has been written.
//!
//! # Architecture
//!
//! - **`connection`**: the per-connection state machine
//! - **`parser`**: reads and tokenizes the request line
//! - **`request`**: method and request line types
//! - **`response`**: status table and response preamble
//! - **`writer`**: streams head and body to the client
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Read until "\r\n" or end of stream
//!        └──────┬──────┘
//!               │ Line received
//!               ▼
//!        ┌──────────────────┐
//!        │     Parsed       │ ← Split into method and URI
//!        └──────┬───────────┘
//!               │ At least two tokens
//!               ▼
//!        ┌──────────────────┐
//!        │   Dispatching    │ ← GET / HEAD / anything else
//!        └──────┬───────────┘
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │   Responding     │ ← Head, then body for GET
//!        └──────┬───────────┘
//!               ▼
//!        ┌──────────────────┐
//!        │     Closed       │ ← Also reached from every error
//!        └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use httpserv::config::Limits;
//! use httpserv::http::connection::Connection;
//! use httpserv::resource::{AliasTable, Resolver};
//! use httpserv::server::context::ServerContext;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let ctx = Arc::new(ServerContext::new(
//!         Resolver::new("./res", AliasTable::from([("/", "/index.html")])),
//!         Limits::default(),
//!     ));
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!
//!     loop {
//!         let (socket, addr) = listener.accept().await?;
//!         let ctx = ctx.clone();
//!         tokio::spawn(async move {
//!             let mut conn = Connection::new(socket, addr.port(), ctx);
//!             if let Err(e) = conn.run().await {
//!                 eprintln!("Connection error: {}", e);
//!             }
//!         });
//!     }
//! }
//! ```

pub mod connection;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
