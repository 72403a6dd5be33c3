//! httpserv - minimal static-file HTTP server
//!
//! Serves `GET` and `HEAD` for files beneath a resource root, one request
//! per connection.

pub mod config;
pub mod http;
pub mod resource;
pub mod server;
