//! TCP listener and the shared, read-only state handed to every connection.

pub mod context;
pub mod listener;
