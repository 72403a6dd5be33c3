//! Resource lookup
//!
//! Maps request URIs onto files beneath the resource root. The alias table
//! is applied first, then the URI is appended verbatim to the root path.

pub mod alias;
pub mod resolver;

pub use alias::AliasTable;
pub use resolver::{Resolution, Resolver, Resource};
