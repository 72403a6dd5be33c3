use crate::config::{Config, Limits};
use crate::resource::{AliasTable, Resolver};

/// Read-only state shared by all connection tasks.
///
/// Built once at startup and passed around behind an `Arc`; nothing in here
/// is mutated afterwards.
#[derive(Debug, Clone)]
pub struct ServerContext {
    pub resolver: Resolver,
    pub limits: Limits,
}

impl ServerContext {
    pub fn new(resolver: Resolver, limits: Limits) -> Self {
        Self { resolver, limits }
    }

    pub fn from_config(cfg: &Config) -> Self {
        let aliases = AliasTable::new(cfg.settings.aliases.clone());
        Self::new(Resolver::new(cfg.root.clone(), aliases), cfg.limits())
    }
}
