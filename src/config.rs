//! Runtime configuration for the `rangegraphd` server.

use std::net::SocketAddr;

/// Which [`crate::store::OrderedStore`] backend to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[clap(rename_all = "lowercase")]
pub enum Backend {
    /// The embedded in-memory reference backend. Data does not survive
    /// a restart.
    Embedded,
    /// The write-batching demo backend, fronting an in-memory sink the
    /// same way a real deployment would front a remote wide-column
    /// store. See `SPEC_FULL.md` §4.2.
    Buffered,
}

/// Server-wide configuration, assembled from CLI flags and/or
/// environment variables by the `rangegraphd` binary.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP surface binds to.
    pub listen_addr: SocketAddr,
    /// Name of the database instance, used for logging/identification.
    pub db_name: String,
    /// Storage backend to open.
    pub backend: Backend,
    /// `tracing` env-filter directive, e.g. `"info"` or `"rangegraph=debug"`.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listen_addr: "0.0.0.0:8231".parse().expect("valid default listen address"),
            db_name: "rangegraph".into(),
            backend: Backend::Embedded,
            log_level: "info".into(),
        }
    }
}
