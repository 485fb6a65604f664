//! `rangegraph`: a small property graph database built on an ordered
//! key-value keyspace, with a staged concurrent traversal pipeline.
//!
//! Every node and edge is mapped onto a single flat, byte-ordered
//! keyspace (see [`key`]) so that every traversal reduces to a bounded
//! prefix scan against an [`store::OrderedStore`]. [`graph::Graph`] is
//! the typed facade most callers use; [`traversal::Traversal`] builds
//! declarative multi-hop queries that run through the [`pipeline`]
//! engine.

pub mod config;
pub mod error;
pub mod graph;
pub mod http;
pub mod key;
pub mod logging;
pub mod model;
mod pipeline;
pub mod resource_id;
pub mod store;
pub mod traversal;

pub use error::{GraphError, Result};
pub use graph::Graph;
pub use model::{Body, Edge, Node, Object};
pub use traversal::Traversal;
