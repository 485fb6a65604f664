//! Data models for graph entities.
//!
//! This module defines the core data structures used to represent nodes,
//! edges, and the tagged [`Object`] that the store actually deals in.
//!
//! # Key Types
//!
//! - [`Node`] - a typed, identified vertex with a JSON body.
//! - [`Edge`] - a directed, typed relationship between two node keys.
//! - [`Object`] - the tagged union read back from the store; decodes
//!   itself into a node or edge on demand via [`crate::key`].
//! - [`Body`] - the JSON mapping type used for node/edge payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::key;

/// Arbitrary JSON-compatible mapping stored alongside a node or edge.
/// Never interpreted by the engine itself, except through user-supplied
/// predicates.
pub type Body = serde_json::Map<String, Value>;

/// A typed, identified vertex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(rename = "type")]
    pub node_type: String,
    pub id: String,
    pub body: Body,
}

impl Node {
    pub fn new(node_type: impl Into<String>, id: impl Into<String>, body: Body) -> Self {
        Node {
            node_type: node_type.into(),
            id: id.into(),
            body,
        }
    }

    /// The canonical store key `"T_I"` for this node.
    pub fn key(&self) -> Result<String> {
        key::encode_node_key(&self.node_type, &self.id)
    }

    pub fn resource_id(&self) -> Result<String> {
        Ok(format!("node:{}", self.key()?))
    }
}

/// A directed, typed relationship between two node keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    #[serde(rename = "type")]
    pub edge_type: String,
    pub source: String,
    pub target: String,
    pub body: Body,
}

impl Edge {
    pub fn new(edge_type: impl Into<String>, source: impl Into<String>, target: impl Into<String>, body: Body) -> Self {
        Edge {
            edge_type: edge_type.into(),
            source: source.into(),
            target: target.into(),
            body,
        }
    }

    pub fn forward_key(&self) -> Result<String> {
        key::encode_edge_key(key::Tag::Forward, &self.source, &self.edge_type, &self.target)
    }

    pub fn reverse_key(&self) -> Result<String> {
        key::encode_edge_key(key::Tag::Reverse, &self.source, &self.edge_type, &self.target)
    }

    pub fn resource_id(&self) -> String {
        format!("edge:{}.{}.{}", self.edge_type, self.source, self.target)
    }
}

/// The tagged union actually stored and streamed by an
/// [`crate::store::OrderedStore`]: a raw key plus an optional body.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    pub key: String,
    pub val: Option<Body>,
}

impl Object {
    pub fn new(key: impl Into<String>, val: Option<Body>) -> Self {
        Object { key: key.into(), val }
    }

    pub fn is_node(&self) -> bool {
        matches!(key::tag_of(&self.key), key::Tag::None)
    }

    pub fn is_edge(&self) -> bool {
        !self.is_node()
    }

    /// Decodes this object as a node. Only meaningful when [`Self::is_node`].
    pub fn as_node(&self) -> Result<Node> {
        let parsed = key::NodeKey::parse(&self.key)?;
        Ok(Node::new(parsed.node_type, parsed.id, self.val.clone().unwrap_or_default()))
    }

    /// Decodes this object as an edge. Only meaningful when [`Self::is_edge`].
    pub fn as_edge(&self) -> Result<Edge> {
        let decoded = key::decode_edge_key(&self.key)?;
        Ok(Edge::new(
            decoded.edge_type,
            decoded.source.encode(),
            decoded.target.encode(),
            self.val.clone().unwrap_or_default(),
        ))
    }
}
