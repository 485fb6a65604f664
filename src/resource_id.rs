//! Resource-id grammar: a single opaque string addressing either a node
//! or an edge, used by the HTTP surface and anywhere a caller wants to
//! name a graph entity without separately carrying type/source/target.
//!
//! ```text
//! node:T_I
//! edge:E.Skey.Tkey
//! ```
//!
//! `Skey`/`Tkey` are themselves `T_I` node keys, so an edge resource id
//! always has exactly two unescaped `.` separators once the `edge:`
//! prefix is stripped.

use crate::error::{GraphError, Result};
use crate::key::NodeKey;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceId {
    Node(NodeKey),
    Edge { edge_type: String, source: NodeKey, target: NodeKey },
}

/// A resource id accepted by a PUT, where a node's `_I` component may be
/// omitted (the caller id-generates or supplies a body-level `id`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutTarget {
    Node { node_type: String, id: Option<String> },
    Edge { edge_type: String, source: NodeKey, target: NodeKey },
}

impl ResourceId {
    pub fn parse(raw: &str) -> Result<Self> {
        if let Some(rest) = raw.strip_prefix("node:") {
            return Ok(ResourceId::Node(NodeKey::parse(rest)?));
        }
        if let Some((edge_type, source, target)) = parse_edge_body(raw)? {
            return Ok(ResourceId::Edge {
                edge_type,
                source: NodeKey::parse(&source)?,
                target: NodeKey::parse(&target)?,
            });
        }
        Err(GraphError::parse(raw))
    }

    /// Like [`Self::parse`], but a `node:` id whose `_I` component is
    /// absent (e.g. `node:user`) parses to `PutTarget::Node` with `id:
    /// None` instead of failing, so the caller can fall back to a
    /// body-supplied `id` or [`crate::graph::Graph::gen_id`].
    pub fn parse_for_put(raw: &str) -> Result<PutTarget> {
        if let Some(rest) = raw.strip_prefix("node:") {
            if rest.is_empty() {
                return Err(GraphError::parse(raw));
            }
            return Ok(match rest.split_once(crate::key::NODE_SEP) {
                Some((node_type, id)) if !node_type.is_empty() && !id.is_empty() => PutTarget::Node {
                    node_type: node_type.to_string(),
                    id: Some(id.to_string()),
                },
                _ => PutTarget::Node {
                    node_type: rest.to_string(),
                    id: None,
                },
            });
        }
        if let Some((edge_type, source, target)) = parse_edge_body(raw)? {
            return Ok(PutTarget::Edge {
                edge_type,
                source: NodeKey::parse(&source)?,
                target: NodeKey::parse(&target)?,
            });
        }
        Err(GraphError::parse(raw))
    }
}

/// Shared `edge:E.Skey.Tkey` splitting for both [`ResourceId::parse`] and
/// [`ResourceId::parse_for_put`]. Returns `None` when `raw` isn't an
/// `edge:` id at all.
fn parse_edge_body(raw: &str) -> Result<Option<(String, String, String)>> {
    let Some(rest) = raw.strip_prefix("edge:") else {
        return Ok(None);
    };
    let mut parts = rest.splitn(3, '.');
    let edge_type = parts.next().filter(|s| !s.is_empty()).ok_or_else(|| GraphError::parse(raw))?;
    let source = parts.next().filter(|s| !s.is_empty()).ok_or_else(|| GraphError::parse(raw))?;
    let target = parts.next().filter(|s| !s.is_empty()).ok_or_else(|| GraphError::parse(raw))?;
    Ok(Some((edge_type.to_string(), source.to_string(), target.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_node_resource_id() {
        let id = ResourceId::parse("node:user_main").unwrap();
        assert_eq!(id, ResourceId::Node(NodeKey::new("user", "main").unwrap()));
    }

    #[test]
    fn parses_edge_resource_id() {
        let id = ResourceId::parse("edge:follows.user_main.user_1").unwrap();
        assert_eq!(
            id,
            ResourceId::Edge {
                edge_type: "follows".into(),
                source: NodeKey::new("user", "main").unwrap(),
                target: NodeKey::new("user", "1").unwrap(),
            }
        );
    }

    #[test]
    fn rejects_unknown_prefix_and_malformed_bodies() {
        assert!(ResourceId::parse("user_main").is_err());
        assert!(ResourceId::parse("edge:follows.user_main").is_err());
        assert!(ResourceId::parse("node:").is_err());
    }

    #[test]
    fn parse_for_put_keeps_a_full_node_id() {
        let target = ResourceId::parse_for_put("node:user_main").unwrap();
        assert_eq!(
            target,
            PutTarget::Node {
                node_type: "user".into(),
                id: Some("main".into()),
            }
        );
    }

    #[test]
    fn parse_for_put_tolerates_a_type_only_node_id() {
        let target = ResourceId::parse_for_put("node:user").unwrap();
        assert_eq!(
            target,
            PutTarget::Node {
                node_type: "user".into(),
                id: None,
            }
        );
    }

    #[test]
    fn parse_for_put_still_requires_an_edge_triple() {
        assert!(ResourceId::parse_for_put("edge:follows.user_main").is_err());
        assert!(ResourceId::parse_for_put("node:").is_err());
    }
}
