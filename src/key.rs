//! Key-space encoding: the central invariant of the whole system.
//!
//! Every node and edge is mapped onto a single flat, byte-ordered
//! keyspace so that every traversal step reduces to a prefix scan. See
//! the module-level invariants (I1-I4) in `SPEC_FULL.md` §3.
//!
//! ```text
//! node            T_I
//! edge forward    1 T_I(source) / E / T_I(target)
//! edge reverse    2 T_I(target) / E / T_I(source)
//! ```

use crate::error::{GraphError, Result};

pub const FORWARD_TAG: u8 = b'1';
pub const REVERSE_TAG: u8 = b'2';
pub const NODE_SEP: char = '_';
pub const PATH_SEP: char = '/';

/// Which half of an edge pair a key belongs to, or neither (a node key).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    None,
    Forward,
    Reverse,
}

pub fn tag_of(key: &str) -> Tag {
    match key.as_bytes().first() {
        Some(&b) if b == FORWARD_TAG => Tag::Forward,
        Some(&b) if b == REVERSE_TAG => Tag::Reverse,
        _ => Tag::None,
    }
}

/// Rejects type/id/edge-type components that would corrupt the keyspace.
/// The source system this crate was grounded on never validated this;
/// `rangegraph` rejects it at put time instead (I4).
pub fn validate_component(what: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(GraphError::validation(format!("{what} must not be empty")));
    }
    if value.contains(NODE_SEP) || value.contains(PATH_SEP) {
        return Err(GraphError::validation(format!(
            "{what} must not contain '{NODE_SEP}' or '{PATH_SEP}'"
        )));
    }
    if !value.is_ascii() {
        return Err(GraphError::validation(format!("{what} must be 7-bit ASCII")));
    }
    Ok(())
}

/// A parsed `"T_I"` node key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeKey {
    pub node_type: String,
    pub id: String,
}

impl NodeKey {
    pub fn new(node_type: impl Into<String>, id: impl Into<String>) -> Result<Self> {
        let node_type = node_type.into();
        let id = id.into();
        validate_component("node type", &node_type)?;
        validate_component("node id", &id)?;
        Ok(NodeKey { node_type, id })
    }

    pub fn encode(&self) -> String {
        format!("{}{}{}", self.node_type, NODE_SEP, self.id)
    }

    /// Parses a bare `"T_I"` node key (no tag byte).
    pub fn parse(key: &str) -> Result<Self> {
        let mut parts = key.splitn(2, NODE_SEP);
        let node_type = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| GraphError::parse(key))?;
        let id = parts.next().filter(|s| !s.is_empty()).ok_or_else(|| GraphError::parse(key))?;
        Ok(NodeKey {
            node_type: node_type.to_string(),
            id: id.to_string(),
        })
    }
}

pub fn encode_node_key(node_type: &str, id: &str) -> Result<String> {
    Ok(NodeKey::new(node_type, id)?.encode())
}

fn tag_char(tag: Tag) -> Result<char> {
    match tag {
        Tag::Forward => Ok(FORWARD_TAG as char),
        Tag::Reverse => Ok(REVERSE_TAG as char),
        Tag::None => Err(GraphError::validation("edge key requires forward or reverse tag")),
    }
}

/// Encodes a forward or reverse edge key from its logical (source, type,
/// target) triple. A `Tag::Forward` key is `1∥source∥/∥type∥/∥target`; a
/// `Tag::Reverse` key swaps source and target: `2∥target∥/∥type∥/∥source`.
/// Callers pass the two endpoints in logical (source, target) order
/// regardless of which tag they want — this function performs the swap.
pub fn encode_edge_key(tag: Tag, source: &str, edge_type: &str, target: &str) -> Result<String> {
    validate_component("edge type", edge_type)?;
    let source = NodeKey::parse(source)?;
    let target = NodeKey::parse(target)?;
    let (own, other) = match tag {
        Tag::Forward => (&source, &target),
        Tag::Reverse => (&target, &source),
        Tag::None => return Err(GraphError::validation("edge key requires forward or reverse tag")),
    };
    Ok(format!(
        "{}{}{}{}{}{}",
        tag_char(tag)?,
        own.encode(),
        PATH_SEP,
        edge_type,
        PATH_SEP,
        other.encode(),
    ))
}

/// The logical (source, type, target) triple reconstructed from an edge
/// key, independent of whether the key itself was stored forward or
/// reverse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedEdge {
    pub edge_type: String,
    pub source: NodeKey,
    pub target: NodeKey,
}

/// Decodes an edge key (forward or reverse) back into its logical
/// (source, type, target) triple (I3).
pub fn decode_edge_key(key: &str) -> Result<DecodedEdge> {
    let tag = tag_of(key);
    if tag == Tag::None {
        return Err(GraphError::parse(key));
    }
    let rest = &key[1..];
    let mut parts = rest.splitn(3, PATH_SEP);
    let first = parts.next().ok_or_else(|| GraphError::parse(key))?;
    let edge_type = parts.next().ok_or_else(|| GraphError::parse(key))?;
    let second = parts.next().ok_or_else(|| GraphError::parse(key))?;

    let first = NodeKey::parse(first)?;
    let second = NodeKey::parse(second)?;

    let (source, target) = match tag {
        Tag::Forward => (first, second),
        Tag::Reverse => (second, first),
        Tag::None => unreachable!(),
    };

    Ok(DecodedEdge {
        edge_type: edge_type.to_string(),
        source,
        target,
    })
}

/// A scan direction, as requested by a traversal path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Out,
    In,
    Both,
}

/// One prefix scan a traversal step needs to issue, tagged with the scan
/// direction it belongs to (used by the `Both` fan-in merge in the
/// pipeline to know which side of an edge key it is reading).
#[derive(Debug, Clone)]
pub struct ScanSpec {
    pub tag: Tag,
    pub prefix: String,
}

/// Computes the prefix scan(s) a traversal step must issue to expand from
/// a concrete node of type/id, for the given direction and edge-type
/// filter. Shared between the root expansion stage (operating on the
/// root step's own type/id) and the worker-pool expansion stage
/// (operating on each incoming node), per SPEC_FULL.md §4.4.
pub fn expansion_scans(node_type: &str, id: &str, direction: Direction, edge_types: &[String]) -> Result<Vec<ScanSpec>> {
    let node = NodeKey::new(node_type, id)?;
    let tags: &[Tag] = match direction {
        Direction::Out => &[Tag::Forward],
        Direction::In => &[Tag::Reverse],
        Direction::Both => &[Tag::Forward, Tag::Reverse],
    };

    let mut specs = Vec::new();
    for &tag in tags {
        let tag_char = tag_char(tag)?;
        if edge_types.is_empty() {
            specs.push(ScanSpec {
                tag,
                prefix: format!("{}{}{}", tag_char, node.encode(), PATH_SEP),
            });
        } else {
            for edge_type in edge_types {
                validate_component("edge type", edge_type)?;
                specs.push(ScanSpec {
                    tag,
                    prefix: format!("{}{}{}{}{}", tag_char, node.encode(), PATH_SEP, edge_type, PATH_SEP),
                });
            }
        }
    }
    Ok(specs)
}

/// The broad scan used at the root step when a node type is known but no
/// id is pinned: `prefix(dirTag ∥ "T_")`, ignoring edge-type splitting
/// (deferred to Stage B).
pub fn broad_expansion_scans(node_type: &str, direction: Direction) -> Vec<ScanSpec> {
    let tags: &[Tag] = match direction {
        Direction::Out => &[Tag::Forward],
        Direction::In => &[Tag::Reverse],
        Direction::Both => &[Tag::Forward, Tag::Reverse],
    };
    tags.iter()
        .map(|&tag| ScanSpec {
            tag,
            prefix: format!("{}{}{}", tag_char(tag).expect("tag is never None here"), node_type, NODE_SEP),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_key_round_trips() {
        let key = encode_node_key("user", "42").unwrap();
        assert_eq!(key, "user_42");
        let parsed = NodeKey::parse(&key).unwrap();
        assert_eq!(parsed.node_type, "user");
        assert_eq!(parsed.id, "42");
        assert_eq!(parsed.encode(), key);
    }

    #[test]
    fn forward_edge_key_round_trips() {
        let key = encode_edge_key(Tag::Forward, "user_main", "follows", "user_1").unwrap();
        assert_eq!(key, "1user_main/follows/user_1");
        let decoded = decode_edge_key(&key).unwrap();
        assert_eq!(decoded.edge_type, "follows");
        assert_eq!(decoded.source.encode(), "user_main");
        assert_eq!(decoded.target.encode(), "user_1");
    }

    #[test]
    fn reverse_edge_key_round_trips_to_same_logical_triple() {
        let key = encode_edge_key(Tag::Reverse, "user_main", "follows", "user_1").unwrap();
        assert_eq!(key, "2user_1/follows/user_main");
        let decoded = decode_edge_key(&key).unwrap();
        assert_eq!(decoded.edge_type, "follows");
        assert_eq!(decoded.source.encode(), "user_main");
        assert_eq!(decoded.target.encode(), "user_1");
    }

    #[test]
    fn tag_of_distinguishes_node_and_edge_keys() {
        assert_eq!(tag_of("user_42"), Tag::None);
        assert_eq!(tag_of("1user_main/follows/user_1"), Tag::Forward);
        assert_eq!(tag_of("2user_1/follows/user_main"), Tag::Reverse);
    }

    #[test]
    fn rejects_reserved_separators() {
        assert!(NodeKey::new("us_er", "1").is_err());
        assert!(NodeKey::new("user", "1/2").is_err());
        assert!(encode_edge_key(Tag::Forward, "user_1", "fol/lows", "user_2").is_err());
    }

    #[test]
    fn expansion_scans_cover_direction_and_edge_types() {
        let specs = expansion_scans("user", "1", Direction::Both, &["follows".into()]).unwrap();
        assert_eq!(specs.len(), 2);
        assert!(specs.iter().any(|s| s.prefix == "1user_1/follows/"));
        assert!(specs.iter().any(|s| s.prefix == "2user_1/follows/"));
    }

    #[test]
    fn expansion_scans_with_no_edge_types_scan_one_level() {
        let specs = expansion_scans("user", "1", Direction::Out, &[]).unwrap();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].prefix, "1user_1/");
    }
}
