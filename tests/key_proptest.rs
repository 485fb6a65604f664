//! Property-based coverage of the key codec's round-trip invariant
//! (I1-I3 in `SPEC_FULL.md` §3): any valid component survives an
//! encode/decode cycle with its logical identity intact.

use proptest::prelude::*;
use rangegraph::key::{decode_edge_key, encode_edge_key, encode_node_key, NodeKey, Tag};

/// ASCII alphanumerics only: excludes the two reserved separators by
/// construction rather than filtering them out after the fact.
fn component() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9]{1,16}".prop_map(String::from)
}

proptest! {
    #[test]
    fn node_key_encode_decode_round_trips(node_type in component(), id in component()) {
        let key = encode_node_key(&node_type, &id).unwrap();
        let parsed = NodeKey::parse(&key).unwrap();
        prop_assert_eq!(parsed.node_type, node_type);
        prop_assert_eq!(parsed.id, id);
    }

    #[test]
    fn forward_edge_round_trips_to_the_same_logical_triple(
        source_type in component(), source_id in component(),
        edge_type in component(),
        target_type in component(), target_id in component(),
    ) {
        let source = format!("{source_type}_{source_id}");
        let target = format!("{target_type}_{target_id}");
        let key = encode_edge_key(Tag::Forward, &source, &edge_type, &target).unwrap();
        let decoded = decode_edge_key(&key).unwrap();
        prop_assert_eq!(decoded.edge_type, edge_type);
        prop_assert_eq!(decoded.source.encode(), source);
        prop_assert_eq!(decoded.target.encode(), target);
    }

    #[test]
    fn reverse_edge_round_trips_to_the_same_logical_triple(
        source_type in component(), source_id in component(),
        edge_type in component(),
        target_type in component(), target_id in component(),
    ) {
        let source = format!("{source_type}_{source_id}");
        let target = format!("{target_type}_{target_id}");
        let key = encode_edge_key(Tag::Reverse, &source, &edge_type, &target).unwrap();
        let decoded = decode_edge_key(&key).unwrap();
        prop_assert_eq!(decoded.edge_type, edge_type);
        prop_assert_eq!(decoded.source.encode(), source);
        prop_assert_eq!(decoded.target.encode(), target);
    }
}
