//! Stage B: projection & filtering. Consumes raw edge objects from Stage
//! A and emits the other endpoint's node handle, applying the path's
//! edge-type filter and predicate.

use tokio::sync::mpsc;

use crate::key::Tag;
use crate::model::Object;
use crate::store::{ObjectStream, SCAN_CHANNEL_CAPACITY};
use crate::traversal::PathPlan;

pub(crate) fn stage(mut input: ObjectStream, path: &PathPlan) -> ObjectStream {
    let (tx, rx) = mpsc::channel(SCAN_CHANNEL_CAPACITY);
    let edge_types = path.edge_types.clone();
    let predicate = path.predicate.clone();
    tokio::spawn(async move {
        while let Some(obj) = input.recv().await {
            if obj.is_node() {
                // Only reachable in the degenerate case where a prior
                // stage already emitted a node object (not expected on
                // the standard multi-hop path, kept defensive since the
                // source system forwards these unchanged too).
                if tx.send(obj).await.is_err() {
                    break;
                }
                continue;
            }

            let edge = match obj.as_edge() {
                Ok(edge) => edge,
                Err(_) => continue,
            };

            if !edge_types.is_empty() && !edge_types.contains(&edge.edge_type) {
                continue;
            }
            if let Some(predicate) = &predicate {
                if !predicate(&edge) {
                    continue;
                }
            }

            let other_key = match crate::key::tag_of(&obj.key) {
                Tag::Forward => edge.target.clone(),
                Tag::Reverse => edge.source.clone(),
                Tag::None => unreachable!("obj.is_edge() guarantees a tag"),
            };

            if tx.send(Object::new(other_key, None)).await.is_err() {
                break;
            }
        }
    });
    rx
}
