//! The implicit `GroupBy("id")` stage the engine inserts after every
//! step's projection, tracking seen node ids in a local hash set.
//! Per-step, per-invocation state only — nothing here outlives a single
//! `pipeline::run` call.

use std::collections::HashSet;

use tokio::sync::mpsc;
use tracing::warn;

use crate::key::NodeKey;
use crate::store::{ObjectStream, SCAN_CHANNEL_CAPACITY};

pub(crate) fn stage(mut input: ObjectStream) -> ObjectStream {
    let (tx, rx) = mpsc::channel(SCAN_CHANNEL_CAPACITY);
    tokio::spawn(async move {
        let mut seen: HashSet<String> = HashSet::new();
        while let Some(obj) = input.recv().await {
            if !obj.is_node() {
                warn!(key = %obj.key, "dedup stage: dropping non-node object");
                continue;
            }
            let id = match NodeKey::parse(&obj.key) {
                Ok(parsed) => parsed.id,
                Err(_) => continue,
            };
            if seen.contains(&id) {
                continue;
            }
            seen.insert(id);
            if tx.send(obj).await.is_err() {
                break;
            }
        }
    });
    rx
}
