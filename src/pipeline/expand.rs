//! Stage A: expansion. Two flavors: the root step scans directly from
//! its own type/id (no predecessor stream to read), while every
//! subsequent step fans a fixed worker pool out over the previous
//! step's output stream. See `SPEC_FULL.md` §4.4 and §5.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

use crate::error::GraphError;
use crate::key::{self, Direction, ScanSpec};
use crate::pipeline::FatalSlot;
use crate::store::{ObjectStream, OrderedStore, SCAN_CHANNEL_CAPACITY};
use crate::traversal::{PathPlan, StepPlan};

const WORKER_COUNT: usize = 20;

/// Issues one `store.prefix` scan per [`ScanSpec`] and fans the results
/// into a single merged channel. The outer task (a "master wait group")
/// closes the merge once every child scan has drained; a scan error is
/// recorded on `fatal` and aborts further forwarding on that branch.
async fn merge_scans(store: Arc<dyn OrderedStore>, specs: Vec<ScanSpec>, max_count: usize, fatal: FatalSlot) -> ObjectStream {
    let (tx, rx) = mpsc::channel(SCAN_CHANNEL_CAPACITY);
    let mut join_set: JoinSet<()> = JoinSet::new();
    for spec in specs {
        let store = store.clone();
        let tx = tx.clone();
        let fatal = fatal.clone();
        join_set.spawn(async move {
            if fatal.is_set() {
                return;
            }
            match store.prefix(&spec.prefix, max_count).await {
                Ok(mut scan_rx) => {
                    while let Some(obj) = scan_rx.recv().await {
                        if fatal.is_set() || tx.send(obj).await.is_err() {
                            break;
                        }
                    }
                }
                Err(err) => fatal.record(GraphError::Store(err.to_string())),
            }
        });
    }
    drop(tx);
    tokio::spawn(async move { while join_set.join_next().await.is_some() {} });
    rx
}

/// The set of scans a single concrete node (type `T`, id `I`) needs for
/// the given path, or the broader `"T_"` scan when the node's id is not
/// yet known (root step only).
fn scans_for(node_type: &str, id: Option<&str>, direction: Direction, edge_types: &[String]) -> crate::error::Result<Vec<ScanSpec>> {
    match id {
        Some(id) => key::expansion_scans(node_type, id, direction, edge_types),
        None => Ok(key::broad_expansion_scans(node_type, direction)),
    }
}

/// Stage A for the root step (index 0), which has no predecessor
/// stream.
pub(crate) async fn root_expansion(
    store: Arc<dyn OrderedStore>,
    step: &StepPlan,
    path: Option<&PathPlan>,
    fatal: FatalSlot,
) -> crate::error::Result<ObjectStream> {
    let node_type = step
        .node_type
        .as_deref()
        .ok_or_else(|| GraphError::validation("a traversal's root step requires a node type (call `.is(...)`)"))?;

    match path {
        None => {
            // No successor: scan the node keyspace directly, producing
            // raw node objects (there is no Stage B after this).
            let prefix = match &step.id {
                Some(id) => key::encode_node_key(node_type, id)?,
                None => format!("{node_type}{}", key::NODE_SEP),
            };
            Ok(merge_scans(
                store,
                vec![ScanSpec {
                    tag: key::Tag::None,
                    prefix,
                }],
                step.limit,
                fatal,
            )
            .await)
        }
        Some(path) => {
            let specs = scans_for(node_type, step.id.as_deref(), path.direction, &path.edge_types)?;
            Ok(merge_scans(store, specs, path.limit, fatal).await)
        }
    }
}

/// Stage A for a non-root step: a fixed pool of [`WORKER_COUNT`] tasks
/// reading incoming node objects from `input`, each issuing its own
/// child scans per node and forwarding onto a shared merged output.
pub(crate) fn worker_pool_expansion(store: Arc<dyn OrderedStore>, input: ObjectStream, path: &PathPlan, fatal: FatalSlot) -> ObjectStream {
    let (out_tx, out_rx) = mpsc::channel(SCAN_CHANNEL_CAPACITY);
    let shared_input = Arc::new(Mutex::new(input));
    let direction = path.direction;
    let edge_types = Arc::new(path.edge_types.clone());
    let max_count = path.limit;

    let mut master: JoinSet<()> = JoinSet::new();
    for _ in 0..WORKER_COUNT {
        let store = store.clone();
        let shared_input = shared_input.clone();
        let out_tx = out_tx.clone();
        let edge_types = edge_types.clone();
        let fatal = fatal.clone();
        master.spawn(async move {
            loop {
                let next = {
                    let mut guard = shared_input.lock().await;
                    guard.recv().await
                };
                let node = match next {
                    Some(obj) => obj,
                    None => break,
                };
                if fatal.is_set() {
                    break;
                }
                let node = match node.as_node() {
                    Ok(node) => node,
                    Err(_) => continue,
                };
                let specs = match scans_for(&node.node_type, Some(&node.id), direction, &edge_types) {
                    Ok(specs) => specs,
                    Err(err) => {
                        fatal.record(err);
                        continue;
                    }
                };

                // Intra-worker wait group: forward every child scan for
                // this node to completion before pulling the next one.
                let mut children: JoinSet<()> = JoinSet::new();
                for spec in specs {
                    let store = store.clone();
                    let out_tx = out_tx.clone();
                    let fatal = fatal.clone();
                    children.spawn(async move {
                        match store.prefix(&spec.prefix, max_count).await {
                            Ok(mut scan_rx) => {
                                while let Some(obj) = scan_rx.recv().await {
                                    if fatal.is_set() || out_tx.send(obj).await.is_err() {
                                        break;
                                    }
                                }
                            }
                            Err(err) => fatal.record(GraphError::Store(err.to_string())),
                        }
                    });
                }
                while children.join_next().await.is_some() {}
            }
        });
    }
    drop(out_tx);
    tokio::spawn(async move { while master.join_next().await.is_some() {} });
    out_rx
}
