//! The staged, concurrent traversal pipeline runtime (C5).
//!
//! See `SPEC_FULL.md` §4.4. Compiling a plan into stages proceeds
//! iteratively over the plan's steps: for each step, two stages
//! (expansion, then projection+filtering) plus the implicit dedup and
//! any user aggregators, then on to the next step. The very first
//! expansion reads directly from the root step's own type/id (no
//! predecessor); every subsequent expansion reads from a worker pool
//! fanned out over the previous step's output stream.

mod dedup;
mod expand;
mod project;

use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::info;

use crate::error::{GraphError, Result};
use crate::model::Object;
use crate::store::{ObjectStream, OrderedStore, SCAN_CHANNEL_CAPACITY};
use crate::traversal::{Aggregator, PathPlan, StepPlan};

/// Tracks the first error observed by any concurrently running scan task
/// and a best-effort cancellation flag siblings poll between scan
/// batches. See the "Cancellation & errors" note in `SPEC_FULL.md` §4.4.
#[derive(Clone, Default)]
pub(crate) struct FatalSlot {
    inner: Arc<Mutex<Option<GraphError>>>,
}

impl FatalSlot {
    fn record(&self, err: GraphError) {
        let mut slot = self.inner.lock().unwrap();
        if slot.is_none() {
            *slot = Some(err);
        }
    }

    fn is_set(&self) -> bool {
        self.inner.lock().unwrap().is_some()
    }

    fn take(&self) -> Option<GraphError> {
        self.inner.lock().unwrap().take()
    }
}

/// Runs a compiled plan (`steps`/`paths`, as built by
/// [`crate::traversal::Traversal`]) to completion and returns every
/// reached node.
pub async fn run(store: &Arc<dyn OrderedStore>, steps: &[StepPlan], paths: &[PathPlan]) -> Result<Vec<Object>> {
    let started = Instant::now();
    let fatal = FatalSlot::default();

    let mut stream = expand::root_expansion(store.clone(), &steps[0], paths.first(), fatal.clone()).await?;

    if paths.is_empty() {
        stream = dedup::stage(stream);
        stream = apply_aggregators(stream, &steps[0].aggregators, store.clone());
    } else {
        stream = project::stage(stream, &paths[0]);
        stream = dedup::stage(stream);
        stream = apply_aggregators(stream, &steps[1].aggregators, store.clone());

        for (i, path) in paths.iter().enumerate().skip(1) {
            stream = expand::worker_pool_expansion(store.clone(), stream, path, fatal.clone());
            stream = project::stage(stream, path);
            stream = dedup::stage(stream);
            stream = apply_aggregators(stream, &steps[i + 1].aggregators, store.clone());
        }
    }

    let results = collect(stream).await;

    if let Some(err) = fatal.take() {
        return Err(GraphError::TraversalFatal(err.to_string()));
    }

    info!(
        steps = steps.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        results = results.len(),
        "traversal complete"
    );
    Ok(results)
}

async fn collect(mut stream: ObjectStream) -> Vec<Object> {
    let mut results = Vec::new();
    while let Some(obj) = stream.recv().await {
        results.push(obj);
    }
    results
}

/// Applies a step's user aggregators, in declaration order, on top of
/// the implicit dedup stage.
fn apply_aggregators(mut stream: ObjectStream, aggregators: &[Aggregator], store: Arc<dyn OrderedStore>) -> ObjectStream {
    for aggregator in aggregators {
        stream = apply_one(stream, aggregator.clone(), store.clone());
    }
    stream
}

fn apply_one(mut input: ObjectStream, aggregator: Aggregator, store: Arc<dyn OrderedStore>) -> ObjectStream {
    let (tx, rx) = mpsc::channel(SCAN_CHANNEL_CAPACITY);
    tokio::spawn(async move {
        match aggregator {
            Aggregator::Filter(predicate) => {
                while let Some(obj) = input.recv().await {
                    if predicate(&obj) && tx.send(obj).await.is_err() {
                        break;
                    }
                }
            }
            Aggregator::Skip(n) => {
                let mut seen = 0usize;
                while let Some(obj) = input.recv().await {
                    seen += 1;
                    if seen > n && tx.send(obj).await.is_err() {
                        break;
                    }
                }
            }
            Aggregator::GroupBy(key) => {
                if key == "id" {
                    let mut inner = dedup::stage(input);
                    while let Some(obj) = inner.recv().await {
                        if tx.send(obj).await.is_err() {
                            break;
                        }
                    }
                } else {
                    // Unimplemented grouping key: accepted, no-op, per
                    // the open question in SPEC_FULL.md §9.
                    while let Some(obj) = input.recv().await {
                        if tx.send(obj).await.is_err() {
                            break;
                        }
                    }
                }
            }
            Aggregator::WithBody => {
                while let Some(mut obj) = input.recv().await {
                    if obj.val.is_none() {
                        if let Ok(fetched) = store.get(&obj.key).await {
                            obj.val = fetched.val;
                        }
                    }
                    if tx.send(obj).await.is_err() {
                        break;
                    }
                }
            }
            Aggregator::ForEach(f) => {
                while let Some(obj) = input.recv().await {
                    f(&obj);
                    if tx.send(obj).await.is_err() {
                        break;
                    }
                }
            }
        }
    });
    rx
}
