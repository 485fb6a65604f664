//! The fluent traversal builder (C4).
//!
//! See `SPEC_FULL.md` §4.3. A [`Traversal`] is a consuming builder: every
//! call takes `self` by value and returns `Self`, either mutating the
//! current step or appending a new path + step. There is exactly one
//! live cursor at a time, so a flat `Vec<StepPlan>` plus `Vec<PathPlan>`
//! captures the same linked-list shape the original design describes,
//! without the self-referential handle plumbing a "each call returns a
//! new handle" API would need under Rust's ownership rules.

pub mod plan;

use std::sync::Arc;

use crate::error::Result;
use crate::graph::Graph;
use crate::key::Direction;
use crate::model::{Edge, Object};
use crate::pipeline;

pub const ROOT_LIMIT: usize = 100;
pub const STEP_LIMIT: usize = 2000;

pub type NodePredicate = Arc<dyn Fn(&Object) -> bool + Send + Sync>;
pub type EdgePredicate = Arc<dyn Fn(&Edge) -> bool + Send + Sync>;
pub type ForEachFn = Arc<dyn Fn(&Object) + Send + Sync>;

/// A stage appended to a step after the implicit dedup: filter, skip,
/// group-by, with-body, for-each. Evaluated in declaration order.
#[derive(Clone)]
pub enum Aggregator {
    Filter(NodePredicate),
    Skip(usize),
    /// Only `"id"` does anything (it duplicates the implicit dedup for
    /// API parity with the source system); any other key is accepted and
    /// silently ignored, per the open question in `SPEC_FULL.md` §9.
    GroupBy(String),
    WithBody,
    ForEach(ForEachFn),
}

/// One node-level position in the plan.
#[derive(Clone, Default)]
pub struct StepPlan {
    pub node_type: Option<String>,
    pub id: Option<String>,
    pub limit: usize,
    pub aggregators: Vec<Aggregator>,
}

impl StepPlan {
    fn new(limit: usize) -> Self {
        StepPlan {
            node_type: None,
            id: None,
            limit,
            aggregators: Vec::new(),
        }
    }
}

/// The edge-hop connecting two successive steps.
#[derive(Clone)]
pub struct PathPlan {
    pub edge_types: Vec<String>,
    pub direction: Direction,
    pub predicate: Option<EdgePredicate>,
    pub limit: usize,
}

/// A traversal plan under construction: a chain of steps joined by
/// paths. `steps.len() == paths.len() + 1`.
#[derive(Clone, Default)]
pub struct Traversal {
    pub(crate) steps: Vec<StepPlan>,
    pub(crate) paths: Vec<PathPlan>,
}

impl Traversal {
    pub fn new() -> Self {
        Traversal {
            steps: vec![StepPlan::new(ROOT_LIMIT)],
            paths: Vec::new(),
        }
    }

    fn current_step_mut(&mut self) -> &mut StepPlan {
        self.steps.last_mut().expect("a traversal always has at least one step")
    }

    /// Constrains the current step's node type.
    pub fn is(mut self, node_type: impl Into<String>) -> Self {
        self.current_step_mut().node_type = Some(node_type.into());
        self
    }

    /// Pins the current step to a specific node id. Only `attr == "id"`
    /// is supported, matching the source API surface.
    pub fn has(mut self, attr: &str, value: impl Into<String>) -> Self {
        if attr == "id" {
            self.current_step_mut().id = Some(value.into());
        }
        self
    }

    /// Per-step scan cap for the current step (default 100 at the root,
    /// 2000 at subsequent steps).
    pub fn limit(mut self, n: usize) -> Self {
        self.current_step_mut().limit = n;
        self
    }

    fn advance(mut self, direction: Direction, edge_types: Vec<String>, predicate: Option<EdgePredicate>) -> Self {
        self.paths.push(PathPlan {
            edge_types,
            direction,
            predicate,
            limit: STEP_LIMIT,
        });
        self.steps.push(StepPlan::new(STEP_LIMIT));
        self
    }

    pub fn out<I, S>(self, edge_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.advance(Direction::Out, edge_types.into_iter().map(Into::into).collect(), None)
    }

    pub fn in_<I, S>(self, edge_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.advance(Direction::In, edge_types.into_iter().map(Into::into).collect(), None)
    }

    pub fn both<I, S>(self, edge_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.advance(Direction::Both, edge_types.into_iter().map(Into::into).collect(), None)
    }

    pub fn out_filter(self, predicate: impl Fn(&Edge) -> bool + Send + Sync + 'static) -> Self {
        self.advance(Direction::Out, Vec::new(), Some(Arc::new(predicate)))
    }

    pub fn in_filter(self, predicate: impl Fn(&Edge) -> bool + Send + Sync + 'static) -> Self {
        self.advance(Direction::In, Vec::new(), Some(Arc::new(predicate)))
    }

    pub fn both_filter(self, predicate: impl Fn(&Edge) -> bool + Send + Sync + 'static) -> Self {
        self.advance(Direction::Both, Vec::new(), Some(Arc::new(predicate)))
    }

    /// Adds a node-predicate aggregator at the current step.
    pub fn filter(mut self, predicate: impl Fn(&Object) -> bool + Send + Sync + 'static) -> Self {
        self.current_step_mut().aggregators.push(Aggregator::Filter(Arc::new(predicate)));
        self
    }

    /// Drops the first `n` objects of the current step.
    pub fn skip(mut self, n: usize) -> Self {
        self.current_step_mut().aggregators.push(Aggregator::Skip(n));
        self
    }

    pub fn group_by(mut self, key: impl Into<String>) -> Self {
        self.current_step_mut().aggregators.push(Aggregator::GroupBy(key.into()));
        self
    }

    /// Lazily populates `val` for any object whose body is empty.
    pub fn with_body(mut self) -> Self {
        self.current_step_mut().aggregators.push(Aggregator::WithBody);
        self
    }

    pub fn for_each(mut self, f: impl Fn(&Object) + Send + Sync + 'static) -> Self {
        self.current_step_mut().aggregators.push(Aggregator::ForEach(Arc::new(f)));
        self
    }

    /// Executes the plan against `graph`, returning every reached node.
    pub async fn all(self, graph: &Graph) -> Result<Vec<Object>> {
        pipeline::run(graph.store(), &self.steps, &self.paths).await
    }

    /// Executes the plan against `graph`, returning only the count of
    /// reached nodes.
    pub async fn count(self, graph: &Graph) -> Result<usize> {
        Ok(self.all(graph).await?.len())
    }
}
