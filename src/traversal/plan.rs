//! The JSON wire schema for a traversal plan (`SPEC_FULL.md` §6).
//!
//! Aggregators are not serializable (they may carry closures), so a
//! [`TraversalPlan`] only round-trips the type/id/limit/direction/filter
//! shape of a [`crate::traversal::Traversal`] — exactly the subset the
//! source system's own plan JSON carries. `filter` is accepted as a
//! named string for forward compatibility with a future predicate
//! registry but is not otherwise interpreted, matching the "reserved"
//! note in the source schema.

use serde::{Deserialize, Serialize};

use crate::key::Direction;
use crate::traversal::{PathPlan, StepPlan, Traversal, ROOT_LIMIT, STEP_LIMIT};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraversalPlan {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default = "default_root_limit")]
    pub limit: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<Box<PathSchema>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSchema {
    #[serde(default)]
    pub types: Vec<String>,
    pub direction: u8,
    #[serde(default = "default_step_limit")]
    pub limit: usize,
    #[serde(default)]
    pub filter: String,
    pub target: TraversalPlan,
}

fn default_root_limit() -> usize {
    ROOT_LIMIT
}

fn default_step_limit() -> usize {
    STEP_LIMIT
}

fn direction_to_wire(direction: Direction) -> u8 {
    match direction {
        Direction::Out => 0,
        Direction::In => 1,
        Direction::Both => 2,
    }
}

fn direction_from_wire(value: u8) -> Direction {
    match value {
        1 => Direction::In,
        2 => Direction::Both,
        _ => Direction::Out,
    }
}

impl From<&Traversal> for TraversalPlan {
    fn from(traversal: &Traversal) -> Self {
        build_plan(&traversal.steps, &traversal.paths, 0)
    }
}

fn build_plan(steps: &[StepPlan], paths: &[PathPlan], index: usize) -> TraversalPlan {
    let step = &steps[index];
    let next = paths.get(index).map(|path| {
        Box::new(PathSchema {
            types: path.edge_types.clone(),
            direction: direction_to_wire(path.direction),
            limit: path.limit,
            filter: String::new(),
            target: build_plan(steps, paths, index + 1),
        })
    });
    TraversalPlan {
        node_type: step.node_type.clone(),
        id: step.id.clone(),
        limit: step.limit,
        next,
    }
}

impl From<TraversalPlan> for Traversal {
    fn from(plan: TraversalPlan) -> Self {
        let mut steps = Vec::new();
        let mut paths = Vec::new();
        flatten(plan, &mut steps, &mut paths);
        Traversal { steps, paths }
    }
}

fn flatten(plan: TraversalPlan, steps: &mut Vec<StepPlan>, paths: &mut Vec<PathPlan>) {
    // The wire schema always carries an `id` field, even unset (""); an
    // empty id is never a valid pin, so treat it the same as absent.
    let id = plan.id.filter(|id| !id.is_empty());
    steps.push(StepPlan {
        node_type: plan.node_type,
        id,
        limit: plan.limit,
        aggregators: Vec::new(),
    });
    if let Some(path) = plan.next {
        paths.push(PathPlan {
            edge_types: path.types,
            direction: direction_from_wire(path.direction),
            predicate: None,
            limit: path.limit,
        });
        flatten(path.target, steps, paths);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let plan = TraversalPlan {
            node_type: Some("user".into()),
            id: None,
            limit: 100,
            next: Some(Box::new(PathSchema {
                types: vec!["follows".into()],
                direction: 0,
                limit: 2000,
                filter: String::new(),
                target: TraversalPlan {
                    node_type: None,
                    id: None,
                    limit: 2000,
                    next: Some(Box::new(PathSchema {
                        types: vec!["posts".into()],
                        direction: 0,
                        limit: 2000,
                        filter: String::new(),
                        target: TraversalPlan {
                            node_type: None,
                            id: None,
                            limit: 2000,
                            next: None,
                        },
                    })),
                },
            })),
        };

        let json = serde_json::to_string(&plan).unwrap();
        let back: TraversalPlan = serde_json::from_str(&json).unwrap();
        let traversal: Traversal = back.into();
        assert_eq!(traversal.steps.len(), 3);
        assert_eq!(traversal.paths.len(), 2);
        assert_eq!(traversal.paths[0].edge_types, vec!["follows".to_string()]);
        assert_eq!(traversal.paths[1].edge_types, vec!["posts".to_string()]);
    }

    #[test]
    fn parses_canonical_scenario_string() {
        let q = r#"{
          "next": {
           "types": ["follows"],
           "direction": 0,
           "target": {
            "next": {
             "types": ["posts"],
             "direction": 0,
             "target": {
              "next": null,
              "id": "",
              "limit": 2000
             },
             "limit": 2000
            },
            "id": "",
            "limit": 2000
           },
           "limit": 2000
          },
          "type": "user",
          "id": "",
          "limit": 100
         }"#;
        let plan: TraversalPlan = serde_json::from_str(q).unwrap();
        let traversal: Traversal = plan.into();
        assert_eq!(traversal.steps[0].node_type.as_deref(), Some("user"));
        assert_eq!(traversal.paths.len(), 2);
    }
}
