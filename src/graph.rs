//! The graph facade (C3): typed node/edge CRUD plus resource-id
//! addressed access, layered directly over an [`OrderedStore`]. This is
//! the entry point most callers reach for; the store trait itself never
//! knows about nodes, edges, or traversals.

use std::sync::Arc;

use rand::Rng;

use crate::error::{GraphError, Result};
use crate::model::{Body, Edge, Node, Object};
use crate::resource_id::{PutTarget, ResourceId};
use crate::store::OrderedStore;
use crate::traversal::Traversal;

/// A property graph database over an ordered key-value keyspace.
#[derive(Clone)]
pub struct Graph {
    store: Arc<dyn OrderedStore>,
}

impl Graph {
    pub fn new(store: Arc<dyn OrderedStore>) -> Self {
        Graph { store }
    }

    pub(crate) fn store(&self) -> &Arc<dyn OrderedStore> {
        &self.store
    }

    /// Generates a 19-digit decimal id suffixed with `n`, wide enough to
    /// never collide in practice without requiring a central sequence.
    pub fn gen_id() -> String {
        let mut rng = rand::thread_rng();
        let mut id = String::with_capacity(20);
        id.push(char::from_digit(rng.gen_range(1..=9), 10).unwrap());
        for _ in 0..18 {
            id.push(char::from_digit(rng.gen_range(0..=9), 10).unwrap());
        }
        id.push('n');
        id
    }

    /// Starts a fresh traversal rooted at this graph.
    pub fn traversal(&self) -> Traversal {
        Traversal::new()
    }

    /// Creates a node of the given type with a freshly generated id.
    pub async fn create_node(&self, node_type: impl Into<String>, body: Body) -> Result<Node> {
        let node = Node::new(node_type, Self::gen_id(), body);
        self.put_node(&node).await?;
        Ok(node)
    }

    pub async fn put_node(&self, node: &Node) -> Result<()> {
        let key = node.key()?;
        self.store.put(&[Object::new(key, Some(node.body.clone()))]).await
    }

    pub async fn del_node(&self, node_type: &str, id: &str) -> Result<()> {
        // No cascade: edges referencing this node are left in place, as
        // in the source system. A dangling edge's endpoint simply fails
        // to decode to a live body on projection.
        let key = crate::key::encode_node_key(node_type, id)?;
        self.store.del(&[key]).await
    }

    /// Creates an edge of the given type between two existing nodes,
    /// writing both the forward and reverse index entries.
    pub async fn create_edge(&self, edge_type: impl Into<String>, source: impl Into<String>, target: impl Into<String>, body: Body) -> Result<Edge> {
        let edge = Edge::new(edge_type, source, target, body);
        self.put_edge(&edge).await?;
        Ok(edge)
    }

    pub async fn put_edge(&self, edge: &Edge) -> Result<()> {
        let forward = edge.forward_key()?;
        let reverse = edge.reverse_key()?;
        self.store
            .put(&[
                Object::new(forward, Some(edge.body.clone())),
                Object::new(reverse, Some(edge.body.clone())),
            ])
            .await
    }

    pub async fn del_edge(&self, edge: &Edge) -> Result<()> {
        let forward = edge.forward_key()?;
        let reverse = edge.reverse_key()?;
        self.store.del(&[forward, reverse]).await
    }

    /// Fetches a raw body by store key. A missing key yields `Ok(None)`.
    pub async fn get_body(&self, key: &str) -> Result<Option<Body>> {
        Ok(self.store.get(key).await?.val)
    }

    pub async fn get_by_resource_id(&self, id: &str) -> Result<Option<Body>> {
        let key = resource_id_store_key(&ResourceId::parse(id)?)?;
        self.get_body(&key).await
    }

    /// PUTs by resource id. Unlike [`Self::get_by_resource_id`]/
    /// [`Self::del_by_resource_id`], a node id may omit its `_I`
    /// component (e.g. `node:user`): the id is then taken from a
    /// body-supplied `id` field, or freshly generated if that's absent
    /// too.
    pub async fn put_by_resource_id(&self, id: &str, body: Body) -> Result<()> {
        match ResourceId::parse_for_put(id)? {
            PutTarget::Node { node_type, id: node_id } => {
                let node_id = node_id
                    .or_else(|| body.get("id").and_then(|v| v.as_str()).map(String::from))
                    .unwrap_or_else(Self::gen_id);
                self.put_node(&Node::new(node_type, node_id, body)).await
            }
            PutTarget::Edge { edge_type, source, target } => {
                self.put_edge(&Edge::new(edge_type, source.encode(), target.encode(), body)).await
            }
        }
    }

    pub async fn del_by_resource_id(&self, id: &str) -> Result<()> {
        match ResourceId::parse(id)? {
            ResourceId::Node(node_key) => self.del_node(&node_key.node_type, &node_key.id).await,
            ResourceId::Edge { edge_type, source, target } => {
                self.del_edge(&Edge::new(edge_type, source.encode(), target.encode(), Body::default())).await
            }
        }
    }
}

fn resource_id_store_key(id: &ResourceId) -> Result<String> {
    match id {
        ResourceId::Node(node_key) => Ok(node_key.encode()),
        ResourceId::Edge { edge_type, source, target } => {
            crate::key::encode_edge_key(crate::key::Tag::Forward, &source.encode(), edge_type, &target.encode())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mem::MemStore;

    fn graph() -> Graph {
        Graph::new(Arc::new(MemStore::new()))
    }

    #[tokio::test]
    async fn create_and_fetch_a_node() {
        let graph = graph();
        let node = graph.create_node("user", Body::default()).await.unwrap();
        let body = graph.get_body(&node.key().unwrap()).await.unwrap();
        assert!(body.is_some());
    }

    #[tokio::test]
    async fn create_edge_writes_both_directions() {
        let graph = graph();
        let a = graph.create_node("user", Body::default()).await.unwrap();
        let b = graph.create_node("user", Body::default()).await.unwrap();
        let edge = graph
            .create_edge("follows", a.key().unwrap(), b.key().unwrap(), Body::default())
            .await
            .unwrap();
        assert!(graph.get_body(&edge.forward_key().unwrap()).await.unwrap().is_some());
        assert!(graph.get_body(&edge.reverse_key().unwrap()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn resource_id_round_trip_for_a_node() {
        let graph = graph();
        let node = graph.create_node("user", Body::default()).await.unwrap();
        let id = node.resource_id().unwrap();
        let fetched = graph.get_by_resource_id(&id).await.unwrap();
        assert!(fetched.is_some());
        graph.del_by_resource_id(&id).await.unwrap();
        assert!(graph.get_by_resource_id(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rejects_malformed_resource_ids() {
        let graph = graph();
        assert!(matches!(graph.get_by_resource_id("bogus").await, Err(GraphError::Parse(_))));
    }

    #[tokio::test]
    async fn put_by_resource_id_takes_id_from_the_body_when_omitted() {
        let graph = graph();
        let mut body = Body::new();
        body.insert("id".into(), "main".into());
        graph.put_by_resource_id("node:user", body).await.unwrap();
        let fetched = graph.get_by_resource_id("node:user_main").await.unwrap();
        assert!(fetched.is_some());
    }

    #[tokio::test]
    async fn put_by_resource_id_generates_an_id_when_body_has_none() {
        let graph = graph();
        graph.put_by_resource_id("node:user", Body::default()).await.unwrap();
        let mut stream = graph.store().prefix("user_", 10).await.unwrap();
        assert!(stream.recv().await.is_some());
    }
}
