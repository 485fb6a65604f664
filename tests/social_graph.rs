//! End-to-end traversal scenarios over a small social graph, grounded
//! on the source system's own test fixture: one "main" user following
//! 20 users, each of whom posts 5 times; the last 10 followees dislike
//! every earlier followee's posts, and the last 5 also like them.

use std::sync::{Arc, Mutex};

use rangegraph::store::mem::MemStore;
use rangegraph::traversal::plan::TraversalPlan;
use rangegraph::{Body, Graph, Node};

async fn seed_social(graph: &Graph) {
    graph.put_node(&Node::new("user", "main", Body::default())).await.unwrap();

    let mut posts: Vec<Node> = Vec::new();
    for i in 0..20 {
        let user = graph.create_node("user", Body::default()).await.unwrap();

        if i >= 15 {
            for post in &posts {
                graph
                    .create_edge("likes", user.key().unwrap(), post.key().unwrap(), Body::default())
                    .await
                    .unwrap();
            }
        }
        if i >= 10 {
            for post in &posts {
                graph
                    .create_edge("dislike", user.key().unwrap(), post.key().unwrap(), Body::default())
                    .await
                    .unwrap();
            }
        }

        graph
            .create_edge("follows", "user_main", user.key().unwrap(), Body::default())
            .await
            .unwrap();

        for _ in 0..5 {
            let post = graph.create_node("post", Body::default()).await.unwrap();
            graph
                .create_edge("posts", user.key().unwrap(), post.key().unwrap(), Body::default())
                .await
                .unwrap();
            posts.push(post);
        }
    }
}

fn graph() -> Graph {
    Graph::new(Arc::new(MemStore::new()))
}

#[tokio::test]
async fn simple_fan_out_counts_every_edge() {
    let graph = graph();
    let root = graph.create_node("test", Body::default()).await.unwrap();
    for _ in 0..20 {
        let other = graph.create_node("test", Body::default()).await.unwrap();
        graph
            .create_edge("likes", root.key().unwrap(), other.key().unwrap(), Body::default())
            .await
            .unwrap();
    }

    let count = graph.traversal().is("test").out(["likes"]).count(&graph).await.unwrap();
    assert_eq!(count, 20);
}

#[tokio::test]
async fn two_hop_posts_reaches_every_post_once() {
    let graph = graph();
    seed_social(&graph).await;

    let list = graph.traversal().is("user").out(["follows"]).out(["posts"]).all(&graph).await.unwrap();
    assert_eq!(list.len(), 20 * 5);
    for obj in &list {
        assert_eq!(obj.as_node().unwrap().node_type, "post");
    }
}

#[tokio::test]
async fn likes_reaches_the_ninety_five_liked_posts() {
    let graph = graph();
    seed_social(&graph).await;

    let list = graph.traversal().is("user").out(["follows"]).out(["likes"]).all(&graph).await.unwrap();
    assert_eq!(list.len(), 95);
    for obj in &list {
        assert_eq!(obj.as_node().unwrap().node_type, "post");
    }
}

#[tokio::test]
async fn likes_back_reaches_the_nineteen_liking_authors() {
    let graph = graph();
    seed_social(&graph).await;

    let list = graph
        .traversal()
        .is("user")
        .out(["follows"])
        .out(["likes"])
        .in_(["posts"])
        .all(&graph)
        .await
        .unwrap();
    assert_eq!(list.len(), 19);
    for obj in &list {
        assert_eq!(obj.as_node().unwrap().node_type, "user");
    }
}

#[tokio::test]
async fn an_always_false_edge_filter_reaches_nothing() {
    let graph = graph();
    seed_social(&graph).await;

    let list = graph.traversal().is("user").out_filter(|_| false).all(&graph).await.unwrap();
    assert!(list.is_empty());
}

#[tokio::test]
async fn a_posted_traversal_plan_round_trips_to_the_same_result() {
    let graph = graph();
    seed_social(&graph).await;

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
    let traversal: rangegraph::Traversal = plan.into();
    let list = traversal.all(&graph).await.unwrap();
    assert_eq!(list.len(), 20 * 5);
}

#[tokio::test]
async fn for_each_runs_once_per_result_and_with_body_populates_every_body() {
    let graph = graph();
    seed_social(&graph).await;

    let visits = Arc::new(Mutex::new(0usize));
    let counter = visits.clone();
    let list = graph
        .traversal()
        .is("user")
        .out(["follows"])
        .out(["posts"])
        .for_each(move |_obj| {
            *counter.lock().unwrap() += 1;
        })
        .with_body()
        .all(&graph)
        .await
        .unwrap();

    assert_eq!(list.len(), 20 * 5);
    assert_eq!(*visits.lock().unwrap(), 20 * 5);
    assert!(list.iter().all(|obj| obj.val.is_some()));
}
