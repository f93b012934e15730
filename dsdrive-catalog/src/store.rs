//! The storage seam between [`crate::Catalog`]'s tree logic and the
//! concrete document store. [`MongoStore`] is the real backend; tests
//! exercise the same logic against [`memory::MemoryStore`] so the suite
//! does not need a live MongoDB instance.

use async_trait::async_trait;
use bson::doc;
use mongodb::Collection;

use crate::node::{Node, NodeId};
use crate::Result;

/// Field-level update to a node. `None` leaves a field untouched.
#[derive(Debug, Default)]
pub struct NodeUpdate {
    pub name: Option<String>,
    pub parent: Option<NodeId>,
    pub kind: Option<crate::node::NodeKind>,
    pub urls: Option<Vec<crate::node::LocatorDoc>>,
    pub chunk_sizes: Option<Vec<i64>>,
    pub access: Option<crate::node::Access>,
    pub details: Option<crate::node::Details>,
}

/// Minimal persistence contract the tree logic in [`crate::Catalog`]
/// needs: find a child by name, look a node up by id, list children,
/// insert/update/delete.
#[async_trait]
pub trait NodeStore: Send + Sync {
    async fn find_root(&self) -> Result<Option<Node>>;
    async fn find_child(&self, parent: NodeId, name: &str) -> Result<Option<Node>>;
    async fn find_by_id(&self, id: NodeId) -> Result<Option<Node>>;
    async fn children(&self, parent: NodeId) -> Result<Vec<Node>>;
    async fn has_children(&self, parent: NodeId) -> Result<bool>;
    async fn insert(&self, node: Node) -> Result<NodeId>;
    async fn update(&self, id: NodeId, update: NodeUpdate) -> Result<()>;
    async fn delete(&self, id: NodeId) -> Result<()>;
    /// Wipes every node, including the root. Only used by
    /// `Catalog::clear_for_tests`.
    async fn clear_all(&self) -> Result<()>;
}

/// The real backend: a single `tree` collection with an index on
/// `parent`, per `§6.3`.
pub struct MongoStore {
    collection: Collection<Node>,
}

impl MongoStore {
    /// Wraps an already-connected collection. Callers are expected to
    /// have created the `parent` index once at startup (see
    /// [`crate::Catalog::connect`]).
    pub fn new(collection: Collection<Node>) -> Self {
        Self { collection }
    }
}

#[async_trait]
impl NodeStore for MongoStore {
    async fn find_root(&self) -> Result<Option<Node>> {
        Ok(self
            .collection
            .find_one(doc! { "parent": bson::Bson::Null, "name": "" })
            .await?)
    }

    async fn find_child(&self, parent: NodeId, name: &str) -> Result<Option<Node>> {
        Ok(self
            .collection
            .find_one(doc! { "parent": parent, "name": name })
            .await?)
    }

    async fn find_by_id(&self, id: NodeId) -> Result<Option<Node>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    async fn children(&self, parent: NodeId) -> Result<Vec<Node>> {
        use futures::stream::TryStreamExt;
        let cursor = self.collection.find(doc! { "parent": parent }).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn has_children(&self, parent: NodeId) -> Result<bool> {
        Ok(self
            .collection
            .find_one(doc! { "parent": parent })
            .await?
            .is_some())
    }

    async fn insert(&self, node: Node) -> Result<NodeId> {
        let result = self.collection.insert_one(node).await?;
        Ok(result
            .inserted_id
            .as_object_id()
            .expect("mongodb assigns an ObjectId _id"))
    }

    async fn update(&self, id: NodeId, update: NodeUpdate) -> Result<()> {
        let mut set = doc! {};
        if let Some(name) = update.name {
            set.insert("name", name);
        }
        if let Some(parent) = update.parent {
            set.insert("parent", parent);
        }
        if let Some(kind) = update.kind {
            set.insert("type", bson::to_bson(&kind)?);
        }
        if let Some(urls) = update.urls {
            set.insert("urls", bson::to_bson(&urls)?);
        }
        if let Some(chunk_sizes) = update.chunk_sizes {
            set.insert("chunk_sizes", bson::to_bson(&chunk_sizes)?);
        }
        if let Some(access) = update.access {
            set.insert("access", bson::to_bson(&access)?);
        }
        if let Some(details) = update.details {
            set.insert("details", bson::to_bson(&details)?);
        }
        if !set.is_empty() {
            self.collection
                .update_one(doc! { "_id": id }, doc! { "$set": set })
                .await?;
        }
        Ok(())
    }

    async fn delete(&self, id: NodeId) -> Result<()> {
        self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(())
    }

    async fn clear_all(&self) -> Result<()> {
        self.collection.delete_many(doc! {}).await?;
        Ok(())
    }
}

pub mod memory {
    //! An in-memory [`NodeStore`] used only by this crate's own tests.

    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::{NodeStore, NodeUpdate};
    use crate::node::{Node, NodeId};
    use crate::Result;

    #[derive(Default)]
    pub struct MemoryStore {
        nodes: Mutex<HashMap<NodeId, Node>>,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl NodeStore for MemoryStore {
        async fn find_root(&self) -> Result<Option<Node>> {
            let nodes = self.nodes.lock().expect("lock poisoned");
            Ok(nodes.values().find(|n| n.parent.is_none()).cloned())
        }

        async fn find_child(&self, parent: NodeId, name: &str) -> Result<Option<Node>> {
            let nodes = self.nodes.lock().expect("lock poisoned");
            Ok(nodes
                .values()
                .find(|n| n.parent == Some(parent) && n.name == name)
                .cloned())
        }

        async fn find_by_id(&self, id: NodeId) -> Result<Option<Node>> {
            Ok(self.nodes.lock().expect("lock poisoned").get(&id).cloned())
        }

        async fn children(&self, parent: NodeId) -> Result<Vec<Node>> {
            let nodes = self.nodes.lock().expect("lock poisoned");
            Ok(nodes
                .values()
                .filter(|n| n.parent == Some(parent))
                .cloned()
                .collect())
        }

        async fn has_children(&self, parent: NodeId) -> Result<bool> {
            let nodes = self.nodes.lock().expect("lock poisoned");
            Ok(nodes.values().any(|n| n.parent == Some(parent)))
        }

        async fn insert(&self, mut node: Node) -> Result<NodeId> {
            let id = bson::oid::ObjectId::new();
            node.id = Some(id);
            self.nodes.lock().expect("lock poisoned").insert(id, node);
            Ok(id)
        }

        async fn update(&self, id: NodeId, update: NodeUpdate) -> Result<()> {
            let mut nodes = self.nodes.lock().expect("lock poisoned");
            if let Some(node) = nodes.get_mut(&id) {
                if let Some(name) = update.name {
                    node.name = name;
                }
                if let Some(parent) = update.parent {
                    node.parent = Some(parent);
                }
                if let Some(kind) = update.kind {
                    node.kind = kind;
                }
                if let Some(urls) = update.urls {
                    node.urls = urls;
                }
                if let Some(chunk_sizes) = update.chunk_sizes {
                    node.chunk_sizes = chunk_sizes;
                }
                if let Some(access) = update.access {
                    node.access = access;
                }
                if let Some(details) = update.details {
                    node.details = details;
                }
            }
            Ok(())
        }

        async fn delete(&self, id: NodeId) -> Result<()> {
            self.nodes.lock().expect("lock poisoned").remove(&id);
            Ok(())
        }

        async fn clear_all(&self) -> Result<()> {
            self.nodes.lock().expect("lock poisoned").clear();
            Ok(())
        }
    }
}
