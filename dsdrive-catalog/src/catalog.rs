//! Tree operations: path resolution, directory/file mutation, listing.

use std::time::{SystemTime, UNIX_EPOCH};

use bson::doc;
use futures::future::BoxFuture;
use mongodb::{Client, Collection, IndexModel};
use tracing::debug;

use crate::error::CatalogError;
use crate::node::{Access, Details, LocatorDoc, Node, NodeId, NodeKind};
use crate::store::{MongoStore, NodeStore, NodeUpdate};
use crate::Result;

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs_f64()
}

/// The outcome of [`Catalog::resolve`]: a full hit, a missing leaf (every
/// prefix exists), or a missing intermediate segment.
#[derive(Debug)]
pub enum ResolveOutcome {
    Found(Node),
    /// All prefixes exist; `.0` is the id of the last existing ancestor
    /// (the would-be parent of the missing leaf).
    MissingLeaf(NodeId),
    MissingIntermediate,
}

/// A partial update to a node's [`Access`].
#[derive(Debug, Clone, Default)]
pub struct AccessPatch {
    pub group: Option<String>,
    pub user: Option<String>,
    pub permissions: Option<Vec<String>>,
}

/// A partial update to a node's [`Details`].
#[derive(Debug, Clone, Default)]
pub struct DetailsPatch {
    pub accessed: Option<f64>,
    pub created: Option<f64>,
    pub metadata_changed: Option<f64>,
    pub modified: Option<f64>,
    pub size: Option<i64>,
}

/// The raw shape `set_info` accepts: zero or more of an access patch, a
/// details patch, and a basic (name / is_dir) patch, matching
/// `_set_info_by_fn`'s input.
#[derive(Debug, Clone, Default)]
pub struct SetInfoRequest {
    pub access: Option<AccessPatch>,
    pub details: Option<DetailsPatch>,
    pub name: Option<String>,
    pub is_dir: Option<bool>,
}

/// The metadata catalog: a document-store-backed tree of folder/file
/// nodes, generic over the storage backend so tests can run against an
/// in-memory fake.
pub struct Catalog<S: NodeStore> {
    store: S,
    root_id: NodeId,
}

impl Catalog<MongoStore> {
    /// Connects to `mongo_url`, ensures the `parent` index and root
    /// document exist (per `§6.3`), and returns a ready catalog.
    pub async fn connect(mongo_url: &str) -> Result<Self> {
        let client = Client::with_uri_str(mongo_url).await?;
        let db = client.database("dsdrive");
        let collection: Collection<Node> = db.collection("tree");
        collection
            .create_index(IndexModel::builder().keys(doc! { "parent": 1 }).build())
            .await?;
        let store = MongoStore::new(collection);
        let root_id = bootstrap_root(&store).await?;
        debug!(%root_id, "catalog ready");
        Ok(Self { store, root_id })
    }
}

/// Finds or creates the unique root document.
async fn bootstrap_root<S: NodeStore>(store: &S) -> Result<NodeId> {
    if let Some(root) = store.find_root().await? {
        return Ok(root.id());
    }
    let now = now_secs();
    let root = Node {
        id: None,
        parent: None,
        name: String::new(),
        kind: NodeKind::Folder,
        urls: Vec::new(),
        chunk_sizes: Vec::new(),
        access: Access::default_rwx(),
        details: Details::new_folder(now),
    };
    store.insert(root).await
}

impl<S: NodeStore> Catalog<S> {
    /// Wraps an already-bootstrapped store and its root id. Prefer
    /// [`Catalog::connect`] for the real Mongo backend; this constructor
    /// is for injecting a store that bootstraps differently (e.g. tests).
    pub fn new(store: S, root_id: NodeId) -> Self {
        Self { store, root_id }
    }

    /// Bootstraps a root document against any [`NodeStore`] and wraps it.
    pub async fn bootstrap(store: S) -> Result<Self> {
        let root_id = bootstrap_root(&store).await?;
        Ok(Self { store, root_id })
    }

    /// Wipes the catalog back to a single empty root. Test-only: mirrors
    /// the source's own `clear()`, used by its test harness to reset
    /// state between cases.
    pub async fn clear_for_tests(&mut self) -> Result<()> {
        self.store.clear_all().await?;
        self.root_id = bootstrap_root(&self.store).await?;
        Ok(())
    }

    pub fn root_id(&self) -> NodeId {
        self.root_id
    }

    /// Walks `segments` from the root. See [`ResolveOutcome`].
    pub async fn resolve(&self, segments: &[String]) -> Result<ResolveOutcome> {
        if segments.is_empty() {
            let root = self
                .store
                .find_by_id(self.root_id)
                .await?
                .expect("root always exists once bootstrapped");
            return Ok(ResolveOutcome::Found(root));
        }
        let mut parent_id = self.root_id;
        for (i, segment) in segments.iter().enumerate() {
            match self.store.find_child(parent_id, segment).await? {
                Some(node) => {
                    if i == segments.len() - 1 {
                        return Ok(ResolveOutcome::Found(node));
                    }
                    parent_id = node.id();
                }
                None => {
                    if i == segments.len() - 1 {
                        return Ok(ResolveOutcome::MissingLeaf(parent_id));
                    }
                    return Ok(ResolveOutcome::MissingIntermediate);
                }
            }
        }
        unreachable!("loop always returns for non-empty segments")
    }

    /// Creates missing folder nodes along `segments`.
    ///
    /// When `allow_many` is false, at most one missing segment may be
    /// created along the whole path. `exist_ok=false` fails with
    /// [`CatalogError::AlreadyExists`] specifically when the *leaf*
    /// segment already existed, not merely when no new directory was
    /// inserted anywhere along the path.
    pub async fn makedirs(
        &self,
        segments: &[String],
        allow_many: bool,
        exist_ok: bool,
    ) -> Result<NodeId> {
        let mut parent_id = self.root_id;
        let mut leaf_existed = false;
        for (i, segment) in segments.iter().enumerate() {
            let is_leaf = i == segments.len() - 1;
            match self.store.find_child(parent_id, segment).await? {
                Some(node) => {
                    if !node.is_folder() {
                        return Err(CatalogError::WrongKind);
                    }
                    parent_id = node.id();
                    if is_leaf {
                        leaf_existed = true;
                    }
                }
                None => {
                    if !allow_many && segments.len() - i > 1 {
                        return Err(CatalogError::NotFound);
                    }
                    let now = now_secs();
                    let folder = Node {
                        id: None,
                        parent: Some(parent_id),
                        name: segment.clone(),
                        kind: NodeKind::Folder,
                        urls: Vec::new(),
                        chunk_sizes: Vec::new(),
                        access: Access::default_rwx(),
                        details: Details::new_folder(now),
                    };
                    parent_id = self.store.insert(folder).await?;
                }
            }
        }
        if !exist_ok && leaf_existed {
            return Err(CatalogError::AlreadyExists);
        }
        Ok(parent_id)
    }

    /// Lists the direct children of the folder at `segments`.
    pub async fn list(&self, segments: &[String]) -> Result<Vec<Node>> {
        let parent = match self.resolve(segments).await? {
            ResolveOutcome::Found(node) => node,
            _ => return Err(CatalogError::NotFound),
        };
        if parent.is_file() {
            return Err(CatalogError::WrongKind);
        }
        self.store.children(parent.id()).await
    }

    /// Fetches the node at `segments`.
    pub async fn get_info(&self, segments: &[String]) -> Result<Node> {
        match self.resolve(segments).await? {
            ResolveOutcome::Found(node) => Ok(node),
            _ => Err(CatalogError::NotFound),
        }
    }

    /// Merges `req` onto the node at `segments`. Each of `access` and
    /// `details` merges against its own prior value.
    pub async fn set_info(&self, segments: &[String], req: SetInfoRequest) -> Result<()> {
        let node = match self.resolve(segments).await? {
            ResolveOutcome::Found(node) => node,
            _ => return Err(CatalogError::NotFound),
        };

        let mut update = NodeUpdate::default();
        if let Some(patch) = req.access {
            let mut access = node.access.clone();
            if let Some(group) = patch.group {
                access.group = group;
            }
            if let Some(user) = patch.user {
                access.user = user;
            }
            if let Some(permissions) = patch.permissions {
                access.permissions = permissions;
            }
            update.access = Some(access);
        }
        if let Some(patch) = req.details {
            let mut details = node.details.clone();
            if let Some(v) = patch.accessed {
                details.accessed = v;
            }
            if let Some(v) = patch.created {
                details.created = v;
            }
            if let Some(v) = patch.metadata_changed {
                details.metadata_changed = v;
            }
            if let Some(v) = patch.modified {
                details.modified = v;
            }
            if let Some(v) = patch.size {
                details.size = v;
            }
            update.details = Some(details);
        }
        if let Some(name) = req.name {
            update.name = Some(name);
        }
        if let Some(is_dir) = req.is_dir {
            update.kind = Some(if is_dir { NodeKind::Folder } else { NodeKind::File });
        }
        self.store.update(node.id(), update).await
    }

    /// Moves a file node. Refuses to move a folder.
    pub async fn rename(
        &self,
        src: &[String],
        dst: &[String],
        overwrite: bool,
        create_dirs: bool,
        preserve_timestamps: bool,
    ) -> Result<()> {
        if src.is_empty() || dst.is_empty() {
            return Err(CatalogError::WrongKind);
        }
        let src_node = match self.resolve(src).await? {
            ResolveOutcome::Found(node) => node,
            _ => return Err(CatalogError::NotFound),
        };
        if !src_node.is_file() {
            return Err(CatalogError::WrongKind);
        }

        let dst_parent_segments = &dst[..dst.len() - 1];
        let dst_parent_id = match self.resolve(dst_parent_segments).await? {
            ResolveOutcome::Found(node) => node.id(),
            _ if create_dirs => self.makedirs(dst_parent_segments, true, true).await?,
            _ => return Err(CatalogError::NotFound),
        };

        let leaf = dst.last().expect("checked non-empty above").clone();
        if let Some(existing) = self.store.find_child(dst_parent_id, &leaf).await? {
            if !overwrite {
                return Err(CatalogError::AlreadyExists);
            }
            if !existing.is_file() {
                return Err(CatalogError::WrongKind);
            }
            self.store.delete(existing.id()).await?;
        }

        let mut update = NodeUpdate {
            name: Some(leaf),
            parent: Some(dst_parent_id),
            ..Default::default()
        };
        if !preserve_timestamps {
            let mut details = src_node.details.clone();
            details.modified = now_secs();
            update.details = Some(details);
        }
        self.store.update(src_node.id(), update).await
    }

    /// Duplicates a file node's urls, chunk_sizes, access and details.
    pub async fn copy(
        &self,
        src: &[String],
        dst: &[String],
        overwrite: bool,
        create_dirs: bool,
        preserve_timestamps: bool,
    ) -> Result<NodeId> {
        if dst.is_empty() {
            return Err(CatalogError::WrongKind);
        }
        let src_node = match self.resolve(src).await? {
            ResolveOutcome::Found(node) => node,
            _ => return Err(CatalogError::NotFound),
        };
        if !src_node.is_file() {
            return Err(CatalogError::WrongKind);
        }

        let dst_parent_segments = &dst[..dst.len() - 1];
        let dst_parent_id = match self.resolve(dst_parent_segments).await? {
            ResolveOutcome::Found(node) => node.id(),
            _ if create_dirs => self.makedirs(dst_parent_segments, true, true).await?,
            _ => return Err(CatalogError::NotFound),
        };

        let leaf = dst.last().expect("checked non-empty above").clone();
        if let Some(existing) = self.store.find_child(dst_parent_id, &leaf).await? {
            if !overwrite {
                return Err(CatalogError::AlreadyExists);
            }
            if !existing.is_file() {
                return Err(CatalogError::WrongKind);
            }
            self.store.delete(existing.id()).await?;
        }

        let new_node = Node {
            id: None,
            parent: Some(dst_parent_id),
            name: leaf,
            kind: src_node.kind,
            urls: src_node.urls.clone(),
            chunk_sizes: src_node.chunk_sizes.clone(),
            access: src_node.access.clone(),
            details: src_node.details.clone(),
        };
        let new_id = self.store.insert(new_node).await?;

        if !preserve_timestamps {
            let mut details = src_node.details.clone();
            details.modified = now_secs();
            self.store
                .update(
                    src_node.id(),
                    NodeUpdate {
                        details: Some(details),
                        ..Default::default()
                    },
                )
                .await?;
        }
        Ok(new_id)
    }

    pub async fn remove_file(&self, segments: &[String]) -> Result<()> {
        let node = match self.resolve(segments).await? {
            ResolveOutcome::Found(node) => node,
            _ => return Err(CatalogError::NotFound),
        };
        if !node.is_file() {
            return Err(CatalogError::WrongKind);
        }
        self.store.delete(node.id()).await
    }

    pub async fn remove_dir(&self, segments: &[String]) -> Result<()> {
        if segments.is_empty() {
            return Err(CatalogError::CannotRemoveRoot);
        }
        let node = match self.resolve(segments).await? {
            ResolveOutcome::Found(node) => node,
            _ => return Err(CatalogError::NotFound),
        };
        if !node.is_folder() {
            return Err(CatalogError::WrongKind);
        }
        if self.store.has_children(node.id()).await? {
            return Err(CatalogError::NotEmpty);
        }
        self.store.delete(node.id()).await
    }

    /// Recursively deletes a folder and every descendant. Left
    /// unimplemented in the source; this catalog adopts the concrete
    /// recursive-delete semantics rather than failing `Unsupported`.
    pub async fn remove_tree(&self, segments: &[String]) -> Result<()> {
        if segments.is_empty() {
            return Err(CatalogError::CannotRemoveRoot);
        }
        let node = match self.resolve(segments).await? {
            ResolveOutcome::Found(node) => node,
            _ => return Err(CatalogError::NotFound),
        };
        self.remove_subtree(node.id()).await
    }

    fn remove_subtree(&self, id: NodeId) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            for child in self.store.children(id).await? {
                if child.is_folder() {
                    self.remove_subtree(child.id()).await?;
                } else {
                    self.store.delete(child.id()).await?;
                }
            }
            self.store.delete(id).await
        })
    }

    /// Commits an uploaded chunk sequence as the file at `parent_id` /
    /// `leaf_name`, inserting a new file node or updating an existing
    /// one. Used by the chunked object engine, not by the facade
    /// directly.
    pub async fn commit_file(
        &self,
        parent_id: NodeId,
        leaf_name: &str,
        urls: Vec<LocatorDoc>,
        chunk_sizes: Vec<i64>,
        logical_size: i64,
    ) -> Result<NodeId> {
        let now = now_secs();
        match self.store.find_child(parent_id, leaf_name).await? {
            Some(existing) if existing.is_file() => {
                let mut details = existing.details.clone();
                details.modified = now;
                details.size = logical_size;
                self.store
                    .update(
                        existing.id(),
                        NodeUpdate {
                            urls: Some(urls),
                            chunk_sizes: Some(chunk_sizes),
                            details: Some(details),
                            ..Default::default()
                        },
                    )
                    .await?;
                Ok(existing.id())
            }
            Some(_folder) => Err(CatalogError::WrongKind),
            None => {
                let node = Node {
                    id: None,
                    parent: Some(parent_id),
                    name: leaf_name.to_string(),
                    kind: NodeKind::File,
                    urls,
                    chunk_sizes,
                    access: Access::default_rwx(),
                    details: Details::new_file(now, logical_size),
                };
                self.store.insert(node).await
            }
        }
    }
}
