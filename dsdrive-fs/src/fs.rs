//! The filesystem facade: translates path-based virtual-filesystem
//! operations into catalog/engine calls, mapping their results onto the
//! POSIX-like error taxonomy in [`crate::error`].

use std::sync::Arc;

use dsdrive_catalog::{split_path, CatalogError, Node, NodeStore, ResolveOutcome, SetInfoRequest};
use dsdrive_engine::{ChunkedObjectEngine, FileHandle};

use crate::error::{FsError, Result};
use crate::path::validatepath;

/// A virtual filesystem over one [`ChunkedObjectEngine`], read-only=false,
/// unicode-paths=true, case-sensitive=true.
pub struct Filesystem<S: NodeStore> {
    engine: Arc<ChunkedObjectEngine<S>>,
}

impl<S: NodeStore> Filesystem<S> {
    pub fn new(engine: Arc<ChunkedObjectEngine<S>>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<ChunkedObjectEngine<S>> {
        &self.engine
    }

    pub async fn getinfo(&self, path: &str) -> Result<Node> {
        validatepath(path)?;
        let segments = split_path(path);
        match self.engine.catalog().resolve(&segments).await? {
            ResolveOutcome::Found(node) => Ok(node),
            _ => Err(FsError::ResourceNotFound),
        }
    }

    pub async fn listdir(&self, path: &str) -> Result<Vec<String>> {
        validatepath(path)?;
        let segments = split_path(path);
        match self.engine.catalog().list(&segments).await {
            Ok(nodes) => Ok(nodes.into_iter().map(|n| n.name).collect()),
            Err(CatalogError::WrongKind) => Err(FsError::DirectoryExpected),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn makedir(&self, path: &str, recreate: bool) -> Result<()> {
        validatepath(path)?;
        let segments = split_path(path);
        match self
            .engine
            .catalog()
            .makedirs(&segments, false, recreate)
            .await
        {
            Ok(_) => Ok(()),
            Err(CatalogError::NotFound) => Err(FsError::ResourceNotFound),
            Err(CatalogError::AlreadyExists) => Err(FsError::DirectoryExists),
            Err(e) => Err(e.into()),
        }
    }

    /// Validates `mode` and existence per `discord_fs.py`'s `openbin`,
    /// then hands off to [`FileHandle::open`].
    pub async fn openbin(&self, path: &str, mode: &str) -> Result<FileHandle<S>> {
        if !['r', 'w', 'a', 'x'].iter().any(|c| mode.contains(*c)) {
            return Err(FsError::Unsupported("mode must contain one of r/w/a/x"));
        }
        validatepath(path)?;

        let segments = split_path(path);
        match self.engine.catalog().resolve(&segments).await? {
            ResolveOutcome::Found(node) => {
                if node.is_folder() {
                    return Err(FsError::FileExpected);
                }
                if mode.contains('x') {
                    return Err(FsError::FileExists);
                }
            }
            ResolveOutcome::MissingLeaf(_) => {
                if !(mode.contains('w') || mode.contains('a') || mode.contains('x')) {
                    return Err(FsError::ResourceNotFound);
                }
            }
            ResolveOutcome::MissingIntermediate => return Err(FsError::ResourceNotFound),
        }

        Ok(FileHandle::open(self.engine.clone(), path, mode).await?)
    }

    pub async fn remove(&self, path: &str) -> Result<()> {
        validatepath(path)?;
        let segments = split_path(path);
        match self.engine.catalog().remove_file(&segments).await {
            Ok(()) => Ok(()),
            Err(CatalogError::WrongKind) => Err(FsError::FileExpected),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn removedir(&self, path: &str) -> Result<()> {
        validatepath(path)?;
        let segments = split_path(path);
        match self.engine.catalog().remove_dir(&segments).await {
            Ok(()) => Ok(()),
            Err(CatalogError::WrongKind) => Err(FsError::DirectoryExpected),
            Err(e) => Err(e.into()),
        }
    }

    /// Recursively removes a directory and its contents. Not part of the
    /// minimal facade surface the source exposes, but grounded directly
    /// on `Catalog::remove_tree`.
    pub async fn removetree(&self, path: &str) -> Result<()> {
        validatepath(path)?;
        let segments = split_path(path);
        self.engine.catalog().remove_tree(&segments).await?;
        Ok(())
    }

    pub async fn setinfo(&self, path: &str, req: SetInfoRequest) -> Result<()> {
        validatepath(path)?;
        let segments = split_path(path);
        self.engine.catalog().set_info(&segments, req).await?;
        Ok(())
    }

    pub async fn rename(&self, src: &str, dst: &str, overwrite: bool) -> Result<()> {
        validatepath(src)?;
        validatepath(dst)?;
        let src_segments = split_path(src);
        let dst_segments = split_path(dst);
        match self
            .engine
            .catalog()
            .rename(&src_segments, &dst_segments, overwrite, false, false)
            .await
        {
            Ok(()) => Ok(()),
            Err(CatalogError::WrongKind) => Err(FsError::FileExpected),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn copy(&self, src: &str, dst: &str, overwrite: bool) -> Result<()> {
        validatepath(src)?;
        validatepath(dst)?;
        let src_segments = split_path(src);
        let dst_segments = split_path(dst);
        match self
            .engine
            .catalog()
            .copy(&src_segments, &dst_segments, overwrite, false, false)
            .await
        {
            Ok(_) => Ok(()),
            Err(CatalogError::WrongKind) => Err(FsError::FileExpected),
            Err(e) => Err(e.into()),
        }
    }
}
