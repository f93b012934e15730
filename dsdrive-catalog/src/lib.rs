//! The metadata catalog: a document-store-backed tree of directory and
//! file nodes, with path resolution, mutation and listing.

pub mod catalog;
pub mod error;
pub mod node;
pub mod path;
pub mod store;

pub use catalog::{AccessPatch, Catalog, DetailsPatch, ResolveOutcome, SetInfoRequest};
pub use error::CatalogError;
pub use node::{Access, Details, LocatorDoc, Node, NodeId, NodeKind};
pub use path::split_path;
pub use store::{MongoStore, NodeStore, NodeUpdate};

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;
    use store::memory::MemoryStore;

    async fn fresh_catalog() -> Catalog<MemoryStore> {
        Catalog::bootstrap(MemoryStore::new()).await.unwrap()
    }

    #[tokio::test]
    async fn makedirs_then_resolve_finds_the_leaf() {
        let catalog = fresh_catalog().await;
        let segments = split_path("/a/b/c");
        catalog.makedirs(&segments, true, true).await.unwrap();
        match catalog.resolve(&segments).await.unwrap() {
            ResolveOutcome::Found(node) => assert_eq!(node.name, "c"),
            other => panic!("expected Found, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn makedirs_respects_allow_many_false() {
        let catalog = fresh_catalog().await;
        let segments = split_path("/a/b/c");
        let err = catalog.makedirs(&segments, false, true).await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound));
    }

    #[tokio::test]
    async fn makedirs_allow_many_false_single_segment_succeeds() {
        let catalog = fresh_catalog().await;
        catalog
            .makedirs(&split_path("/a"), true, true)
            .await
            .unwrap();
        catalog
            .makedirs(&split_path("/a/b"), false, true)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn makedirs_is_idempotent_with_exist_ok() {
        let catalog = fresh_catalog().await;
        let segments = split_path("/a/b");
        let first = catalog.makedirs(&segments, true, true).await.unwrap();
        let second = catalog.makedirs(&segments, true, true).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn makedirs_without_exist_ok_fails_only_when_leaf_pre_existed() {
        let catalog = fresh_catalog().await;
        catalog
            .makedirs(&split_path("/a"), true, true)
            .await
            .unwrap();
        // /a exists, /a/b does not: leaf is new, should succeed even
        // though an ancestor already existed.
        catalog
            .makedirs(&split_path("/a/b"), true, false)
            .await
            .unwrap();
        // Now /a/b exists too: leaf pre-exists, should fail.
        let err = catalog
            .makedirs(&split_path("/a/b"), true, false)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::AlreadyExists));
    }

    #[tokio::test]
    async fn commit_file_then_list_shows_it() {
        let catalog = fresh_catalog().await;
        let parent_id = catalog
            .makedirs(&split_path("/t"), true, true)
            .await
            .unwrap();
        catalog
            .commit_file(parent_id, "x.bin", vec![], vec![], 0)
            .await
            .unwrap();
        let listed = catalog.list(&split_path("/t")).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "x.bin");
    }

    #[tokio::test]
    async fn commit_file_overwrite_updates_existing_node_id() {
        let catalog = fresh_catalog().await;
        let parent_id = catalog
            .makedirs(&split_path("/t"), true, true)
            .await
            .unwrap();
        let id1 = catalog
            .commit_file(parent_id, "x.bin", vec![], vec![], 11)
            .await
            .unwrap();
        let id2 = catalog
            .commit_file(parent_id, "x.bin", vec![], vec![], 11)
            .await
            .unwrap();
        assert_eq!(id1, id2);
        let info = catalog.get_info(&split_path("/t/x.bin")).await.unwrap();
        assert_eq!(info.details.size, 11);
    }

    #[tokio::test]
    async fn commit_file_onto_a_folder_is_wrong_kind() {
        let catalog = fresh_catalog().await;
        catalog
            .makedirs(&split_path("/t/x"), true, true)
            .await
            .unwrap();
        let parent_id = match catalog.resolve(&split_path("/t")).await.unwrap() {
            ResolveOutcome::Found(node) => node.id(),
            other => panic!("expected Found, got {other:?}"),
        };
        let err = catalog
            .commit_file(parent_id, "x", vec![], vec![], 0)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::WrongKind));
    }

    #[tokio::test]
    async fn remove_dir_fails_when_not_empty_then_succeeds_when_empty() {
        let catalog = fresh_catalog().await;
        catalog
            .makedirs(&split_path("/a/b"), true, true)
            .await
            .unwrap();
        let err = catalog
            .remove_dir(&split_path("/a"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotEmpty));
        catalog.remove_dir(&split_path("/a/b")).await.unwrap();
        catalog.remove_dir(&split_path("/a")).await.unwrap();
    }

    #[tokio::test]
    async fn remove_dir_on_root_is_cannot_remove_root() {
        let catalog = fresh_catalog().await;
        let err = catalog.remove_dir(&[]).await.unwrap_err();
        assert!(matches!(err, CatalogError::CannotRemoveRoot));
    }

    #[tokio::test]
    async fn rename_with_overwrite_replaces_destination() {
        let catalog = fresh_catalog().await;
        let parent_id = catalog
            .makedirs(&split_path("/t"), true, true)
            .await
            .unwrap();
        catalog
            .commit_file(parent_id, "a.txt", vec![], vec![], 1)
            .await
            .unwrap();
        catalog
            .commit_file(parent_id, "b.txt", vec![], vec![], 2)
            .await
            .unwrap();
        catalog
            .rename(
                &split_path("/t/a.txt"),
                &split_path("/t/b.txt"),
                true,
                false,
                false,
            )
            .await
            .unwrap();
        assert!(matches!(
            catalog.resolve(&split_path("/t/a.txt")).await.unwrap(),
            ResolveOutcome::MissingLeaf(_)
        ));
        let info = catalog.get_info(&split_path("/t/b.txt")).await.unwrap();
        assert_eq!(info.details.size, 1);
    }

    #[tokio::test]
    async fn rename_refuses_to_move_a_folder() {
        let catalog = fresh_catalog().await;
        catalog
            .makedirs(&split_path("/a"), true, true)
            .await
            .unwrap();
        let err = catalog
            .rename(&split_path("/a"), &split_path("/b"), false, false, false)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::WrongKind));
    }

    #[tokio::test]
    async fn copy_duplicates_a_file_node() {
        let catalog = fresh_catalog().await;
        let parent_id = catalog
            .makedirs(&split_path("/t"), true, true)
            .await
            .unwrap();
        catalog
            .commit_file(parent_id, "a.txt", vec![], vec![], 5)
            .await
            .unwrap();
        catalog
            .copy(
                &split_path("/t/a.txt"),
                &split_path("/t/a-copy.txt"),
                false,
                false,
                false,
            )
            .await
            .unwrap();
        let original = catalog.get_info(&split_path("/t/a.txt")).await.unwrap();
        let copy = catalog.get_info(&split_path("/t/a-copy.txt")).await.unwrap();
        assert_eq!(original.details.size, copy.details.size);
    }

    #[tokio::test]
    async fn remove_tree_deletes_all_descendants() {
        let catalog = fresh_catalog().await;
        let parent_id = catalog
            .makedirs(&split_path("/a/b"), true, true)
            .await
            .unwrap();
        catalog
            .commit_file(parent_id, "f.txt", vec![], vec![], 0)
            .await
            .unwrap();
        catalog.remove_tree(&split_path("/a")).await.unwrap();
        assert!(matches!(
            catalog.resolve(&split_path("/a")).await.unwrap(),
            ResolveOutcome::MissingLeaf(_)
        ));
    }

    #[tokio::test]
    async fn set_info_merges_details_without_touching_access() {
        let catalog = fresh_catalog().await;
        catalog
            .makedirs(&split_path("/a"), true, true)
            .await
            .unwrap();
        let before = catalog.get_info(&split_path("/a")).await.unwrap();
        catalog
            .set_info(
                &split_path("/a"),
                SetInfoRequest {
                    details: Some(DetailsPatch {
                        modified: Some(123.0),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let after = catalog.get_info(&split_path("/a")).await.unwrap();
        assert_eq!(after.details.modified, 123.0);
        assert_eq!(after.details.created, before.details.created);
        assert_eq!(after.access, before.access);
    }
}
