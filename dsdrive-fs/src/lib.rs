//! The POSIX-like virtual filesystem facade: `getinfo`/`listdir`/
//! `makedir`/`openbin`/`remove`/`removedir`/`setinfo`/`rename`/`copy`
//! over a [`dsdrive_engine::ChunkedObjectEngine`], grounded on
//! `discord_fs.py`'s `DiscordFS(fs.base.FS)`.

pub mod error;
pub mod fs;
pub mod path;

pub use error::FsError;
pub use fs::Filesystem;
pub use path::validatepath;

/// Result type for facade operations.
pub type Result<T> = std::result::Result<T, FsError>;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use dsdrive_catalog::store::memory::MemoryStore;
    use dsdrive_catalog::Catalog;
    use dsdrive_crypto::ChunkCodec;
    use dsdrive_engine::ChunkedObjectEngine;
    use dsdrive_locator::Locator;
    use dsdrive_transport::{ExpiryRenewalPolicy, UploadDispatcher};
    use wiremock::matchers::{method, path as path_matcher};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    struct NoopRenewal;

    #[async_trait]
    impl ExpiryRenewalPolicy for NoopRenewal {
        async fn renew(&self, batch: &[Locator]) -> dsdrive_transport::Result<Vec<Locator>> {
            Ok(batch.to_vec())
        }
    }

    async fn test_fs(hook_url: &str) -> Filesystem<MemoryStore> {
        let catalog = Catalog::bootstrap(MemoryStore::new()).await.unwrap();
        let codec = ChunkCodec::new("test-passphrase");
        let dispatcher = UploadDispatcher::new(vec![hook_url.to_string()]).unwrap();
        let engine = ChunkedObjectEngine::new(
            catalog,
            codec,
            dispatcher,
            Box::new(NoopRenewal),
            "cdn.example-chat.net",
        );
        Filesystem::new(Arc::new(engine))
    }

    #[tokio::test]
    async fn getinfo_on_missing_path_is_resource_not_found() {
        let fs = test_fs("http://127.0.0.1:1/hook").await;
        let err = fs.getinfo("/nope").await.unwrap_err();
        assert!(matches!(err, FsError::ResourceNotFound));
    }

    #[tokio::test]
    async fn makedir_then_getinfo_reports_a_directory() {
        let fs = test_fs("http://127.0.0.1:1/hook").await;
        fs.makedir("/docs", false).await.unwrap();
        let info = fs.getinfo("/docs").await.unwrap();
        assert!(info.is_folder());
    }

    #[tokio::test]
    async fn makedir_without_recreate_on_existing_dir_fails() {
        let fs = test_fs("http://127.0.0.1:1/hook").await;
        fs.makedir("/docs", false).await.unwrap();
        let err = fs.makedir("/docs", false).await.unwrap_err();
        assert!(matches!(err, FsError::DirectoryExists));
    }

    #[tokio::test]
    async fn makedir_missing_parent_is_resource_not_found() {
        let fs = test_fs("http://127.0.0.1:1/hook").await;
        let err = fs.makedir("/a/b", false).await.unwrap_err();
        assert!(matches!(err, FsError::ResourceNotFound));
    }

    #[tokio::test]
    async fn listdir_on_a_file_is_directory_expected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_matcher("/hook"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "1",
                "attachments": [{"url": "https://cdn.example-chat.net/attachments/1/2/f?ex=ffffffff&is=1&hm=ab"}]
            })))
            .mount(&server)
            .await;
        let fs = test_fs(&format!("{}/hook", server.uri())).await;
        let mut h = fs.openbin("/a.bin", "w").await.unwrap();
        h.close().await.unwrap();

        let err = fs.listdir("/a.bin").await.unwrap_err();
        assert!(matches!(err, FsError::DirectoryExpected));
    }

    #[tokio::test]
    async fn openbin_rejects_invalid_mode() {
        let fs = test_fs("http://127.0.0.1:1/hook").await;
        let err = fs.openbin("/x", "t").await.unwrap_err();
        assert!(matches!(err, FsError::Unsupported(_)));
    }

    #[tokio::test]
    async fn openbin_read_on_missing_path_is_resource_not_found() {
        let fs = test_fs("http://127.0.0.1:1/hook").await;
        let err = fs.openbin("/missing.bin", "r").await.unwrap_err();
        assert!(matches!(err, FsError::ResourceNotFound));
    }

    #[tokio::test]
    async fn openbin_on_a_directory_is_file_expected() {
        let fs = test_fs("http://127.0.0.1:1/hook").await;
        fs.makedir("/docs", false).await.unwrap();
        let err = fs.openbin("/docs", "r").await.unwrap_err();
        assert!(matches!(err, FsError::FileExpected));
    }

    #[tokio::test]
    async fn removedir_on_root_is_remove_root_error() {
        let fs = test_fs("http://127.0.0.1:1/hook").await;
        let err = fs.removedir("/").await.unwrap_err();
        assert!(matches!(err, FsError::RemoveRootError));
    }

    #[tokio::test]
    async fn validatepath_rejects_control_characters() {
        let fs = test_fs("http://127.0.0.1:1/hook").await;
        let err = fs.getinfo("/a\u{0}b").await.unwrap_err();
        assert!(matches!(err, FsError::InvalidCharsInPath));
    }
}
