//! The chunked object engine: splits files into encrypted chunks on
//! upload and reassembles them on download.

use std::path::PathBuf;

use dsdrive_catalog::{split_path, Catalog, LocatorDoc, NodeId, NodeStore, ResolveOutcome};
use dsdrive_crypto::ChunkCodec;
use dsdrive_locator::Locator;
use dsdrive_transport::{ExpiryRenewalPolicy, UploadDispatcher};
use tracing::{debug, warn};

use crate::error::EngineError;
use crate::Result;

/// Plaintext bytes read per iteration before encryption and upload.
pub const CHUNK_SIZE: usize = 24 * 1024 * 1024;

/// Where `send_file`'s bytes come from. A previously opened
/// [`crate::handle::FileHandle`] always resolves to `Bytes` by the time
/// it calls this, since it is fully buffered in memory.
pub enum FileSource {
    Bytes(Vec<u8>),
    Path(PathBuf),
}

/// Splits/reassembles files, coordinating the codec, dispatcher, catalog
/// and renewal policy.
pub struct ChunkedObjectEngine<S: NodeStore> {
    catalog: Catalog<S>,
    codec: ChunkCodec,
    dispatcher: UploadDispatcher,
    renewal: Box<dyn ExpiryRenewalPolicy>,
    cdn_host: String,
}

impl<S: NodeStore> ChunkedObjectEngine<S> {
    pub fn new(
        catalog: Catalog<S>,
        codec: ChunkCodec,
        dispatcher: UploadDispatcher,
        renewal: Box<dyn ExpiryRenewalPolicy>,
        cdn_host: impl Into<String>,
    ) -> Self {
        Self {
            catalog,
            codec,
            dispatcher,
            renewal,
            cdn_host: cdn_host.into(),
        }
    }

    pub fn catalog(&self) -> &Catalog<S> {
        &self.catalog
    }

    /// Uploads `source` as the file at `path`, creating the parent
    /// directory chain as needed. Failures after some chunks have
    /// already been uploaded leave orphan attachments on the remote
    /// side; the node is never committed, so the filesystem view is
    /// unchanged.
    pub async fn send_file(&self, path: &str, source: FileSource) -> Result<NodeId> {
        let segments = split_path(path);
        let (leaf, parent_segments) = segments.split_last().ok_or(EngineError::InvalidPath)?;
        let parent_id = self.catalog.makedirs(parent_segments, true, true).await?;

        let data = match source {
            FileSource::Bytes(bytes) => bytes,
            FileSource::Path(path) => {
                tokio::task::spawn_blocking(move || std::fs::read(path)).await??
            }
        };
        let logical_size = data.len() as i64;

        let mut urls = Vec::new();
        let mut chunk_sizes = Vec::new();
        for plain in data.chunks(CHUNK_SIZE) {
            let cipher = self.codec.encrypt(plain);
            let filename = chunk_filename(&cipher);
            let resp = match self.dispatcher.send(&filename, cipher.clone()).await {
                Ok(resp) => resp,
                Err(e) => {
                    warn!(chunk = %filename, error = %e, "chunk upload failed, leaving prior chunks orphaned");
                    return Err(e.into());
                }
            };
            let locator = Locator::from_url(&resp.attachment_url, resp.message_id)?;
            chunk_sizes.push(cipher.len() as i64);
            urls.push(LocatorDoc::try_from(&locator)?);
        }

        let chunk_count = chunk_sizes.len();
        let node_id = self
            .catalog
            .commit_file(parent_id, leaf, urls, chunk_sizes, logical_size)
            .await?;
        debug!(path, %node_id, chunk_count, "committed file");
        Ok(node_id)
    }

    /// Downloads the file at `path`, renewing expired locators before
    /// fetching. A zero-length file (`urls` empty) skips renewal and the
    /// dispatcher entirely.
    pub async fn download_file(&self, path: &str) -> Result<Vec<u8>> {
        let segments = split_path(path);
        let node = match self.catalog.resolve(&segments).await? {
            ResolveOutcome::Found(node) if node.is_file() => node,
            ResolveOutcome::Found(_) => return Err(EngineError::WrongKind),
            _ => return Err(EngineError::NotFound),
        };
        if node.urls.is_empty() {
            return Ok(Vec::new());
        }

        let locators = to_locators(&node.urls)?;
        let renewed = self.renewal.renew(&locators).await?;

        let mut out = Vec::with_capacity(node.details.size.max(0) as usize);
        for locator in &renewed {
            let url = locator.render(&self.cdn_host);
            let cipher = self.dispatcher.get(&url).await?;
            let plain = self.codec.decrypt(&cipher)?;
            out.extend_from_slice(&plain);
        }
        Ok(out)
    }

    /// Returns the renewed locator batch for the file at `path`, without
    /// downloading it. Useful for callers that only need fresh URLs
    /// (e.g. a future prefetching strategy).
    pub async fn locators_for(&self, path: &str) -> Result<Vec<Locator>> {
        let segments = split_path(path);
        let node = match self.catalog.resolve(&segments).await? {
            ResolveOutcome::Found(node) if node.is_file() => node,
            ResolveOutcome::Found(_) => return Err(EngineError::WrongKind),
            _ => return Err(EngineError::NotFound),
        };
        let locators = to_locators(&node.urls)?;
        Ok(self.renewal.renew(&locators).await?)
    }
}

fn to_locators(docs: &[LocatorDoc]) -> Result<Vec<Locator>> {
    Ok(docs
        .iter()
        .map(Locator::try_from)
        .collect::<std::result::Result<Vec<_>, _>>()?)
}

fn chunk_filename(cipher: &[u8]) -> String {
    let digest = md5::compute(cipher);
    let crc = crc32fast::hash(cipher);
    format!("{digest:x}-{}", hex::encode(crc.to_be_bytes()))
}
