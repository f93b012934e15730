//! Upload dispatcher: round-robins across a pool of webhook endpoints and
//! absorbs the remote service's rate limiting.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, trace, warn};

use crate::error::TransportError;
use crate::Result;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const SEND_RETRY_SLACK: Duration = Duration::from_millis(30);
const GET_RETRY_SLACK: Duration = Duration::from_millis(100);
const GET_EMPTY_BODY_RETRY: Duration = Duration::from_millis(100);

#[derive(Deserialize)]
struct UploadResponseRaw {
    id: String,
    attachments: Vec<AttachmentRaw>,
}

#[derive(Deserialize)]
struct AttachmentRaw {
    url: String,
}

#[derive(Deserialize)]
struct RateLimitBody {
    retry_after: f64,
}

/// The parsed 200 response to a chunk upload.
#[derive(Debug, Clone)]
pub struct UploadResponse {
    /// The new message id backing the uploaded attachment.
    pub message_id: u64,
    /// The signed CDN URL of the first (only) attachment.
    pub attachment_url: String,
}

/// Rotates across a pool of webhook endpoints, POSTing chunk uploads and
/// GETting chunk downloads with rate-limit-aware retry.
///
/// Cloning is cheap: the round-robin index and HTTP client are shared.
#[derive(Clone)]
pub struct UploadDispatcher {
    endpoints: std::sync::Arc<Vec<String>>,
    index: std::sync::Arc<AtomicUsize>,
    client: reqwest::Client,
}

impl UploadDispatcher {
    /// Builds a dispatcher over `endpoints`. Fails if the list is empty.
    pub fn new(endpoints: Vec<String>) -> Result<Self> {
        if endpoints.is_empty() {
            return Err(TransportError::NoEndpoints);
        }
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            endpoints: std::sync::Arc::new(endpoints),
            index: std::sync::Arc::new(AtomicUsize::new(0)),
            client,
        })
    }

    /// Builds a dispatcher reusing an existing HTTP client (e.g. to share a
    /// connection pool with the download path).
    pub fn with_client(endpoints: Vec<String>, client: reqwest::Client) -> Result<Self> {
        if endpoints.is_empty() {
            return Err(TransportError::NoEndpoints);
        }
        Ok(Self {
            endpoints: std::sync::Arc::new(endpoints),
            index: std::sync::Arc::new(AtomicUsize::new(0)),
            client,
        })
    }

    /// Advances the round-robin index and returns the endpoint it now points at.
    fn next_endpoint(&self) -> &str {
        let i = self.index.fetch_add(1, Ordering::Relaxed) + 1;
        &self.endpoints[i % self.endpoints.len()]
    }

    /// Uploads one chunk as `multipart/form-data` field `file=(filename, body)`.
    ///
    /// On HTTP 429 the request is retried against the next endpoint in the
    /// rotation after sleeping `retry_after + 30ms`.
    pub async fn send(&self, filename: &str, body: Vec<u8>) -> Result<UploadResponse> {
        loop {
            let endpoint = self.next_endpoint().to_string();
            let part = reqwest::multipart::Part::bytes(body.clone()).file_name(filename.to_string());
            let form = reqwest::multipart::Form::new().part("file", part);

            let resp = match self.client.post(&endpoint).multipart(form).send().await {
                Ok(r) => r,
                Err(e) if e.is_timeout() => return Err(TransportError::Timeout),
                Err(e) => return Err(TransportError::Http(e)),
            };

            let status = resp.status();
            if status.as_u16() == 200 {
                let raw: UploadResponseRaw = resp.json().await?;
                let message_id: u64 = raw
                    .id
                    .parse()
                    .map_err(|_| TransportError::UploadRejected("non-numeric id".into()))?;
                let attachment_url = raw
                    .attachments
                    .into_iter()
                    .next()
                    .ok_or_else(|| TransportError::UploadRejected("no attachments".into()))?
                    .url;
                return Ok(UploadResponse {
                    message_id,
                    attachment_url,
                });
            }

            if status.as_u16() == 429 {
                let body_text = resp.text().await.unwrap_or_default();
                let retry_after = serde_json::from_str::<RateLimitBody>(&body_text)
                    .map(|b| b.retry_after)
                    .unwrap_or(1.0);
                warn!(retry_after, "upload rate limited, retrying");
                sleep(Duration::from_secs_f64(retry_after) + SEND_RETRY_SLACK).await;
                continue;
            }

            let body_text = resp.text().await.unwrap_or_default();
            return Err(TransportError::UploadRejected(body_text));
        }
    }

    /// Downloads the body at `url`, retrying on 429 and on a spuriously
    /// empty 200 response.
    pub async fn get(&self, url: &str) -> Result<Vec<u8>> {
        loop {
            trace!(url, "downloading chunk");
            let resp = match self.client.get(url).send().await {
                Ok(r) => r,
                Err(e) if e.is_timeout() => return Err(TransportError::Timeout),
                Err(e) => return Err(TransportError::Http(e)),
            };

            let status = resp.status();
            if status.as_u16() == 429 {
                let body_text = resp.text().await.unwrap_or_default();
                let retry_after = serde_json::from_str::<RateLimitBody>(&body_text)
                    .map(|b| b.retry_after)
                    .unwrap_or(1.0);
                warn!(retry_after, "download rate limited, retrying");
                sleep(Duration::from_secs_f64(retry_after) + GET_RETRY_SLACK).await;
                continue;
            }

            if status.as_u16() != 200 {
                let body_text = resp.text().await.unwrap_or_default();
                return Err(TransportError::UnexpectedStatus {
                    status: status.as_u16(),
                    body: body_text,
                });
            }

            let bytes = resp.bytes().await?;
            if bytes.is_empty() {
                debug!("empty body on 200, retrying after a short delay");
                sleep(GET_EMPTY_BODY_RETRY).await;
                continue;
            }
            return Ok(bytes.to_vec());
        }
    }
}
