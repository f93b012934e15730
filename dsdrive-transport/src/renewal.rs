//! Expiry renewal: replacing expired signed CDN URLs with freshly signed ones.

use std::time::Duration;

use async_trait::async_trait;
use dsdrive_locator::Locator;
use serde::Deserialize;
use tokio::time::sleep;
use tracing::warn;

use crate::error::TransportError;
use crate::Result;

/// Minimum spacing between renewal requests, to stay under the remote
/// service's global rate limit (roughly 45 requests/sec).
const RENEWAL_PACING: Duration = Duration::from_millis(22);
const RENEWAL_RETRY_SLACK: Duration = Duration::from_millis(80);

/// A pluggable strategy for refreshing a batch of possibly-expired locators.
///
/// Implementations MUST preserve order and length: `renew(batch).len() ==
/// batch.len()`, and `renew(batch)[i]` corresponds to `batch[i]`. An expired
/// locator must be replaced; a non-expired one may be passed through
/// unchanged.
#[async_trait]
pub trait ExpiryRenewalPolicy: Send + Sync {
    /// Refreshes every expired locator in `batch`, in place order.
    async fn renew(&self, batch: &[Locator]) -> Result<Vec<Locator>>;
}

#[derive(Deserialize)]
struct MessageRaw {
    id: String,
    attachments: Vec<AttachmentRaw>,
}

#[derive(Deserialize)]
struct AttachmentRaw {
    url: String,
}

/// Renews locators by querying the chat service's messages endpoint for the
/// message each locator's chunk was uploaded in.
///
/// Fans requests out in parallel, paced to roughly one launch every
/// [`RENEWAL_PACING`] to respect the service's global per-bot rate limit. A
/// `429` is retried against the same request after sleeping
/// `Retry-After + 80ms`. Any other non-success response fails the whole
/// batch, matching the source's all-or-nothing semantics.
///
/// Cloning is cheap: the HTTP client and credentials are shared, which lets
/// `renew` hand an owned clone to each spawned lookup task.
#[derive(Clone)]
pub struct ApiRenewalPolicy {
    client: reqwest::Client,
    api_base: String,
    token: String,
}

impl ApiRenewalPolicy {
    /// `api_base` is the scheme+host of the chat service's REST API, e.g.
    /// `https://chat.example.net/api/v9`.
    pub fn new(api_base: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            api_base: api_base.into(),
            token: token.into(),
        })
    }

    async fn fetch_one(&self, locator: &Locator) -> Result<Locator> {
        if !locator.is_expired() {
            return Ok(locator.clone());
        }
        let url = format!(
            "{base}/channels/{channel}/messages?{message}&limit=3",
            base = self.api_base,
            channel = locator.channel_id,
            message = locator.message_id,
        );
        loop {
            let resp = self
                .client
                .get(&url)
                .header("Authorization", format!("Bot {}", self.token))
                .send()
                .await?;

            let status = resp.status();
            if status.as_u16() == 429 {
                let retry_after = resp
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<f64>().ok())
                    .unwrap_or(1.0);
                warn!(retry_after, "renewal rate limited, retrying");
                sleep(Duration::from_secs_f64(retry_after) + RENEWAL_RETRY_SLACK).await;
                continue;
            }
            if status.as_u16() != 200 {
                let body = resp.text().await.unwrap_or_default();
                return Err(TransportError::UnexpectedStatus {
                    status: status.as_u16(),
                    body,
                });
            }

            let messages: Vec<MessageRaw> = resp.json().await?;
            let first = messages
                .into_iter()
                .next()
                .ok_or_else(|| TransportError::UnexpectedStatus {
                    status: 200,
                    body: "empty messages array".into(),
                })?;
            let attachment_url = first
                .attachments
                .into_iter()
                .next()
                .ok_or_else(|| TransportError::UnexpectedStatus {
                    status: 200,
                    body: "message has no attachments".into(),
                })?
                .url;
            let message_id: u64 = first
                .id
                .parse()
                .map_err(|_| TransportError::UnexpectedStatus {
                    status: 200,
                    body: "non-numeric message id".into(),
                })?;
            return Ok(Locator::from_url(&attachment_url, message_id)?);
        }
    }
}

#[async_trait]
impl ExpiryRenewalPolicy for ApiRenewalPolicy {
    async fn renew(&self, batch: &[Locator]) -> Result<Vec<Locator>> {
        let mut handles = Vec::with_capacity(batch.len());
        for locator in batch {
            let policy = self.clone();
            let locator = locator.clone();
            handles.push(tokio::spawn(async move { policy.fetch_one(&locator).await }));
            sleep(RENEWAL_PACING).await;
        }
        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            let renewed = handle
                .await
                .map_err(|e| TransportError::RenewalTaskFailed(e.to_string()))??;
            results.push(renewed);
        }
        Ok(results)
    }
}
