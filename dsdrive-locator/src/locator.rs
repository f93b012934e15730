//! The [`Locator`] value object and its URL parse/render pair.

use std::time::{SystemTime, UNIX_EPOCH};

use url::Url;

use crate::error::LocatorError;
use crate::Result;

/// Seconds of safety margin subtracted from `expire` before a locator is
/// considered expired. Protects against a URL that expires mid-transfer.
pub const EXPIRY_SKEW_SECS: u64 = 600;

/// A resolved-but-possibly-expiring reference to one uploaded chunk on the
/// remote CDN.
///
/// `message_id` is never present in the rendered URL; it is supplied
/// out-of-band by the upload response (or by the caller, on renewal) and
/// carried alongside the other fields purely so the renewal policy can look
/// the message back up later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    pub channel_id: u64,
    pub message_id: u64,
    pub attachment_id: u64,
    pub filename: Vec<u8>,
    pub expire: u64,
    pub issue: u64,
    pub signature: Vec<u8>,
}

impl Locator {
    /// Parses a signed CDN URL, pairing it with a `message_id` obtained
    /// out-of-band (e.g. from the upload response, or from the caller of a
    /// renewal policy).
    pub fn from_url(url: &str, message_id: u64) -> Result<Self> {
        let parsed = Url::parse(url)?;

        let mut query = std::collections::HashMap::new();
        for (key, value) in parsed.query_pairs() {
            query.insert(key.into_owned(), value.into_owned());
        }

        let issue = parse_hex_u64(&query, "is")?;
        let expire = parse_hex_u64(&query, "ex")?;
        let signature = query
            .get("hm")
            .ok_or(LocatorError::MissingQueryParam("hm"))?;
        let signature = hex::decode(signature).map_err(|source| LocatorError::InvalidHex {
            name: "hm",
            source,
        })?;

        let segments: Vec<&str> = parsed
            .path_segments()
            .ok_or_else(|| LocatorError::InvalidPath(url.to_string()))?
            .collect();
        // .../attachments/<channel_id>/<attachment_id>/<filename>
        let tail = segments
            .iter()
            .position(|s| *s == "attachments")
            .map(|i| &segments[i + 1..])
            .unwrap_or(&segments[..]);
        if tail.len() < 3 {
            return Err(LocatorError::InvalidPath(url.to_string()));
        }
        let channel_id = tail[0]
            .parse()
            .map_err(|source| LocatorError::InvalidInteger {
                field: "channel_id",
                source,
            })?;
        let attachment_id = tail[1]
            .parse()
            .map_err(|source| LocatorError::InvalidInteger {
                field: "attachment_id",
                source,
            })?;
        let filename = tail[2].as_bytes().to_vec();

        Ok(Locator {
            channel_id,
            message_id,
            attachment_id,
            filename,
            expire,
            issue,
            signature,
        })
    }

    /// Renders the full signed URL this locator was parsed from (minus the
    /// host, which is supplied by the caller).
    pub fn render(&self, cdn_host: &str) -> String {
        format!(
            "https://{host}/attachments/{channel}/{attachment}/{filename}?ex={ex:x}&is={is:x}&hm={hm}",
            host = cdn_host,
            channel = self.channel_id,
            attachment = self.attachment_id,
            filename = String::from_utf8_lossy(&self.filename),
            ex = self.expire,
            is = self.issue,
            hm = hex::encode(&self.signature),
        )
    }

    /// True once `now >= expire - EXPIRY_SKEW_SECS`.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now_secs())
    }

    /// `is_expired`, but with an explicit clock for tests.
    pub fn is_expired_at(&self, now: u64) -> bool {
        now >= self.expire.saturating_sub(EXPIRY_SKEW_SECS)
    }
}

fn parse_hex_u64(query: &std::collections::HashMap<String, String>, name: &'static str) -> Result<u64> {
    let raw = query.get(name).ok_or(LocatorError::MissingQueryParam(name))?;
    u64::from_str_radix(raw, 16).map_err(|source| LocatorError::InvalidInteger {
        field: name,
        source,
    })
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_render_and_parse() {
        let loc = Locator {
            channel_id: 1183629078323019841,
            message_id: 1191694541993033761,
            attachment_id: 1191694542261452871,
            filename: b"59bcfcc8fda508c307155d49952a9f1d-8bd0d1a2".to_vec(),
            expire: 0x65a65f07,
            issue: 0x6593ea07,
            signature: hex::decode("0333eaf89c666bef1a173f68ad205b87").unwrap(),
        };
        let rendered = loc.render("cdn.example-chat.net");
        let parsed = Locator::from_url(&rendered, loc.message_id).unwrap();
        assert_eq!(parsed.channel_id, loc.channel_id);
        assert_eq!(parsed.attachment_id, loc.attachment_id);
        assert_eq!(parsed.filename, loc.filename);
        assert_eq!(parsed.expire, loc.expire);
        assert_eq!(parsed.issue, loc.issue);
        assert_eq!(parsed.signature, loc.signature);
    }

    #[test]
    fn message_id_survives_the_trip_even_though_its_never_in_the_url() {
        let rendered = "https://cdn.example-chat.net/attachments/1/2/file.bin?ex=10&is=5&hm=ab";
        let parsed = Locator::from_url(rendered, 999).unwrap();
        assert_eq!(parsed.message_id, 999);
        assert!(!rendered.contains("999"));
    }

    #[test]
    fn expiry_applies_ten_minute_skew() {
        let loc = Locator {
            channel_id: 1,
            message_id: 1,
            attachment_id: 1,
            filename: b"f".to_vec(),
            expire: 1_000_000,
            issue: 900_000,
            signature: vec![0xab],
        };
        assert!(!loc.is_expired_at(1_000_000 - 601));
        assert!(loc.is_expired_at(1_000_000 - 600));
        assert!(loc.is_expired_at(1_000_000));
    }

    #[test]
    fn missing_query_param_is_reported() {
        let url = "https://cdn.example-chat.net/attachments/1/2/f?ex=10&hm=ab";
        assert!(matches!(
            Locator::from_url(url, 1),
            Err(LocatorError::MissingQueryParam("is"))
        ));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;
        use proptest::test_runner::TestCaseError;

        fn locator() -> impl Strategy<Value = Locator> {
            (
                any::<u64>(),
                any::<u64>(),
                any::<u64>(),
                "[a-zA-Z0-9._-]{1,40}",
                any::<u64>(),
                any::<u64>(),
                prop::collection::vec(any::<u8>(), 1..32),
            )
                .prop_map(
                    |(channel_id, message_id, attachment_id, filename, expire, issue, signature)| {
                        Locator {
                            channel_id,
                            message_id,
                            attachment_id,
                            filename: filename.into_bytes(),
                            expire,
                            issue,
                            signature,
                        }
                    },
                )
        }

        proptest! {
            #[test]
            fn render_then_parse_round_trips(loc in locator()) {
                let rendered = loc.render("cdn.example-chat.net");
                let parsed = Locator::from_url(&rendered, loc.message_id)
                    .map_err(|e| TestCaseError::fail(e.to_string()))?;
                prop_assert_eq!(parsed.channel_id, loc.channel_id);
                prop_assert_eq!(parsed.attachment_id, loc.attachment_id);
                prop_assert_eq!(parsed.filename, loc.filename);
                prop_assert_eq!(parsed.expire, loc.expire);
                prop_assert_eq!(parsed.issue, loc.issue);
                prop_assert_eq!(parsed.signature, loc.signature);
            }
        }
    }
}
