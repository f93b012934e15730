//! The catalog's persisted shapes: [`Node`] and its nested value objects.

use bson::oid::ObjectId;
use dsdrive_locator::Locator;
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::Result;

/// A catalog-assigned opaque unique key for a [`Node`].
pub type NodeId = ObjectId;

/// `folder` or `file`, serialized exactly as the source's `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Folder,
    File,
}

/// Owner/group/permission-token access metadata. Stored but only
/// advisory: the catalog does not enforce permissions itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Access {
    pub group: String,
    pub user: String,
    pub permissions: Vec<String>,
}

impl Access {
    /// The default access every newly created node gets: `root:staff`
    /// with every `{g,u,o}_{r,w,x}` token set.
    pub fn default_rwx() -> Self {
        Self {
            group: "staff".to_string(),
            user: "root".to_string(),
            permissions: vec![
                "g_r".into(),
                "g_w".into(),
                "g_x".into(),
                "u_r".into(),
                "u_w".into(),
                "u_x".into(),
                "o_r".into(),
                "o_w".into(),
                "o_x".into(),
            ],
        }
    }
}

/// Timestamped size/kind metadata.
///
/// `kind` duplicates [`NodeKind`] as the integer encoding the source
/// used (`folder=1`, `file=2`) since it is a field of `details`, not of
/// the node itself, in the persisted schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Details {
    pub accessed: f64,
    pub created: f64,
    pub metadata_changed: f64,
    pub modified: f64,
    pub size: i64,
    pub kind: i32,
}

impl Details {
    pub fn new_folder(now: f64) -> Self {
        Self {
            accessed: now,
            created: now,
            metadata_changed: now,
            modified: now,
            size: 0,
            kind: 1,
        }
    }

    pub fn new_file(now: f64, size: i64) -> Self {
        Self {
            accessed: now,
            created: now,
            metadata_changed: now,
            modified: now,
            size,
            kind: 2,
        }
    }
}

/// The persisted form of a [`Locator`]: BSON has no native unsigned
/// 64-bit integer, so the snowflake-ish fields are carried as `i64` (they
/// never approach the sign bit in practice) and the binary fields as a
/// UTF-8 filename plus a [`bson::Binary`] signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocatorDoc {
    pub channel_id: i64,
    pub message_id: i64,
    pub attachment_id: i64,
    pub filename: String,
    pub expire: i64,
    pub issue: i64,
    pub signature: bson::Binary,
}

impl TryFrom<&Locator> for LocatorDoc {
    type Error = CatalogError;

    fn try_from(loc: &Locator) -> Result<Self> {
        Ok(Self {
            channel_id: to_i64(loc.channel_id, "channel_id")?,
            message_id: to_i64(loc.message_id, "message_id")?,
            attachment_id: to_i64(loc.attachment_id, "attachment_id")?,
            filename: String::from_utf8(loc.filename.clone())?,
            expire: to_i64(loc.expire, "expire")?,
            issue: to_i64(loc.issue, "issue")?,
            signature: bson::Binary {
                subtype: bson::spec::BinarySubtype::Generic,
                bytes: loc.signature.clone(),
            },
        })
    }
}

impl TryFrom<&LocatorDoc> for Locator {
    type Error = CatalogError;

    fn try_from(doc: &LocatorDoc) -> Result<Self> {
        Ok(Locator {
            channel_id: doc.channel_id as u64,
            message_id: doc.message_id as u64,
            attachment_id: doc.attachment_id as u64,
            filename: doc.filename.clone().into_bytes(),
            expire: doc.expire as u64,
            issue: doc.issue as u64,
            signature: doc.signature.bytes.clone(),
        })
    }
}

fn to_i64(value: u64, field: &'static str) -> Result<i64> {
    i64::try_from(value).map_err(|_| CatalogError::IntegerOverflow { field })
}

/// A single row in the catalog tree: either a folder or a file.
///
/// Invariants (enforced by [`crate::Catalog`], not by this type):
/// exactly one root (`parent: None`, `name: ""`); `(parent, name)` unique
/// among siblings; `urls.len() == chunk_sizes.len()` for file nodes;
/// folder nodes carry empty `urls`/`chunk_sizes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<NodeId>,
    pub parent: Option<NodeId>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub urls: Vec<LocatorDoc>,
    #[serde(default)]
    pub chunk_sizes: Vec<i64>,
    pub access: Access,
    pub details: Details,
}

impl Node {
    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    pub fn id(&self) -> NodeId {
        self.id.expect("node loaded from the store always carries an _id")
    }
}
