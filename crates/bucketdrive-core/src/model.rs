//! Filesystem data model shared across the crate.
//!
//! These are the shapes the drive hands to its host: entries, checkpoints,
//! and change events. They are what a hierarchical-filesystem consumer sees;
//! the raw backend envelope never leaves `protocol`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::path::DrivePath;

/// Kind of filesystem node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    File,
    Directory,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::File => "file",
            EntryType::Directory => "directory",
        }
    }
}

/// How an entry's `content` should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryFormat {
    Text,
    Json,
    Base64,
}

/// Decoded payload of an entry.
///
/// Directories carry their children in the order the backend returned them
/// (no sorting is applied). Files carry decoded UTF-8 text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryContent {
    Text(String),
    Listing(Vec<Entry>),
}

/// One filesystem node, either a file or a directory.
///
/// `content` is `None` when it was not fetched (children of a listing,
/// minimal entries returned by rename/copy). Timestamps are opaque strings
/// and may be empty when the backend does not supply them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub path: DrivePath,
    pub name: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    #[serde(default)]
    pub format: Option<EntryFormat>,
    #[serde(default)]
    pub content: Option<EntryContent>,
    #[serde(rename = "mimetype", default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub last_modified: String,
    pub writable: bool,
}

/// A point-in-time marker for a file, local to the drive's lifetime.
///
/// Checkpoints are never persisted to the backend; they vanish when the
/// drive is disposed or the process exits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: String,
    pub last_modified: DateTime<Utc>,
}

/// Which mutating operation a change event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Save,
}

/// Notification emitted after a mutating operation succeeds.
///
/// `previous` is the prior state (`None` when newly created) and `new` is
/// the just-written entry. Events are only emitted once the backend request
/// has settled successfully; a failed operation emits nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    #[serde(rename = "previousValue", default)]
    pub previous: Option<Entry>,
    #[serde(rename = "newValue", default)]
    pub new: Option<Entry>,
}
