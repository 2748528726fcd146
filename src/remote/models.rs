// ABOUTME: Data structures for the Seafile v2.1 directory and zip-task endpoints
// ABOUTME: Deserialized from the JSON bodies returned by the server

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirentKind {
    Dir,
    File,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Dirent {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: DirentKind,
}

impl Dirent {
    pub fn is_dir(&self) -> bool {
        self.kind == DirentKind::Dir
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirentList {
    pub dirent_list: Vec<Dirent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZipTask {
    pub zip_token: String,
}

/// Body of `query-zip-progress`.
///
/// Both counters are optional on the wire: the server answers with a
/// different shape (usually `{"error_msg": ...}`) when a task cannot be
/// packaged, and that shape is classified by the poller rather than
/// rejected here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ZipProgress {
    pub zipped: Option<u64>,
    pub total: Option<u64>,
}

impl ZipProgress {
    /// Returns `(zipped, total)` when both counters are present.
    pub fn counters(&self) -> Option<(u64, u64)> {
        Some((self.zipped?, self.total?))
    }
}

/// A decoded progress body together with the raw text it came from.
#[derive(Debug, Clone)]
pub struct ProgressReply {
    pub progress: ZipProgress,
    pub body: String,
}

impl ProgressReply {
    pub fn from_body(body: String) -> Self {
        let progress = serde_json::from_str(&body).unwrap_or_default();
        Self { progress, body }
    }
}
