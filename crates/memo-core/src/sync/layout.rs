//! Remote folder layout: `<root>/notes/<key>.json` and `<root>/assets/<id>`.

use crate::config::DEFAULT_REMOTE_ROOT;
use crate::models::AttachmentId;
use crate::shard::shard_file_name;

const NOTES_DIR: &str = "notes";
const ASSETS_DIR: &str = "assets";

/// Paths of everything the engine reads or writes on the remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteLayout {
    root: String,
}

impl Default for RemoteLayout {
    fn default() -> Self {
        Self::new(DEFAULT_REMOTE_ROOT)
    }
}

impl RemoteLayout {
    #[must_use]
    pub fn new(root: &str) -> Self {
        Self {
            root: root.trim().trim_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    #[must_use]
    pub fn notes_dir(&self) -> String {
        self.join(NOTES_DIR)
    }

    #[must_use]
    pub fn assets_dir(&self) -> String {
        self.join(ASSETS_DIR)
    }

    /// Collections that must exist before a run, parents first.
    #[must_use]
    pub fn collections(&self) -> Vec<String> {
        let mut collections = Vec::new();
        // Nested roots need every ancestor created.
        let mut prefix = String::new();
        for segment in self.root.split('/').filter(|segment| !segment.is_empty()) {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(segment);
            collections.push(prefix.clone());
        }
        collections.push(self.notes_dir());
        collections.push(self.assets_dir());
        collections
    }

    #[must_use]
    pub fn shard_path(&self, key: &str) -> String {
        format!("{}/{}", self.notes_dir(), shard_file_name(key))
    }

    #[must_use]
    pub fn asset_path(&self, id: &AttachmentId) -> String {
        format!("{}/{}", self.assets_dir(), id.as_str())
    }

    fn join(&self, child: &str) -> String {
        if self.root.is_empty() {
            child.to_string()
        } else {
            format!("{}/{child}", self.root)
        }
    }
}
