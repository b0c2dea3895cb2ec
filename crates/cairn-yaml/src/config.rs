use serde::{Deserialize, Serialize};
use tracing::debug;

/// Raised document size cap: 64 MiB.
pub const DEFAULT_MAX_DOCUMENT_BYTES: u64 = 64 * 1024 * 1024;

/// Configuration for a [`YamlStorage`](crate::YamlStorage).
///
/// Fields left out when deserializing take their [`Default`] values, so an
/// omitted `max_document_bytes` keeps the 64 MiB cap.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct YamlStorageConfig {
    /// Comment header written at the top of the file when it is created.
    pub header: Option<String>,
    /// Largest file `load()` will accept, in bytes. `None` disables the cap.
    pub max_document_bytes: Option<u64>,
}

impl Default for YamlStorageConfig {
    fn default() -> Self {
        Self {
            header: None,
            max_document_bytes: Some(DEFAULT_MAX_DOCUMENT_BYTES),
        }
    }
}

impl YamlStorageConfig {
    /// Default configuration with a creation header.
    pub fn with_header(header: impl Into<String>) -> Self {
        Self {
            header: Some(header.into()),
            ..Default::default()
        }
    }

    /// Resolve the size cap this platform can honor.
    ///
    /// A zero cap, or one that cannot be addressed in memory here, is
    /// dropped and loading proceeds uncapped.
    pub(crate) fn effective_size_limit(&self) -> Option<u64> {
        let limit = self.max_document_bytes?;
        if limit == 0 {
            debug!("ignoring zero document size limit");
            return None;
        }
        if usize::try_from(limit).is_err() {
            debug!(limit, "document size limit exceeds address space, ignoring");
            return None;
        }
        Some(limit)
    }
}
