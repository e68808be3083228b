use serde::{Deserialize, Serialize};

/// Parameters for a debug bundle generated by the daemon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct BundleRequest {
    /// Whether the daemon should anonymise identifying data in the archive.
    pub anonymize: bool,
    /// Status report text embedded into the archive.
    pub status: String,
    /// Whether to include host system information.
    pub system_info: bool,
    /// Number of rotated log files to include.
    pub log_file_count: u32,
    /// Service URL used to obtain an upload target; absent when no upload
    /// was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_url: Option<String>,
}

/// Outcome of a bundle generation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct BundleResult {
    /// Path of the archive on the daemon host.
    pub path: String,
    /// Key under which the upload service stored the archive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_key: Option<String>,
    /// Reason the upload did not succeed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_failure_reason: Option<String>,
}

impl BundleResult {
    /// Returns the upload failure reason when it carries any text.
    #[must_use]
    pub fn upload_failure(&self) -> Option<&str> {
        self.upload_failure_reason
            .as_deref()
            .filter(|reason| !reason.is_empty())
    }
}
