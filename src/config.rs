//! Configuration types.

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Placeholder body used when a message has no content at all.
    /// Canonical messages never carry an empty `body`.
    pub placeholder_body: String,
    /// Maximum preview length before ellipsis truncation.
    pub preview_max_len: usize,
    /// Whether cloud-API messages with zero attachments go through the
    /// fetch-and-reparse reconciliation fallback.
    pub reconcile_cloud_api: bool,
    /// Sanitizer mode used for the standard (aggressive) HTML branch.
    pub sanitize_mode: crate::capability::SanitizeMode,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            placeholder_body: "(no content)".to_string(),
            preview_max_len: 80,
            reconcile_cloud_api: true,
            sanitize_mode: crate::capability::SanitizeMode::Email,
        }
    }
}
