//! Error types for mailcanon.
//!
//! Almost everything in the normalization pipeline is a soft failure:
//! malformed addresses, unparseable dates, a missing sanitizer, and fetch
//! failures all degrade to best-effort canonical values plus a tracing
//! warning. The enums here cover the few places that do return `Err` —
//! the injected I/O capabilities and explicit attachment decode.

/// Top-level error type for the crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Raw message parse error: {0}")]
    RawParse(#[from] RawParseError),

    #[error("Attachment error: {0}")]
    Attachment(#[from] AttachmentError),

    #[error("Sanitize error: {0}")]
    Sanitize(#[from] SanitizeError),
}

/// Errors from the injected fetch capabilities (raw messages, attachment
/// content). The reconciler treats these as soft failures; the lazy
/// attachment path surfaces them to the caller for an error notification.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Network request failed for message {message_id}: {reason}")]
    Network { message_id: String, reason: String },

    #[error("Message {message_id} not found at source")]
    NotFound { message_id: String },

    #[error("Fetch timed out for message {message_id}")]
    Timeout { message_id: String },

    #[error("Authentication rejected by source: {reason}")]
    AuthRejected { reason: String },
}

/// Errors from the injected raw-message (RFC-822) parse capability.
#[derive(Debug, thiserror::Error)]
pub enum RawParseError {
    #[error("Malformed raw message: {0}")]
    Malformed(String),

    #[error("Raw message payload was empty")]
    Empty,

    #[error("Invalid base64 in raw message payload: {0}")]
    InvalidBase64(String),
}

/// Attachment content errors.
///
/// `InvalidBase64` is the one hard failure class in the pipeline: decoding
/// content the user explicitly asked to preview or download must fail
/// loudly rather than hand corrupted bytes to a viewer.
#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    #[error("Invalid base64 content in attachment {filename}: {reason}")]
    InvalidBase64 { filename: String, reason: String },

    #[error("Failed to fetch content for attachment {attachment_id} of message {message_id}: {reason}")]
    FetchFailed {
        message_id: String,
        attachment_id: String,
        reason: String,
    },

    #[error("Attachment has no content and no (message_id, attachment_id) fetch key")]
    MissingFetchKey,
}

/// Errors from the injected HTML sanitizer. The transformer downgrades
/// these to warnings — a broken sanitizer never blocks rendering.
#[derive(Debug, thiserror::Error)]
pub enum SanitizeError {
    #[error("Sanitizer rejected input: {0}")]
    Rejected(String),

    #[error("Sanitizer internal failure: {0}")]
    Internal(String),
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
