//! Injected I/O capability traits — the core never talks to the network.
//!
//! The pipeline is handed raw data plus a set of fetch/parse/sanitize
//! capabilities and performs pure transformation between them. Transport
//! (IMAP/SMTP wire, OAuth, HTTP retry policy) lives entirely behind these
//! traits; credentials are captured by the implementations rather than
//! threaded through as parameters.

use async_trait::async_trait;

use crate::error::{FetchError, RawParseError, SanitizeError};
use crate::message::standardize::ParsedRfc822Record;

// ── Raw message fetch ───────────────────────────────────────────────

/// Raw message bytes as returned by a source.
///
/// Sources differ in framing: the cloud API hands back base64, the mailbox
/// protocol hands back bytes. Both decode to the same RFC-822 payload.
#[derive(Debug, Clone)]
pub enum RawEmail {
    /// Raw RFC-822 bytes.
    Bytes(Vec<u8>),
    /// Base64-encoded RFC-822 payload (url-safe or standard alphabet).
    Base64(String),
}

/// Fetches the full raw message for a message id.
///
/// Used only by the attachment reconciler's fetch-and-reparse fallback.
/// Timeouts are the implementation's responsibility; the reconciler treats
/// any error as a soft failure.
#[async_trait]
pub trait RawMessageFetcher: Send + Sync {
    async fn fetch_raw(&self, message_id: &str) -> Result<RawEmail, FetchError>;
}

// ── Raw message parse ───────────────────────────────────────────────

/// Parses raw RFC-822 bytes into a structured record.
///
/// Synchronous — parsing is CPU-bound. A bundled `mail-parser` backed
/// implementation lives in [`crate::rfc822::Rfc822Parser`].
pub trait RawMessageParser: Send + Sync {
    fn parse(&self, raw: &[u8]) -> Result<ParsedRfc822Record, RawParseError>;
}

// ── Attachment content fetch ────────────────────────────────────────

/// Fetches attachment content (base64) on demand, keyed by
/// `(message_id, attachment_id)`.
#[async_trait]
pub trait AttachmentFetcher: Send + Sync {
    async fn fetch_content(
        &self,
        message_id: &str,
        attachment_id: &str,
    ) -> Result<String, FetchError>;
}

// ── HTML sanitization ───────────────────────────────────────────────

/// Sanitization strictness, passed through to the injected sanitizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanitizeMode {
    /// Email rendering: keeps layout markup, drops active content.
    Email,
    /// UI snippets: inline markup only.
    Ui,
    /// Strict: text-level markup only.
    Strict,
}

impl SanitizeMode {
    /// Mode name for step/warning records.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Ui => "ui",
            Self::Strict => "strict",
        }
    }
}

/// Generic HTML sanitization capability.
///
/// Passed around as `Option<&dyn HtmlSanitizer>`: absence is tolerated and
/// downgrades to a developer-facing warning, never a user-visible failure.
pub trait HtmlSanitizer: Send + Sync {
    fn sanitize(&self, html: &str, mode: SanitizeMode) -> Result<String, SanitizeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_mode_labels() {
        assert_eq!(SanitizeMode::Email.label(), "email");
        assert_eq!(SanitizeMode::Ui.label(), "ui");
        assert_eq!(SanitizeMode::Strict.label(), "strict");
    }
}
