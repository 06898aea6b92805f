//! Canonical message model — the single representation every source maps
//! into.

use serde::{Deserialize, Serialize};

use crate::error::AttachmentError;

/// Where a message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageSource {
    CloudApi,
    MailboxProtocol,
    Local,
    Import,
}

impl MessageSource {
    pub fn label(&self) -> &'static str {
        match self {
            Self::CloudApi => "cloud-api",
            Self::MailboxProtocol => "mailbox-protocol",
            Self::Local => "local",
            Self::Import => "import",
        }
    }
}

/// A mail participant. `email` is always present; `name` when the source
/// provided one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Address {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
        }
    }

    pub fn named(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: Some(name.into()),
        }
    }

    /// Display form: `Name <email>` when a name is present.
    pub fn display(&self) -> String {
        match &self.name {
            Some(name) if !name.is_empty() => format!("{name} <{}>", self.email),
            _ => self.email.clone(),
        }
    }
}

/// One attachment, content possibly absent.
///
/// Metadata fields are always present (defaulted when the source omitted
/// them). `content` is base64 and may be populated later in place by the
/// reconciler or the lazy-fetch path. When `content` is absent,
/// `(message_id, attachment_id)` forms the lazy-fetch key; standardization
/// enforces that an `attachment_id` never travels without its owner's
/// `message_id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub filename: String,
    pub content_type: String,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default)]
    pub is_inline: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_id: Option<String>,
}

impl AttachmentRef {
    /// Decode the base64 content.
    ///
    /// This is the one hard-failure path in the crate: content explicitly
    /// requested for preview/download must not be handed over corrupted.
    /// Returns `MissingFetchKey` when there is no content at all.
    pub fn decode(&self) -> Result<Vec<u8>, AttachmentError> {
        use base64::Engine;

        let Some(content) = &self.content else {
            return Err(AttachmentError::MissingFetchKey);
        };
        base64::engine::general_purpose::STANDARD
            .decode(content.trim())
            .map_err(|e| AttachmentError::InvalidBase64 {
                filename: self.filename.clone(),
                reason: e.to_string(),
            })
    }
}

/// The canonical message — the unit of truth for rendering, search, and
/// threading.
///
/// Invariants, re-established by [`resync`](Self::resync) after every
/// mutation:
/// - `id` and `message_id` are never both empty;
/// - `body` is never empty (a placeholder stands in for missing content);
/// - `html`/`text` mirror `body_html`/`body_text`;
/// - `has_attachments == !attachments.is_empty()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalMessage {
    pub id: String,
    pub message_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,

    pub from: Address,
    #[serde(default)]
    pub to: Vec<Address>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<Address>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bcc: Vec<Address>,

    pub subject: String,

    pub body_html: String,
    pub body_text: String,
    /// The field the UI renders: HTML if non-blank, else text, else the
    /// placeholder.
    pub body: String,
    /// Mirror of `body_html`, kept for renderer compatibility.
    pub html: String,
    /// Mirror of `body_text`, kept for renderer compatibility.
    pub text: String,

    /// RFC 3339 date, always consistent with `timestamp`.
    pub date: String,
    /// Epoch milliseconds, always consistent with `date`.
    pub timestamp: i64,

    #[serde(default)]
    pub attachments: Vec<AttachmentRef>,

    #[serde(default)]
    pub read: bool,
    /// Derived, never authoritative: equals `attachments.len() > 0`.
    pub has_attachments: bool,

    pub source: MessageSource,
}

impl CanonicalMessage {
    /// Re-establish derived invariants after a mutation: body resolution
    /// priority, mirror fields, and the attachment flag.
    pub fn resync(&mut self, placeholder: &str) {
        self.body = if !self.body_html.trim().is_empty() {
            self.body_html.clone()
        } else if !self.body_text.trim().is_empty() {
            self.body_text.clone()
        } else {
            placeholder.to_string()
        };
        self.html = self.body_html.clone();
        self.text = self.body_text.clone();
        self.has_attachments = !self.attachments.is_empty();
    }

    /// Best available plain-text content: the text body, else nothing.
    /// (Standardization synthesizes a text mirror whenever HTML exists, so
    /// a message with renderable content always has text here.)
    pub fn best_text(&self) -> &str {
        &self.body_text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_message() -> CanonicalMessage {
        CanonicalMessage {
            id: "a1".into(),
            message_id: "m1".into(),
            thread_id: None,
            from: Address::new("alice@example.com"),
            to: vec![],
            cc: vec![],
            bcc: vec![],
            subject: String::new(),
            body_html: String::new(),
            body_text: String::new(),
            body: String::new(),
            html: String::new(),
            text: String::new(),
            date: "2026-01-01T00:00:00Z".into(),
            timestamp: 1_767_225_600_000,
            attachments: vec![],
            read: false,
            has_attachments: false,
            source: MessageSource::Local,
        }
    }

    // ── resync invariants ───────────────────────────────────────────

    #[test]
    fn resync_prefers_html() {
        let mut msg = blank_message();
        msg.body_html = "<p>hi</p>".into();
        msg.body_text = "hi".into();
        msg.resync("(no content)");
        assert_eq!(msg.body, "<p>hi</p>");
        assert_eq!(msg.html, "<p>hi</p>");
        assert_eq!(msg.text, "hi");
    }

    #[test]
    fn resync_falls_back_to_text() {
        let mut msg = blank_message();
        msg.body_text = "plain".into();
        msg.resync("(no content)");
        assert_eq!(msg.body, "plain");
    }

    #[test]
    fn resync_uses_placeholder_when_empty() {
        let mut msg = blank_message();
        msg.resync("(no content)");
        assert_eq!(msg.body, "(no content)");
        assert!(!msg.body.is_empty());
    }

    #[test]
    fn resync_recomputes_attachment_flag() {
        let mut msg = blank_message();
        msg.has_attachments = true; // lying source
        msg.resync("(no content)");
        assert!(!msg.has_attachments);

        msg.attachments.push(AttachmentRef {
            filename: "a.pdf".into(),
            content_type: "application/pdf".into(),
            size: 10,
            ..AttachmentRef::default()
        });
        msg.resync("(no content)");
        assert!(msg.has_attachments);
    }

    // ── Address ─────────────────────────────────────────────────────

    #[test]
    fn address_display_forms() {
        assert_eq!(Address::new("a@b.com").display(), "a@b.com");
        assert_eq!(
            Address::named("a@b.com", "Alice").display(),
            "Alice <a@b.com>"
        );
    }

    // ── Attachment decode ───────────────────────────────────────────

    #[test]
    fn decode_valid_base64() {
        let att = AttachmentRef {
            filename: "hello.txt".into(),
            content_type: "text/plain".into(),
            size: 5,
            content: Some("aGVsbG8=".into()),
            ..AttachmentRef::default()
        };
        assert_eq!(att.decode().unwrap(), b"hello");
    }

    #[test]
    fn decode_invalid_base64_is_hard_error() {
        let att = AttachmentRef {
            filename: "bad.bin".into(),
            content_type: "application/octet-stream".into(),
            size: 5,
            content: Some("!!not-base64!!".into()),
            ..AttachmentRef::default()
        };
        assert!(matches!(
            att.decode(),
            Err(AttachmentError::InvalidBase64 { .. })
        ));
    }

    #[test]
    fn decode_without_content_reports_missing_key() {
        let att = AttachmentRef::default();
        assert!(matches!(att.decode(), Err(AttachmentError::MissingFetchKey)));
    }

    #[test]
    fn source_labels() {
        assert_eq!(MessageSource::CloudApi.label(), "cloud-api");
        assert_eq!(MessageSource::MailboxProtocol.label(), "mailbox-protocol");
    }

    #[test]
    fn message_serde_round_trip() {
        let mut msg = blank_message();
        msg.body_text = "hello".into();
        msg.resync("(no content)");
        let json = serde_json::to_string(&msg).unwrap();
        let parsed: CanonicalMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.body, "hello");
        assert_eq!(parsed.source, MessageSource::Local);
    }
}
