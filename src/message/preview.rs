//! Preview-text generation for message lists and notifications.

use crate::content::signature::strip_quoted_text;
use crate::message::model::CanonicalMessage;

/// Default preview length.
pub const DEFAULT_PREVIEW_LEN: usize = 80;

/// Fallback when a message has no previewable content.
const EMPTY_PREVIEW: &str = "No content available";

/// First line of the best available plain-text content, truncated with an
/// ellipsis at `max_length` characters. Quoted reply text is skipped so a
/// reply whose own content is one line previews that line, not the quote.
pub fn generate_preview(message: &CanonicalMessage, max_length: usize) -> String {
    let text = strip_quoted_text(message.best_text());

    let Some(line) = text.lines().map(str::trim).find(|l| !l.is_empty()) else {
        return EMPTY_PREVIEW.to_string();
    };

    let mut chars = line.chars();
    let head: String = chars.by_ref().take(max_length).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::model::{Address, MessageSource};

    fn message_with_text(text: &str) -> CanonicalMessage {
        let mut msg = CanonicalMessage {
            id: "m1".into(),
            message_id: "m1".into(),
            thread_id: None,
            from: Address::new("a@ex.com"),
            to: vec![],
            cc: vec![],
            bcc: vec![],
            subject: String::new(),
            body_html: String::new(),
            body_text: text.into(),
            body: String::new(),
            html: String::new(),
            text: String::new(),
            date: "2026-01-01T00:00:00Z".into(),
            timestamp: 0,
            attachments: vec![],
            read: false,
            has_attachments: false,
            source: MessageSource::Local,
        };
        msg.resync("(no content)");
        msg
    }

    #[test]
    fn truncates_long_first_line_with_ellipsis() {
        let long = "x".repeat(200);
        let preview = generate_preview(&message_with_text(&long), 80);
        assert_eq!(preview.len(), 83);
        assert_eq!(&preview[..80], &long[..80]);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn short_line_not_truncated() {
        let preview = generate_preview(&message_with_text("hello there"), 80);
        assert_eq!(preview, "hello there");
    }

    #[test]
    fn exactly_max_length_not_truncated() {
        let exact = "y".repeat(80);
        let preview = generate_preview(&message_with_text(&exact), 80);
        assert_eq!(preview, exact);
    }

    #[test]
    fn takes_first_non_empty_line() {
        let preview = generate_preview(&message_with_text("\n\n  \nactual content\nmore"), 80);
        assert_eq!(preview, "actual content");
    }

    #[test]
    fn skips_quoted_reply_text() {
        let preview = generate_preview(
            &message_with_text("> old quoted stuff\nmy actual reply"),
            80,
        );
        assert_eq!(preview, "my actual reply");
    }

    #[test]
    fn empty_message_uses_fallback() {
        let preview = generate_preview(&message_with_text(""), 80);
        assert_eq!(preview, "No content available");
    }

    #[test]
    fn multibyte_content_truncates_on_char_boundary() {
        let long = "ü".repeat(100);
        let preview = generate_preview(&message_with_text(&long), 80);
        assert_eq!(preview.chars().count(), 83);
        assert!(preview.ends_with("..."));
    }
}
