//! Conversation grouping — folds messages into threads.

use std::collections::HashMap;

use serde::Serialize;

use crate::message::model::CanonicalMessage;

/// A thread of messages sharing one thread key.
#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    pub id: String,
    pub subject: String,
    /// Sender addresses in first-seen order, deduplicated.
    pub participants: Vec<String>,
    pub emails: Vec<CanonicalMessage>,
    pub unread_count: usize,
    pub has_attachments: bool,
}

impl Conversation {
    fn new(id: String, first: &CanonicalMessage) -> Self {
        Self {
            id,
            subject: first.subject.clone(),
            participants: Vec::new(),
            emails: Vec::new(),
            unread_count: 0,
            has_attachments: false,
        }
    }

    fn push(&mut self, message: CanonicalMessage) {
        let sender = &message.from.email;
        if !sender.is_empty() && !self.participants.contains(sender) {
            self.participants.push(sender.clone());
        }
        if !message.read {
            self.unread_count += 1;
        }
        // Monotonic: once any member has attachments the flag stays set.
        self.has_attachments = self.has_attachments || message.has_attachments;
        self.emails.push(message);
    }
}

/// Thread key for one message: explicit thread id, else its own message id.
pub fn thread_key(message: &CanonicalMessage) -> &str {
    match &message.thread_id {
        Some(tid) if !tid.is_empty() => tid,
        _ => &message.message_id,
    }
}

/// Group messages into conversations keyed by thread.
///
/// Input order is preserved within each conversation. The subject is the
/// first member's subject.
pub fn group(messages: Vec<CanonicalMessage>) -> HashMap<String, Conversation> {
    let mut conversations: HashMap<String, Conversation> = HashMap::new();
    for message in messages {
        let key = thread_key(&message).to_string();
        conversations
            .entry(key.clone())
            .or_insert_with(|| Conversation::new(key, &message))
            .push(message);
    }
    conversations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::model::{Address, AttachmentRef, MessageSource};

    fn msg(id: &str, thread: Option<&str>, from: &str, read: bool) -> CanonicalMessage {
        let mut m = CanonicalMessage {
            id: id.to_string(),
            message_id: id.to_string(),
            thread_id: thread.map(|s| s.to_string()),
            from: Address::new(from),
            to: Vec::new(),
            cc: Vec::new(),
            bcc: Vec::new(),
            subject: format!("Subject {id}"),
            body_html: String::new(),
            body_text: "hello".into(),
            body: String::new(),
            html: String::new(),
            text: String::new(),
            date: String::new(),
            timestamp: 0,
            attachments: Vec::new(),
            read,
            has_attachments: false,
            source: MessageSource::CloudApi,
        };
        m.resync("(no content)");
        m
    }

    #[test]
    fn groups_by_thread_id() {
        let grouped = group(vec![
            msg("m1", Some("t1"), "a@x.com", true),
            msg("m2", Some("t1"), "b@x.com", true),
            msg("m3", Some("t2"), "a@x.com", true),
        ]);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped["t1"].emails.len(), 2);
        assert_eq!(grouped["t2"].emails.len(), 1);
    }

    #[test]
    fn message_id_is_the_fallback_key() {
        let grouped = group(vec![
            msg("m1", None, "a@x.com", true),
            msg("m2", None, "a@x.com", true),
        ]);
        assert_eq!(grouped.len(), 2);
        assert!(grouped.contains_key("m1"));
        assert!(grouped.contains_key("m2"));
    }

    #[test]
    fn empty_thread_id_falls_back_to_message_id() {
        let mut m = msg("m1", None, "a@x.com", true);
        m.thread_id = Some(String::new());
        let grouped = group(vec![m]);
        assert!(grouped.contains_key("m1"));
    }

    #[test]
    fn participants_are_unique_in_first_seen_order() {
        let grouped = group(vec![
            msg("m1", Some("t1"), "a@x.com", true),
            msg("m2", Some("t1"), "b@x.com", true),
            msg("m3", Some("t1"), "a@x.com", true),
        ]);
        assert_eq!(grouped["t1"].participants, vec!["a@x.com", "b@x.com"]);
    }

    #[test]
    fn unread_count_tracks_unread_members() {
        let grouped = group(vec![
            msg("m1", Some("t1"), "a@x.com", false),
            msg("m2", Some("t1"), "b@x.com", true),
            msg("m3", Some("t1"), "c@x.com", false),
        ]);
        assert_eq!(grouped["t1"].unread_count, 2);
    }

    #[test]
    fn has_attachments_is_monotonic() {
        let mut with_att = msg("m2", Some("t1"), "b@x.com", true);
        with_att.attachments.push(AttachmentRef {
            filename: "f.pdf".into(),
            ..AttachmentRef::default()
        });
        with_att.resync("(no content)");

        let grouped = group(vec![
            msg("m1", Some("t1"), "a@x.com", true),
            with_att,
            // A later attachment-free message must not clear the flag.
            msg("m3", Some("t1"), "c@x.com", true),
        ]);
        assert!(grouped["t1"].has_attachments);
    }

    #[test]
    fn subject_comes_from_first_member() {
        let grouped = group(vec![
            msg("m1", Some("t1"), "a@x.com", true),
            msg("m2", Some("t1"), "b@x.com", true),
        ]);
        assert_eq!(grouped["t1"].subject, "Subject m1");
    }

    #[test]
    fn message_order_is_preserved() {
        let grouped = group(vec![
            msg("m1", Some("t1"), "a@x.com", true),
            msg("m2", Some("t1"), "b@x.com", true),
            msg("m3", Some("t1"), "c@x.com", true),
        ]);
        let ids: Vec<&str> = grouped["t1"].emails.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2", "m3"]);
    }
}
